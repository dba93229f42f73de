//! Per-module lifecycle state machine.
//!
//! `Declaring -> BodyRunning -> ClosingHooks -> Closed`, strictly forward.

use std::fmt;

/// The phase a module under construction is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Entered; nothing but engine-declared ports exists yet.
    Declaring,
    /// The construction body is adding ports, signals, instances and
    /// connections.
    BodyRunning,
    /// Body-end hooks are being drained. Hooks may still add contents.
    ClosingHooks,
    /// Frozen; nothing may be added.
    Closed,
}

/// A transition that the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    /// The state the module was in.
    pub from: LifecycleState,
    /// The state that was requested.
    pub to: LifecycleState,
}

impl LifecycleState {
    /// Returns `true` if ports, signals, instances and connections may still
    /// be added.
    pub fn accepts_contents(self) -> bool {
        self != LifecycleState::Closed
    }

    /// Records a content operation. Moves `Declaring` to `BodyRunning`;
    /// idempotent in `BodyRunning` and `ClosingHooks`.
    pub fn begin_body(&mut self) -> Result<(), InvalidTransition> {
        match self {
            LifecycleState::Declaring => {
                *self = LifecycleState::BodyRunning;
                Ok(())
            }
            LifecycleState::BodyRunning | LifecycleState::ClosingHooks => Ok(()),
            LifecycleState::Closed => Err(InvalidTransition {
                from: *self,
                to: LifecycleState::BodyRunning,
            }),
        }
    }

    /// Handles a close request. A module closed straight from `Declaring`
    /// passes through `BodyRunning` first.
    pub fn begin_close(&mut self) -> Result<(), InvalidTransition> {
        match self {
            LifecycleState::Declaring | LifecycleState::BodyRunning => {
                *self = LifecycleState::ClosingHooks;
                Ok(())
            }
            LifecycleState::ClosingHooks | LifecycleState::Closed => Err(InvalidTransition {
                from: *self,
                to: LifecycleState::ClosingHooks,
            }),
        }
    }

    /// Marks the hook drain as complete.
    pub fn finish_close(&mut self) -> Result<(), InvalidTransition> {
        match self {
            LifecycleState::ClosingHooks => {
                *self = LifecycleState::Closed;
                Ok(())
            }
            _ => Err(InvalidTransition {
                from: *self,
                to: LifecycleState::Closed,
            }),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Declaring => write!(f, "declaring"),
            LifecycleState::BodyRunning => write!(f, "running its body"),
            LifecycleState::ClosingHooks => write!(f, "running body-end hooks"),
            LifecycleState::Closed => write!(f, "closed"),
        }
    }
}
