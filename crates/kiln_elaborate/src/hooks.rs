//! Deferred hooks: body-end hooks owned by one open module, and post-build
//! hooks owned by the circuit.

use std::collections::VecDeque;
use std::fmt;

use kiln_common::SourceLoc;

use crate::context::ElabContext;
use crate::errors::ElabResult;
use crate::record::ModuleHandle;

/// The deferred procedure of a hook.
pub type HookFn = Box<dyn FnOnce(&mut ElabContext) -> ElabResult<()>>;

/// When a hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookOwner {
    /// While the given module closes, before it is frozen.
    BodyEnd(ModuleHandle),
    /// After the whole top-level circuit closed.
    PostBuild,
}

/// A queued unit of deferred work.
pub struct Hook {
    /// When the hook fires.
    pub owner: HookOwner,
    /// The work to run.
    pub action: HookFn,
    /// Where the hook was registered.
    pub loc: SourceLoc,
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("owner", &self.owner)
            .field("loc", &self.loc)
            .finish_non_exhaustive()
    }
}

/// Hooks in registration order.
#[derive(Debug, Default)]
pub struct HookQueue {
    hooks: VecDeque<Hook>,
}

impl HookQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook.
    pub fn push(&mut self, hook: Hook) {
        self.hooks.push_back(hook);
    }

    /// Removes and returns the earliest hook.
    pub fn pop_front(&mut self) -> Option<Hook> {
        self.hooks.pop_front()
    }

    /// Removes and returns the earliest body-end hook owned by `module`,
    /// leaving hooks of other modules in place.
    pub fn take_first_for(&mut self, module: ModuleHandle) -> Option<Hook> {
        let index = self
            .hooks
            .iter()
            .position(|h| h.owner == HookOwner::BodyEnd(module))?;
        self.hooks.remove(index)
    }

    /// Number of queued body-end hooks owned by `module`.
    pub fn pending_for(&self, module: ModuleHandle) -> usize {
        self.hooks
            .iter()
            .filter(|h| h.owner == HookOwner::BodyEnd(module))
            .count()
    }

    /// Number of queued hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hooks are queued.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
