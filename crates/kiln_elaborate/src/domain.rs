//! Clock-domain tags and the implicit-clock validator.

use kiln_ir::{ModuleClocking, SignalRef};

use crate::errors::{ElabError, ElabResult};

/// The implicit clock and reset in effect inside a module under
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDomain {
    /// No implicit clock or reset; implicit-clock children and registers are
    /// rejected.
    Bare,
    /// Established by [`with_clock_and_reset`](crate::ElabContext::with_clock_and_reset)
    /// for the extent of its body.
    Explicit {
        /// The clock in scope.
        clock: SignalRef,
        /// The reset in scope.
        reset: SignalRef,
    },
    /// The module's own implicit clock and reset ports.
    Implicit {
        /// The module's clock port.
        clock: SignalRef,
        /// The module's reset port.
        reset: SignalRef,
    },
}

impl ClockDomain {
    /// The initial domain of a module with the given clocking.
    pub fn for_module(clocking: ModuleClocking) -> Self {
        match clocking {
            ModuleClocking::Bare => ClockDomain::Bare,
            ModuleClocking::Implicit { clock, reset } => ClockDomain::Implicit {
                clock: SignalRef::Port(clock),
                reset: SignalRef::Port(reset),
            },
        }
    }

    /// Returns `true` for [`ClockDomain::Bare`].
    pub fn is_bare(&self) -> bool {
        matches!(self, ClockDomain::Bare)
    }

    /// The clock and reset in scope, if any.
    pub fn signals(&self) -> Option<(SignalRef, SignalRef)> {
        match *self {
            ClockDomain::Bare => None,
            ClockDomain::Explicit { clock, reset } | ClockDomain::Implicit { clock, reset } => {
                Some((clock, reset))
            }
        }
    }

    /// Returns the clock and reset in scope, or an implicit-clock error
    /// naming `what` and the enclosing `module`.
    pub fn require(&self, what: impl FnOnce() -> String, module: &str) -> ElabResult<(SignalRef, SignalRef)> {
        self.signals().ok_or_else(|| ElabError::ImplicitClock {
            what: what(),
            module: module.to_string(),
        })
    }
}
