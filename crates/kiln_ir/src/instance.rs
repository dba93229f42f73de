//! Child-instance entries of a module.

use crate::ids::{InstanceId, ModuleId};
use crate::signal::SignalRef;
use kiln_common::{Ident, SourceLoc};
use serde::{Deserialize, Serialize};

/// How an instance receives its implicit clock and reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceDomain {
    /// The instantiated module is bare; nothing was propagated.
    None,
    /// The parent's domain signals drive the child's implicit ports.
    Inherited {
        /// Parent-side clock.
        clock: SignalRef,
        /// Parent-side reset.
        reset: SignalRef,
    },
}

/// One instantiation of a definition inside a parent module.
///
/// Many entries (in many parents) may reference the same `module`; none of
/// them own it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildInstance {
    /// Position of this instance within its parent.
    pub id: InstanceId,
    /// The instance name.
    pub name: Ident,
    /// The instantiated definition.
    pub module: ModuleId,
    /// Clock/reset propagation for this instance.
    pub domain: InstanceDomain,
    /// Where the instantiation happened.
    pub loc: SourceLoc,
}
