//! Internal signals (wires and registers) and references to drivable or
//! readable things inside a module.

use crate::expr::Expr;
use crate::ids::{InstanceId, PortId, SignalId};
use crate::types::Type;
use kiln_common::{Ident, SourceLoc};
use serde::{Deserialize, Serialize};

/// A reference to something inside one module, resolved relative to that
/// module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalRef {
    /// One of the module's own ports.
    Port(PortId),
    /// A wire or register of the module.
    Signal(SignalId),
    /// A port of one of the module's child instances.
    InstancePort {
        /// The child instance.
        instance: InstanceId,
        /// The port on the instance's definition.
        port: PortId,
    },
}

/// Reset binding of a register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegReset {
    /// The reset signal in effect when the register was declared.
    pub signal: SignalRef,
    /// The value loaded while reset is asserted.
    pub init: Expr,
}

/// Storage kind of an internal signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Combinational net.
    Wire,
    /// Clocked register bound to the clock domain in effect at declaration.
    Reg {
        /// The clock driving the register.
        clock: SignalRef,
        /// Optional reset and initial value.
        reset: Option<RegReset>,
    },
}

/// A wire or register within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// The declaration position of this signal.
    pub id: SignalId,
    /// The signal name.
    pub name: Ident,
    /// The type of this signal.
    pub ty: Type,
    /// Wire or register.
    pub kind: SignalKind,
    /// Where the signal was declared.
    pub loc: SourceLoc,
}

impl Signal {
    /// Returns `true` if this signal is a register.
    pub fn is_reg(&self) -> bool {
        matches!(self.kind, SignalKind::Reg { .. })
    }
}
