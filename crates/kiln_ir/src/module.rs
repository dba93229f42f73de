//! Completed modules — the frozen result of elaborating one module body.
//!
//! A [`CompletedModule`] is immutable once built and shared behind an `Arc`
//! by every instance of the definition it belongs to.

use crate::arena::Arena;
use crate::expr::Expr;
use crate::ids::{InstanceId, ModuleId, PortId, SignalId};
use crate::instance::ChildInstance;
use crate::port::{Port, PortDirection};
use crate::signal::{Signal, SignalRef};
use crate::types::Type;
use kiln_common::{ContentHash, Ident, SourceLoc};
use serde::{Deserialize, Serialize};

/// One entry of a module's connection log.
///
/// The log is append-only: connecting the same destination several times
/// keeps every entry, in order. Only a simulator reading the log treats the
/// last one as live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Position in the module's connection log.
    pub position: u32,
    /// The driven port, signal or instance port.
    pub dest: SignalRef,
    /// The driving expression.
    pub source: Expr,
    /// Where the connection was made.
    pub loc: SourceLoc,
}

/// Clocking of a completed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleClocking {
    /// No implicit clock or reset.
    Bare,
    /// The module declared its own clock and reset ports.
    Implicit {
        /// The implicit clock port.
        clock: PortId,
        /// The implicit reset port.
        reset: PortId,
    },
}

/// A fully elaborated module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedModule {
    /// The module's position in its circuit.
    pub id: ModuleId,
    /// The circuit-unique module name.
    pub name: Ident,
    /// The name the generator asked for, before uniquification.
    pub desired_name: Ident,
    /// Hash of the definition key this module was cached under.
    pub key: ContentHash,
    /// Implicit clock/reset declaration.
    pub clocking: ModuleClocking,
    /// Ports in declaration order.
    pub ports: Vec<Port>,
    /// Wires and registers in declaration order.
    pub signals: Arena<SignalId, Signal>,
    /// Child instances in instantiation order.
    pub instances: Arena<InstanceId, ChildInstance>,
    /// The connection log in connection order.
    pub connections: Vec<Connection>,
    /// Where the module was entered.
    pub loc: SourceLoc,
}

impl CompletedModule {
    /// Looks up a port by name.
    pub fn port_by_name(&self, name: Ident) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Looks up a child instance by name.
    pub fn instance_by_name(&self, name: Ident) -> Option<&ChildInstance> {
        self.instances.values().find(|i| i.name == name)
    }

    /// Returns `true` if the module declares an implicit clock and reset.
    pub fn is_implicit_clock(&self) -> bool {
        matches!(self.clocking, ModuleClocking::Implicit { .. })
    }

    /// Iterates over the log entries driving `dest`, in connection order.
    pub fn connections_to(&self, dest: SignalRef) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.dest == dest)
    }

    /// Returns the ports with the given direction, in declaration order.
    pub fn ports_with_direction(&self, direction: PortDirection) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(move |p| p.direction == direction)
    }

    /// Returns the type of a reference local to this module, when the
    /// reference does not go through a child instance.
    pub fn local_type(&self, target: SignalRef) -> Option<Type> {
        match target {
            SignalRef::Port(id) => self.ports.get(id.index()).map(|p| p.ty),
            SignalRef::Signal(id) => self.signals.get(id).map(|s| s.ty),
            SignalRef::InstancePort { .. } => None,
        }
    }
}
