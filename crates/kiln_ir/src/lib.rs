//! KilnIR — the flattened, deterministic circuit representation produced by
//! elaboration.
//!
//! A [`CompletedCircuit`] is an ordered set of immutable [`CompletedModule`]s.
//! Each module keeps its ports, internal signals, child instances and
//! connection log in declaration order, which is the contract every
//! downstream consumer (printers, simulators, code generators) relies on.

#![warn(missing_docs)]

pub mod arena;
pub mod circuit;
pub mod expr;
pub mod hierarchy;
pub mod ids;
pub mod instance;
pub mod module;
pub mod port;
pub mod printer;
pub mod signal;
pub mod types;

pub use arena::{Arena, ArenaId};
pub use circuit::CompletedCircuit;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use hierarchy::InstanceGraph;
pub use ids::{InstanceId, ModuleId, PortId, SignalId};
pub use instance::{ChildInstance, InstanceDomain};
pub use module::{CompletedModule, Connection, ModuleClocking};
pub use port::{Port, PortDirection};
pub use signal::{RegReset, Signal, SignalKind, SignalRef};
pub use types::Type;
