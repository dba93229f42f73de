//! Construction-time elaboration of hierarchical circuits into KilnIR.
//!
//! A generator describes a circuit by calling operations on an
//! [`ElabContext`]: entering modules, declaring ports and signals,
//! instantiating definitions, connecting values. The context tracks the open
//! module stack, each module's lifecycle and clock domain, deferred hooks,
//! and a cache that lets one definition be instantiated many times while its
//! body runs once.
//!
//! # Usage
//!
//! ```ignore
//! let config = KilnConfig::default();
//! let out = elaborate(&config, ModuleSpec::implicit_clock("Top"), |ctx| {
//!     let a = ctx.input("a", Type::uint(8))?;
//!     let y = ctx.output("y", Type::uint(8))?;
//!     ctx.connect(&y, &a)
//! })?;
//! println!("{}", kiln_ir::printer::print_circuit(&out.circuit));
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod definition;
pub mod domain;
pub mod errors;
pub mod hooks;
pub mod lifecycle;
pub mod namespace;
pub mod record;
pub mod value;

pub use context::ElabContext;
pub use definition::{ContextId, Definition, DefinitionCache, DefinitionKey, Instance, KeyParam};
pub use domain::ClockDomain;
pub use errors::{ElabError, ElabFailure, ElabResult};
pub use hooks::{Hook, HookFn, HookOwner};
pub use lifecycle::LifecycleState;
pub use record::{ModuleHandle, ModuleKind, ModuleSpec};
pub use value::{SignalHandle, Value};

use kiln_common::SourceLoc;
use kiln_config::KilnConfig;
use kiln_diagnostics::Diagnostic;
use kiln_ir::CompletedCircuit;

/// A successful elaboration.
#[derive(Debug)]
pub struct Elaboration {
    /// The completed circuit.
    pub circuit: CompletedCircuit,
    /// Warnings emitted along the way.
    pub warnings: Vec<Diagnostic>,
}

/// Elaborates a whole circuit whose top-level module is built by `body`.
///
/// Starts a circuit in a fresh context, builds and closes the top-level
/// module, runs all post-build hooks and returns the completed circuit. Any
/// error abandons the elaboration; the returned [`ElabFailure`] carries the
/// innermost error and the module nesting path where it happened.
#[track_caller]
pub fn elaborate(
    config: &KilnConfig,
    top: ModuleSpec,
    body: impl FnOnce(&mut ElabContext) -> ElabResult<()>,
) -> Result<Elaboration, ElabFailure> {
    let loc = SourceLoc::caller();
    let mut ctx = ElabContext::new(config.clone());
    let result = ctx.begin_circuit().and_then(|()| {
        let key = ctx.next_unique_key(&top.name);
        let handle = ctx.enter_at(top, key, loc.clone())?;
        body(&mut ctx)?;
        ctx.close_at(handle, loc)?;
        ctx.finish_circuit()
    });
    match result {
        Ok(circuit) => Ok(Elaboration {
            circuit,
            warnings: ctx.take_diagnostics(),
        }),
        Err(error) => Err(ctx.into_failure(error)),
    }
}
