//! Conformance test helpers for the Kiln elaboration engine.
//!
//! Provides shared functions that run a generator through a full elaboration
//! and return structured results, plus assertions on the printed IR, for use
//! in the integration tests under `tests/`.

#![warn(missing_docs)]

use kiln_config::{load_config_from_str, KilnConfig};
use kiln_diagnostics::{Diagnostic, DiagnosticRenderer, TerminalRenderer};
use kiln_elaborate::{elaborate, ElabContext, ElabFailure, ElabResult, ModuleSpec};
use kiln_ir::printer::print_module;
use kiln_ir::{CompletedCircuit, CompletedModule, Expr, SignalRef};

/// Result of a successful elaboration run.
pub struct BuildResult {
    /// The completed circuit.
    pub circuit: CompletedCircuit,
    /// Warnings emitted during elaboration.
    pub warnings: Vec<Diagnostic>,
}

impl BuildResult {
    /// Looks up a module by its unique name, panicking if it is missing.
    pub fn module(&self, name: &str) -> &CompletedModule {
        self.circuit
            .find_module(name)
            .unwrap_or_else(|| panic!("no module named `{name}` in the circuit"))
    }

    /// Port names of the named module, in declaration order.
    pub fn port_names(&self, module: &str) -> Vec<&str> {
        self.circuit.port_names(self.module(module))
    }

    /// The printed form of the named module.
    pub fn printed(&self, module: &str) -> String {
        print_module(&self.circuit, self.module(module))
    }

    /// Codes of the emitted warnings, rendered as strings (`"W300"`).
    pub fn warning_codes(&self) -> Vec<String> {
        self.warnings.iter().map(|d| d.code.to_string()).collect()
    }
}

/// Parses a `kiln.toml` document, panicking on invalid input.
pub fn make_config(toml: &str) -> KilnConfig {
    load_config_from_str(toml).unwrap_or_else(|e| panic!("invalid test config: {e}"))
}

/// Elaborates with the default configuration, panicking with the rendered
/// failure if elaboration fails.
#[track_caller]
pub fn build(top: ModuleSpec, body: impl FnOnce(&mut ElabContext) -> ElabResult<()>) -> BuildResult {
    build_with_config(&KilnConfig::default(), top, body)
}

/// Elaborates with `config`, panicking with the rendered failure if
/// elaboration fails.
#[track_caller]
pub fn build_with_config(
    config: &KilnConfig,
    top: ModuleSpec,
    body: impl FnOnce(&mut ElabContext) -> ElabResult<()>,
) -> BuildResult {
    match elaborate(config, top, body) {
        Ok(out) => BuildResult {
            circuit: out.circuit,
            warnings: out.warnings,
        },
        Err(failure) => panic!("elaboration failed:\n{}", render_failure(&failure)),
    }
}

/// Elaborates with the default configuration and returns the failure,
/// panicking if elaboration succeeds.
#[track_caller]
pub fn build_err(top: ModuleSpec, body: impl FnOnce(&mut ElabContext) -> ElabResult<()>) -> ElabFailure {
    match elaborate(&KilnConfig::default(), top, body) {
        Ok(_) => panic!("elaboration succeeded but a failure was expected"),
        Err(failure) => failure,
    }
}

/// Renders a failure the way a terminal front end would, without color.
pub fn render_failure(failure: &ElabFailure) -> String {
    TerminalRenderer::new(false).render(&failure.to_diagnostic())
}

/// Asserts that every line in `expected` occurs in `text` (after trimming),
/// in the given relative order.
#[track_caller]
pub fn assert_lines_in_order(text: &str, expected: &[&str]) {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut from = 0;
    for want in expected {
        match lines[from..].iter().position(|l| l == want) {
            Some(offset) => from += offset + 1,
            None => panic!("expected line `{want}` (in order) in:\n{text}"),
        }
    }
}

/// Literal values connected to `dest` in `module`, in connection order.
/// Non-literal sources are skipped.
pub fn literal_drivers(module: &CompletedModule, dest: SignalRef) -> Vec<u128> {
    module
        .connections_to(dest)
        .filter_map(|c| match c.source {
            Expr::Literal { value, .. } => Some(value),
            _ => None,
        })
        .collect()
}
