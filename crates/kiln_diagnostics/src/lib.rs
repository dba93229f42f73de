//! Diagnostic creation, severity management, and rendering.
//!
//! Fatal elaboration failures are `Result` errors in `kiln_elaborate`; this
//! crate carries the structured [`Diagnostic`] form they render to, plus the
//! non-fatal warnings accumulated in a [`DiagnosticSink`] during elaboration.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
