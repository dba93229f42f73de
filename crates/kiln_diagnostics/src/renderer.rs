//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error[E302]: cannot instantiate implicit-clock module `Counter` in `Top`
///   --> src/top.rs:10:5
///   in: Top/core
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in the header line.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let header = format!("{}[{}]", diag.severity, diag.code);
        if self.color {
            let color = if diag.severity.is_error() { "31" } else { "33" };
            out.push_str(&format!("\x1b[1;{color}m{header}\x1b[0m: {}\n", diag.message));
        } else {
            out.push_str(&format!("{header}: {}\n", diag.message));
        }

        if !diag.loc.is_unknown() {
            out.push_str(&format!("  --> {}\n", diag.loc));
        }
        if !diag.path.is_empty() {
            out.push_str(&format!("  in: {}\n", diag.path.join("/")));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        // Diagnostic only holds strings and plain enums, serialization can't fail.
        serde_json::to_string(diag).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use kiln_common::SourceLoc;
    use std::borrow::Cow;

    fn loc() -> SourceLoc {
        SourceLoc {
            file: Cow::Borrowed("src/top.rs"),
            line: 10,
            column: 5,
        }
    }

    #[test]
    fn render_error_with_loc_and_path() {
        let code = DiagnosticCode::new(Category::Error, 302);
        let diag = Diagnostic::error(code, "no implicit clock in scope", loc())
            .with_path(vec!["Top".to_string(), "core".to_string()]);

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("error[E302]: no implicit clock in scope"));
        assert!(output.contains("--> src/top.rs:10:5"));
        assert!(output.contains("in: Top/core"));
    }

    #[test]
    fn render_warning_with_notes() {
        let code = DiagnosticCode::new(Category::Warning, 300);
        let diag = Diagnostic::warning(code, "`out` is driven 2 times", SourceLoc::UNKNOWN)
            .with_note("the last connection wins")
            .with_help("remove the earlier connections");

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("warning[W300]: `out` is driven 2 times"));
        assert!(output.contains("= note: the last connection wins"));
        assert!(output.contains("= help: remove the earlier connections"));
        assert!(!output.contains("-->"));
    }

    #[test]
    fn render_color_header() {
        let code = DiagnosticCode::new(Category::Error, 300);
        let diag = Diagnostic::error(code, "bad nesting", SourceLoc::UNKNOWN);
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;31merror[E300]"));
    }

    #[test]
    fn render_json() {
        let code = DiagnosticCode::new(Category::Error, 303);
        let diag = Diagnostic::error(code, "duplicate port `a`", loc());
        let line = JsonRenderer.render(&diag);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["message"], "duplicate port `a`");
        assert_eq!(value["loc"]["line"], 10);
    }
}
