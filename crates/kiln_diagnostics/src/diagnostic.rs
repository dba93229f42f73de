//! Structured diagnostic messages with severity, codes, and notes.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use kiln_common::SourceLoc;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Each diagnostic has a severity and code, a primary message, the generator
/// source location it refers to, an optional module nesting path, and
/// free-form notes and help lines.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where in the generator code the issue was detected.
    pub loc: SourceLoc,
    /// Module nesting path at the point of detection, outermost first.
    pub path: Vec<String>,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, loc: SourceLoc) -> Self {
        Self::new(Severity::Error, code, message, loc)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, loc: SourceLoc) -> Self {
        Self::new(Severity::Warning, code, message, loc)
    }

    fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        loc: SourceLoc,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            loc,
            path: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Sets the module nesting path.
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Error, 302);
        let diag = Diagnostic::error(code, "no implicit clock", SourceLoc::UNKNOWN);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "no implicit clock");
        assert_eq!(format!("{}", diag.code), "E302");
        assert!(diag.path.is_empty());
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Warning, 300);
        let diag = Diagnostic::warning(code, "driven twice", SourceLoc::UNKNOWN)
            .with_path(vec!["Top".to_string(), "u0".to_string()])
            .with_note("the last connection wins")
            .with_help("remove the earlier connection");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.path.len(), 2);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }
}
