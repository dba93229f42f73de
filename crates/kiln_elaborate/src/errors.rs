//! Elaboration errors, their diagnostic codes, and warning constructors.
//!
//! Error codes `E300`--`E315` cover fatal elaboration failures. Warning codes
//! `W300`--`W301` cover suspicious but legal connections.

use kiln_common::{InternalError, SourceLoc};
use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode};
use kiln_ir::Type;

use crate::lifecycle::LifecycleState;

/// Malformed enter/close pairing or illegal nesting.
pub const E300: DiagnosticCode = DiagnosticCode::new(Category::Error, 300);
/// Operation issued outside any module.
pub const E301: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
/// Implicit-clock construct under a bare domain.
pub const E302: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);
/// Duplicate port name within a module.
pub const E303: DiagnosticCode = DiagnosticCode::new(Category::Error, 303);
/// Hook targeting a module that is no longer open.
pub const E304: DiagnosticCode = DiagnosticCode::new(Category::Error, 304);
/// Duplicate wire, register or instance name within a module.
pub const E305: DiagnosticCode = DiagnosticCode::new(Category::Error, 305);
/// Unknown port on an instance.
pub const E306: DiagnosticCode = DiagnosticCode::new(Category::Error, 306);
/// Connection to something that cannot be driven from here.
pub const E307: DiagnosticCode = DiagnosticCode::new(Category::Error, 307);
/// Signal used outside the module that owns it.
pub const E308: DiagnosticCode = DiagnosticCode::new(Category::Error, 308);
/// Non-clock used as clock or non-reset used as reset.
pub const E309: DiagnosticCode = DiagnosticCode::new(Category::Error, 309);
/// Operation not allowed in the module's lifecycle state.
pub const E310: DiagnosticCode = DiagnosticCode::new(Category::Error, 310);
/// Body-end hooks did not reach a fixed point.
pub const E311: DiagnosticCode = DiagnosticCode::new(Category::Error, 311);
/// Internal engine error.
pub const E312: DiagnosticCode = DiagnosticCode::new(Category::Error, 312);
/// Warnings promoted to errors by `diagnostics.deny_warnings`.
pub const E313: DiagnosticCode = DiagnosticCode::new(Category::Error, 313);
/// Literal that does not fit its declared width.
pub const E314: DiagnosticCode = DiagnosticCode::new(Category::Error, 314);
/// Definition built by a different elaboration context.
pub const E315: DiagnosticCode = DiagnosticCode::new(Category::Error, 315);

/// Destination driven more than once.
pub const W300: DiagnosticCode = DiagnosticCode::new(Category::Warning, 300);
/// Connection source wider than its destination.
pub const W301: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);

/// The result type of every elaboration operation.
pub type ElabResult<T> = Result<T, ElabError>;

/// A fatal elaboration error.
///
/// Every variant aborts the whole elaboration; none is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ElabError {
    /// Malformed enter/close pairing, recursion, or depth overflow.
    #[error("nesting error: {message}")]
    Nesting {
        /// What went wrong.
        message: String,
    },

    /// An operation that needs a module was issued outside of one.
    #[error("`{operation}` requires an active module, but no module is being elaborated")]
    NoActiveModule {
        /// The attempted operation.
        operation: &'static str,
    },

    /// An implicit-clock module or register was used where no clock and
    /// reset are in scope.
    #[error("cannot use {what} in `{module}`: no implicit clock or reset in scope")]
    ImplicitClock {
        /// The offending construct, e.g. "implicit-clock module `Counter`".
        what: String,
        /// The bare module it was used in.
        module: String,
    },

    /// Two ports with the same name in one module.
    #[error("duplicate port `{port}` in module `{module}`")]
    DuplicatePort {
        /// The module.
        module: String,
        /// The repeated port name.
        port: String,
    },

    /// A body-end hook was registered for a module that already closed.
    #[error("body-end hook targets module `{module}`, which is no longer open")]
    UnresolvedHook {
        /// The closed (or unknown) module.
        module: String,
    },

    /// A wire, register or instance name collides with an existing name.
    #[error("duplicate name `{name}` in module `{module}`")]
    DuplicateName {
        /// The module.
        module: String,
        /// The repeated name.
        name: String,
    },

    /// No port with that name exists on the instantiated module.
    #[error("module `{module}` has no port named `{port}`")]
    UnknownPort {
        /// The instantiated module.
        module: String,
        /// The requested port name.
        port: String,
    },

    /// The connection destination cannot be driven from this module.
    #[error("cannot drive `{target}` in `{module}`: {reason}")]
    InvalidSink {
        /// The module making the connection.
        module: String,
        /// The destination.
        target: String,
        /// Why the destination is not drivable.
        reason: &'static str,
    },

    /// A signal of another module was used.
    #[error("signal `{signal}` belongs to another module and cannot be used in `{module}`")]
    OutOfScope {
        /// The module making the reference.
        module: String,
        /// The foreign signal.
        signal: String,
    },

    /// A signal of the wrong type was given as clock or reset.
    #[error("`{signal}` has type {found} and cannot be used as a {expected}")]
    DomainSignal {
        /// The signal.
        signal: String,
        /// "clock" or "reset".
        expected: &'static str,
        /// The signal's actual type.
        found: Type,
    },

    /// The operation is not allowed in the module's current state.
    #[error("cannot {operation} in module `{module}` while it is {state}")]
    Lifecycle {
        /// The module.
        module: String,
        /// The module's state.
        state: LifecycleState,
        /// The attempted operation.
        operation: &'static str,
    },

    /// Body-end hooks kept registering new hooks.
    #[error("closing `{module}` fired more than {limit} body-end hooks")]
    HookDrainLimit {
        /// The module being closed.
        module: String,
        /// The configured limit.
        limit: usize,
    },

    /// Warnings were emitted while `deny_warnings` is set.
    #[error("{count} warning(s) denied by configuration")]
    DeniedWarnings {
        /// How many warnings were emitted.
        count: usize,
    },

    /// A literal of width zero, or whose value needs more bits than its
    /// width.
    #[error("literal {value} does not fit in UInt<{width}> in `{module}`")]
    LiteralWidth {
        /// The module using the literal.
        module: String,
        /// The literal value.
        value: u128,
        /// The declared width.
        width: u32,
    },

    /// A definition from another context was instantiated.
    #[error("definition `{definition}` belongs to another elaboration and cannot be instantiated in `{module}`")]
    ForeignDefinition {
        /// The definition's key.
        definition: String,
        /// The module it was instantiated in.
        module: String,
    },

    /// An engine invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl ElabError {
    /// Shorthand for a [`ElabError::Nesting`] error.
    pub fn nesting(message: impl Into<String>) -> Self {
        ElabError::Nesting {
            message: message.into(),
        }
    }

    /// The diagnostic code of this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ElabError::Nesting { .. } => E300,
            ElabError::NoActiveModule { .. } => E301,
            ElabError::ImplicitClock { .. } => E302,
            ElabError::DuplicatePort { .. } => E303,
            ElabError::UnresolvedHook { .. } => E304,
            ElabError::DuplicateName { .. } => E305,
            ElabError::UnknownPort { .. } => E306,
            ElabError::InvalidSink { .. } => E307,
            ElabError::OutOfScope { .. } => E308,
            ElabError::DomainSignal { .. } => E309,
            ElabError::Lifecycle { .. } => E310,
            ElabError::HookDrainLimit { .. } => E311,
            ElabError::Internal(_) => E312,
            ElabError::DeniedWarnings { .. } => E313,
            ElabError::LiteralWidth { .. } => E314,
            ElabError::ForeignDefinition { .. } => E315,
        }
    }

    /// Converts this error into a diagnostic.
    pub fn to_diagnostic(&self, loc: SourceLoc, path: Vec<String>) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string(), loc).with_path(path);
        match self {
            ElabError::ImplicitClock { .. } => diag.with_help(
                "instantiate it from an implicit-clock module or wrap it in `with_clock_and_reset`",
            ),
            ElabError::UnresolvedHook { .. } => {
                diag.with_note("body-end hooks can only target modules that are still open")
            }
            ElabError::HookDrainLimit { .. } => diag
                .with_note("a body-end hook probably re-registers itself unconditionally")
                .with_help("raise `elaborate.hook_drain_limit` in kiln.toml if this is intended"),
            ElabError::LiteralWidth { width: 0, .. } => {
                diag.with_help("literals need at least one bit; `Value::uint` picks the width")
            }
            ElabError::ForeignDefinition { .. } => {
                diag.with_note("definitions are only valid in the context that built them")
            }
            ElabError::Internal(_) => diag.with_note("this is a bug in kiln"),
            _ => diag,
        }
    }
}

/// The single failure returned by [`elaborate`](crate::elaborate).
///
/// Carries the innermost error and the module nesting path at the point of
/// failure. No partial circuit is ever returned alongside it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}{}", render_path(.path))]
pub struct ElabFailure {
    /// The error that aborted elaboration.
    pub error: ElabError,
    /// Desired module names from the outermost open module inward.
    pub path: Vec<String>,
    /// Generator location of the last construction operation.
    pub loc: SourceLoc,
    /// Warnings emitted before the failure.
    pub warnings: Vec<Diagnostic>,
}

impl ElabFailure {
    /// Converts the failure into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        self.error.to_diagnostic(self.loc.clone(), self.path.clone())
    }
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" (in {})", path.join("/"))
    }
}

/// Creates a warning for a destination that is connected more than once.
pub fn warn_multiple_drivers(target: &str, count: u32, loc: SourceLoc) -> Diagnostic {
    Diagnostic::warning(
        W300,
        format!("`{target}` is connected {count} times"),
        loc,
    )
    .with_note("every connection is kept in order; the last one wins in simulation")
}

/// Creates a warning for a source wider than its destination.
pub fn warn_width_truncation(target: &str, dest_width: u32, src_width: u32, loc: SourceLoc) -> Diagnostic {
    Diagnostic::warning(
        W301,
        format!("{src_width}-bit value truncated when connected to {dest_width}-bit `{target}`"),
        loc,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_diagnostics::Severity;

    #[test]
    fn error_code_formats() {
        assert_eq!(format!("{E300}"), "E300");
        assert_eq!(format!("{E313}"), "E313");
        assert_eq!(format!("{W301}"), "W301");
    }

    #[test]
    fn implicit_clock_message_and_help() {
        let err = ElabError::ImplicitClock {
            what: "implicit-clock module `Counter`".to_string(),
            module: "Top".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot use implicit-clock module `Counter` in `Top`: no implicit clock or reset in scope"
        );
        let diag = err.to_diagnostic(SourceLoc::UNKNOWN, vec!["Top".to_string()]);
        assert_eq!(diag.code, E302);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.help.len(), 1);
        assert_eq!(diag.path, vec!["Top".to_string()]);
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            ElabError::nesting("x"),
            ElabError::NoActiveModule { operation: "input" },
            ElabError::UnresolvedHook {
                module: "A".to_string(),
            },
            ElabError::DeniedWarnings { count: 1 },
            ElabError::LiteralWidth {
                module: "A".to_string(),
                value: 4,
                width: 2,
            },
            ElabError::ForeignDefinition {
                definition: "Leaf".to_string(),
                module: "A".to_string(),
            },
            ElabError::Internal(InternalError::new("boom")),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn internal_is_transparent() {
        let err: ElabError = InternalError::new("stack underflow").into();
        assert_eq!(err.to_string(), "internal elaboration error: stack underflow");
    }

    #[test]
    fn failure_display_includes_path() {
        let failure = ElabFailure {
            error: ElabError::DuplicatePort {
                module: "Child".to_string(),
                port: "a".to_string(),
            },
            path: vec!["Top".to_string(), "Child".to_string()],
            loc: SourceLoc::UNKNOWN,
            warnings: Vec::new(),
        };
        assert_eq!(
            failure.to_string(),
            "duplicate port `a` in module `Child` (in Top/Child)"
        );
        assert_eq!(failure.to_diagnostic().code, E303);
    }

    #[test]
    fn failure_display_without_path() {
        let failure = ElabFailure {
            error: ElabError::nesting("no circuit has been started"),
            path: Vec::new(),
            loc: SourceLoc::UNKNOWN,
            warnings: Vec::new(),
        };
        assert_eq!(failure.to_string(), "nesting error: no circuit has been started");
    }

    #[test]
    fn warnings() {
        let d = warn_multiple_drivers("out", 3, SourceLoc::UNKNOWN);
        assert_eq!(d.code, W300);
        assert!(d.message.contains("3 times"));

        let d = warn_width_truncation("out", 4, 8, SourceLoc::UNKNOWN);
        assert_eq!(d.code, W301);
        assert_eq!(d.severity, Severity::Warning);
    }
}
