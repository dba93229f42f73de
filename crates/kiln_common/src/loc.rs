//! Caller source locations attached to IR entities and diagnostics.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

/// The Rust source location of the construction call that created an entity.
///
/// Captured through `#[track_caller]` on the public construction operations,
/// so a port or connection points back to the user's generator code.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SourceLoc {
    /// Path of the source file as reported by the compiler.
    pub file: Cow<'static, str>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl SourceLoc {
    /// A placeholder location for entities created by the engine itself.
    pub const UNKNOWN: SourceLoc = SourceLoc {
        file: Cow::Borrowed(""),
        line: 0,
        column: 0,
    };

    /// Returns the location of the caller of the enclosing `#[track_caller]`
    /// function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }

    /// Returns `true` if this is the placeholder location.
    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.file.is_empty()
    }
}

impl From<&'static Location<'static>> for SourceLoc {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: Cow::Borrowed(loc.file()),
            line: loc.line(),
            column: loc.column(),
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn capture() -> SourceLoc {
        SourceLoc::caller()
    }

    #[test]
    fn caller_points_here() {
        let loc = capture();
        assert!(loc.file.ends_with("loc.rs"));
        assert!(loc.line > 0);
        assert!(!loc.is_unknown());
    }

    #[test]
    fn unknown_display() {
        assert_eq!(format!("{}", SourceLoc::UNKNOWN), "<unknown>");
        assert!(SourceLoc::UNKNOWN.is_unknown());
    }

    #[test]
    fn display_format() {
        let loc = SourceLoc {
            file: Cow::Borrowed("src/top.rs"),
            line: 12,
            column: 5,
        };
        assert_eq!(format!("{loc}"), "src/top.rs:12:5");
    }

    #[test]
    fn serde_roundtrip() {
        let loc = capture();
        let json = serde_json::to_string(&loc).unwrap();
        let back: SourceLoc = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}
