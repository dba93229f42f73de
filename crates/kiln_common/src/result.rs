//! Internal error type for engine invariant violations.

/// The result type for fallible operations that can only fail on an engine bug.
pub type KilnResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in Kiln, not a problem in the user's
/// circuit description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal elaboration error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("stack underflow");
        assert_eq!(format!("{err}"), "internal elaboration error: stack underflow");
    }

    #[test]
    fn err_path() {
        let r: KilnResult<i32> = Err(InternalError::new("test error"));
        let err = r.unwrap_err();
        assert_eq!(err.message, "test error");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
