//! Result and error types for Pasos.

use thiserror::Error;

/// Result type for Pasos operations
pub type PasosResult<T> = Result<T, PasosError>;

/// Errors that can occur in Pasos
#[derive(Debug, Error)]
pub enum PasosError {
    /// Locator matched nothing at resolution time
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// Wait predicate never became true within budget
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The act failed after a successful wait (e.g. stale-element race)
    #[error("Interaction failed: {message}")]
    InteractionFailure {
        /// Error message
        message: String,
    },

    /// Lifecycle misuse (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Dispatch found no registered handler for the step text
    #[error("No matching step for: {text}")]
    NoMatchingStep {
        /// Step text that failed to match
        text: String,
    },

    /// Assertion failed inside a step handler
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Malformed page or step definition
    #[error("Definition error: {message}")]
    DefinitionError {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PasosError {
    /// Short kind name, used in scenario reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ElementNotFound { .. } => "ElementNotFound",
            Self::Timeout { .. } => "Timeout",
            Self::InteractionFailure { .. } => "InteractionFailure",
            Self::InvalidState { .. } => "InvalidState",
            Self::NoMatchingStep { .. } => "NoMatchingStep",
            Self::AssertionFailed { .. } => "AssertionFailed",
            Self::DefinitionError { .. } => "DefinitionError",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Yaml(_) => "Yaml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PasosError::Timeout { ms: 5000 };
        assert_eq!(err.to_string(), "Operation timed out after 5000ms");

        let err = PasosError::ElementNotFound {
            locator: "css:#login".to_string(),
        };
        assert!(err.to_string().contains("css:#login"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(PasosError::Timeout { ms: 1 }.kind(), "Timeout");
        assert_eq!(
            PasosError::NoMatchingStep {
                text: "x".to_string()
            }
            .kind(),
            "NoMatchingStep"
        );
        assert_eq!(
            PasosError::InvalidState {
                message: "x".to_string()
            }
            .kind(),
            "InvalidState"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PasosError = io.into();
        assert_eq!(err.kind(), "Io");
    }
}
