//! Unified error hierarchy for SAMC
//!
//! The engine has exactly two failure modes: invalid input at the boundary
//! and a sport identifier that is not registered. Sparse or absent history is
//! never an error; it surfaces as a status value in the computed reports.

use thiserror::Error;

/// Top-level error type for all SAMC operations
#[derive(Debug, Error)]
pub enum SamcError {
    /// Invalid tag, enum value or malformed payload
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Sport identifier with no registered capability
    #[error("Unknown sport: '{sport_id}' (available: {available})")]
    UnknownSport { sport_id: String, available: String },

    /// Configuration errors (invalid contribution table, out-of-range windows)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A single offending input field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Path of the field, e.g. `exercises[0].eccentric_load`
    pub field: String,

    /// Why the value was rejected
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the field path, used when a nested value fails validation
    pub fn within(mut self, parent: &str) -> Self {
        self.field = if self.field.is_empty() {
            parent.to_string()
        } else {
            format!("{}.{}", parent, self.field)
        };
        self
    }
}

/// Result type alias for SAMC operations
pub type Result<T> = std::result::Result<T, SamcError>;

impl SamcError {
    /// Build a validation error for a field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SamcError::Validation(ValidationError::new(field, reason))
    }

    /// Engine errors come from deterministic input checks, retrying never helps
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SamcError::Validation(_) => ErrorSeverity::Warning,
            SamcError::UnknownSport { .. } => ErrorSeverity::Error,
            SamcError::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Name of the offending field, if the error is tied to one
    pub fn field(&self) -> Option<&str> {
        match self {
            SamcError::Validation(err) => Some(&err.field),
            SamcError::UnknownSport { .. } => Some("sport_id"),
            SamcError::Configuration(_) => None,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SamcError::Validation(err) => {
                format!("The field '{}' is not valid: {}", err.field, err.reason)
            }
            SamcError::UnknownSport { sport_id, available } => {
                format!(
                    "Sport '{}' is not supported. Choose one of: {}",
                    sport_id, available
                )
            }
            SamcError::Configuration(reason) => {
                format!("SAMC is misconfigured: {}", reason)
            }
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = SamcError::validation("sets", "must be at least 1");
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = SamcError::Configuration("bad table".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_nothing_is_retryable() {
        let err = SamcError::UnknownSport {
            sport_id: "rowing".to_string(),
            available: "weight_lifting".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!SamcError::validation("rpe", "too high").is_retryable());
    }

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::new("eccentric_load", "unknown value 'extreme'")
            .within("exercises[2]");
        assert_eq!(err.field, "exercises[2].eccentric_load");

        let err: SamcError = err.into();
        assert_eq!(err.field(), Some("exercises[2].eccentric_load"));
        assert!(err.to_string().contains("exercises[2].eccentric_load"));
    }

    #[test]
    fn test_user_messages() {
        let err = SamcError::UnknownSport {
            sport_id: "rowing".to_string(),
            available: "bicycle_commuting, weight_lifting".to_string(),
        };
        assert!(err.user_message().contains("not supported"));
        assert!(err.user_message().contains("weight_lifting"));
    }
}
