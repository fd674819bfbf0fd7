//! Unified error hierarchy for the assessment engine
//!
//! Nothing in the engine is fatal. Validation failures, incomplete skinfold
//! data and unknown goals are all representable as data in a result; the
//! top-level [`AnthropometryError`] covers the surrounding IO and configuration
//! layers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{MetricName, SkinfoldSite};

/// Top-level error type for all anthropometry operations
#[derive(Debug, Error)]
pub enum AnthropometryError {
    /// One or more input fields failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Goal identifier outside the closed set
    #[error("Recommendation error: {0}")]
    UnknownGoal(#[from] UnknownGoalError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file missing or unreadable
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Every out-of-domain or missing field found in a raw record.
///
/// Validation is not fail-fast: the map holds one message per offending field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation; the first message for a field wins
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn message(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// A dependent metric could not be computed because its prerequisites are absent.
///
/// Not a failure: the metric is simply omitted from the result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{metric} unavailable, missing skinfold sites: {}", format_sites(.missing_sites))]
pub struct IncompleteDataError {
    pub metric: MetricName,
    pub missing_sites: Vec<SkinfoldSite>,
}

fn format_sites(sites: &[SkinfoldSite]) -> String {
    sites
        .iter()
        .map(|site| site.field_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Goal identifier not in the closed set of supported goals
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("No recommendation available for goal: {goal}")]
pub struct UnknownGoalError {
    pub goal: String,
}

/// Result type alias for anthropometry operations
pub type Result<T> = std::result::Result<T, AnthropometryError>;

impl AnthropometryError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AnthropometryError::Validation(_) => ErrorSeverity::Warning,
            AnthropometryError::UnknownGoal(_) => ErrorSeverity::Info,
            AnthropometryError::ConfigNotFound { .. } => ErrorSeverity::Warning,
            AnthropometryError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AnthropometryError::Validation(err) => {
                format!(
                    "{} field(s) need attention: {}",
                    err.len(),
                    err.errors.keys().cloned().collect::<Vec<_>>().join(", ")
                )
            }
            AnthropometryError::UnknownGoal(err) => {
                format!("There are no specific recommendations for '{}'", err.goal)
            }
            AnthropometryError::ConfigNotFound { path } => {
                format!("Could not find configuration file: {}", path.display())
            }
            _ => self.to_string(),
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
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = AnthropometryError::Validation(ValidationError::new());
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = AnthropometryError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_validation_error_collects_fields() {
        let mut err = ValidationError::new();
        err.add("weight", "weight must be between 30 and 300 kg");
        err.add("age", "age is required");
        err.add("weight", "second message is ignored");

        assert_eq!(err.len(), 2);
        assert_eq!(
            err.message("weight"),
            Some("weight must be between 30 and 300 kg")
        );
        assert_eq!(
            err.to_string(),
            "age: age is required; weight: weight must be between 30 and 300 kg"
        );
    }

    #[test]
    fn test_incomplete_data_message() {
        let err = IncompleteDataError {
            metric: MetricName::BodyFatPercentage,
            missing_sites: vec![SkinfoldSite::Triceps, SkinfoldSite::Suprailiac],
        };
        assert_eq!(
            err.to_string(),
            "body_fat_percentage unavailable, missing skinfold sites: triceps_fold, suprailiac_fold"
        );
    }

    #[test]
    fn test_user_messages() {
        let err = AnthropometryError::from(UnknownGoalError {
            goal: "unknown_goal".to_string(),
        });
        assert!(err.user_message().contains("unknown_goal"));
    }
}
