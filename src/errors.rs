//! Typed error hierarchy for the Mentiva backend.
//!
//! `AppError` covers everything a request handler can fail with; the API
//! layer converts each variant to a JSON `{"error": ...}` body with the
//! matching HTTP status.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("No North Star set")]
    NoNorthStar,

    #[error("No enfoques set for this week")]
    NoEnfoques,

    #[error("Non-negotiable tasks cannot be swapped")]
    ImmutableTask,

    #[error("Completion service returned an unusable response: {0}")]
    GenerationParse(String),

    #[error("Completion service is not configured: {0}")]
    UpstreamConfig(String),

    #[error("Completion service call failed: {0}")]
    Upstream(#[source] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Validation failure with a caller-facing message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_north_star_message_matches_client_contract() {
        // The web client dispatches on this exact string.
        assert_eq!(AppError::NoNorthStar.to_string(), "No North Star set");
    }

    #[test]
    fn not_found_carries_resource_name() {
        let err = AppError::NotFound("Task 42".into());
        assert_eq!(err.to_string(), "Task 42 not found");
    }

    #[test]
    fn database_error_preserves_source() {
        let err = AppError::Database(anyhow::anyhow!("disk full"));
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn variants_are_matchable() {
        let err = AppError::ImmutableTask;
        assert!(matches!(err, AppError::ImmutableTask));
        let err = AppError::validation("focusGoals is required");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
