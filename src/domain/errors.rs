//! Domain errors for the difficulty controller.

use thiserror::Error;

/// Errors surfaced by the difficulty controller.
///
/// Expected conditions (missing state, rejected input) are ordinary variants so
/// callers branch on them explicitly. Transient variants are safe to retry.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(
        "No difficulty state for learner {learner_id} on topic {topic_id}; initialize it before updating"
    )]
    StateNotFound { learner_id: String, topic_id: String },

    #[error("Question not found: {0}")]
    QuestionNotFound(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Concurrency conflict: {entity} {id} was modified")]
    ConcurrencyConflict { entity: String, id: String },

    #[error("{operation} exceeded its {budget_ms}ms budget")]
    Timeout { operation: String, budget_ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StateNotFound { .. } => "STATE_NOT_FOUND",
            Self::QuestionNotFound(_) => "QUESTION_NOT_FOUND",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether retrying the same call may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::ConcurrencyConflict { .. } | Self::Timeout { .. }
        )
    }

    pub fn state_not_found(learner_id: &str, topic_id: &str) -> Self {
        Self::StateNotFound {
            learner_id: learner_id.to_string(),
            topic_id: topic_id.to_string(),
        }
    }

    pub fn state_conflict(learner_id: &str, topic_id: &str) -> Self {
        Self::ConcurrencyConflict {
            entity: "difficulty_state".to_string(),
            id: format!("{learner_id}/{topic_id}"),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
