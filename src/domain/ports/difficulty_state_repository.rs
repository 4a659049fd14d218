//! Difficulty state repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::DifficultyState;

/// Repository interface for per learner × topic difficulty state.
///
/// Writes are optimistic: `upsert` compares `state.version` with the stored
/// row and fails with `DomainError::ConcurrencyConflict` on mismatch.
#[async_trait]
pub trait DifficultyStateRepository: Send + Sync {
    /// Get the state for a learner and topic.
    async fn get(&self, learner_id: &str, topic_id: &str) -> DomainResult<Option<DifficultyState>>;

    /// Insert the state unless one already exists; returns whichever row is stored.
    async fn create(&self, state: &DifficultyState) -> DomainResult<DifficultyState>;

    /// Compare-and-swap write. Returns the stored state with its new version.
    ///
    /// A state with `version == 0` is inserted; any other version must match
    /// the stored row.
    async fn upsert(&self, state: &DifficultyState) -> DomainResult<DifficultyState>;

    /// All states belonging to a learner.
    async fn list_by_learner(&self, learner_id: &str) -> DomainResult<Vec<DifficultyState>>;
}
