//! Adjustment audit log port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::AdjustmentLogEntry;

/// Append-only sink for difficulty decisions.
#[async_trait]
pub trait AdjustmentLog: Send + Sync {
    /// Append one entry. Entries are never updated.
    async fn append(&self, entry: &AdjustmentLogEntry) -> DomainResult<()>;

    /// Entries for a learner and topic created at or after `since`, oldest first.
    async fn query(
        &self,
        learner_id: &str,
        topic_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<AdjustmentLogEntry>>;
}
