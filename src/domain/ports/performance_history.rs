//! Performance history port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::PerformancePoint;

/// Read access to graded attempts.
#[async_trait]
pub trait PerformanceHistory: Send + Sync {
    /// Attempts at or after `since`, most recent first, at most `limit`.
    async fn query(
        &self,
        learner_id: &str,
        topic_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<PerformancePoint>>;
}
