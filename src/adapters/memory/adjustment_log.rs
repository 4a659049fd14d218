//! In-memory adjustment log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AdjustmentLogEntry;
use crate::domain::ports::AdjustmentLog;

#[derive(Clone, Default)]
pub struct InMemoryAdjustmentLog {
    entries: Arc<RwLock<Vec<AdjustmentLogEntry>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryAdjustmentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every append, simulating a broken analytics sink.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every entry in append order.
    pub async fn entries(&self) -> Vec<AdjustmentLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AdjustmentLog for InMemoryAdjustmentLog {
    async fn append(&self, entry: &AdjustmentLogEntry) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Validation("adjustment log rejected entry".to_string()));
        }
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn query(
        &self,
        learner_id: &str,
        topic_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<AdjustmentLogEntry>> {
        let mut matching: Vec<AdjustmentLogEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.learner_id == learner_id && e.topic_id == topic_id && e.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }
}
