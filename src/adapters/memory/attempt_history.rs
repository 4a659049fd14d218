//! In-memory performance history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::PerformancePoint;
use crate::domain::ports::PerformanceHistory;

#[derive(Clone, Default)]
pub struct InMemoryAttemptHistory {
    attempts: Arc<RwLock<HashMap<(String, String), Vec<PerformancePoint>>>>,
}

impl InMemoryAttemptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, learner_id: &str, topic_id: &str, point: PerformancePoint) {
        self.attempts
            .write()
            .await
            .entry((learner_id.to_string(), topic_id.to_string()))
            .or_default()
            .push(point);
    }
}

#[async_trait]
impl PerformanceHistory for InMemoryAttemptHistory {
    async fn query(
        &self,
        learner_id: &str,
        topic_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<PerformancePoint>> {
        let attempts = self.attempts.read().await;
        let mut window: Vec<PerformancePoint> = attempts
            .get(&(learner_id.to_string(), topic_id.to_string()))
            .map(|points| points.iter().filter(|p| p.timestamp >= since).cloned().collect())
            .unwrap_or_default();

        window.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        window.truncate(limit);
        Ok(window)
    }
}
