//! In-memory difficulty state store with version compare-and-swap.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DifficultyState;
use crate::domain::ports::DifficultyStateRepository;

type Key = (String, String);

#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    states: Arc<RwLock<HashMap<Key, DifficultyState>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

fn key(learner_id: &str, topic_id: &str) -> Key {
    (learner_id.to_string(), topic_id.to_string())
}

#[async_trait]
impl DifficultyStateRepository for InMemoryStateStore {
    async fn get(&self, learner_id: &str, topic_id: &str) -> DomainResult<Option<DifficultyState>> {
        Ok(self.states.read().await.get(&key(learner_id, topic_id)).cloned())
    }

    async fn create(&self, state: &DifficultyState) -> DomainResult<DifficultyState> {
        let mut states = self.states.write().await;
        let stored = states
            .entry(key(&state.learner_id, &state.topic_id))
            .or_insert_with(|| DifficultyState {
                version: 1,
                ..state.clone()
            });
        Ok(stored.clone())
    }

    async fn upsert(&self, state: &DifficultyState) -> DomainResult<DifficultyState> {
        let mut states = self.states.write().await;
        let k = key(&state.learner_id, &state.topic_id);
        let stored_version = states.get(&k).map(|s| s.version);

        let matches = match stored_version {
            None => state.version == 0,
            Some(version) => state.version != 0 && version == state.version,
        };
        if !matches {
            return Err(DomainError::state_conflict(&state.learner_id, &state.topic_id));
        }

        let written = DifficultyState {
            version: state.version + 1,
            ..state.clone()
        };
        states.insert(k, written.clone());
        Ok(written)
    }

    async fn list_by_learner(&self, learner_id: &str) -> DomainResult<Vec<DifficultyState>> {
        let mut states: Vec<DifficultyState> = self
            .states
            .read()
            .await
            .values()
            .filter(|s| s.learner_id == learner_id)
            .cloned()
            .collect();
        states.sort_by(|a, b| a.topic_id.cmp(&b.topic_id));
        Ok(states)
    }
}
