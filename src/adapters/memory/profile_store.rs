//! In-memory learning profiles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::LearningProfile;
use crate::domain::ports::LearningProfileSource;

#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, LearningProfile>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: LearningProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.learner_id.clone(), profile);
    }

    /// Make every lookup fail, simulating an unreachable profiling service.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl LearningProfileSource for InMemoryProfileStore {
    async fn get_profile(&self, learner_id: &str) -> DomainResult<Option<LearningProfile>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Validation("profile service unavailable".to_string()));
        }
        Ok(self.profiles.read().await.get(learner_id).cloned())
    }
}
