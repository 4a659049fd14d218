//! Learner profile port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::LearningProfile;

/// Source of learning-style profiles. A missing profile is not an error.
#[async_trait]
pub trait LearningProfileSource: Send + Sync {
    async fn get_profile(&self, learner_id: &str) -> DomainResult<Option<LearningProfile>>;
}
