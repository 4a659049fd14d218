//! Question bank port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Question;

/// Ground truth for grading and the difficulty levels on offer per topic.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Look up a question's answer key.
    async fn get_question(&self, question_id: &str) -> DomainResult<Option<Question>>;

    /// Difficulty levels with at least one question in the topic.
    async fn available_difficulties(&self, topic_id: &str) -> DomainResult<Vec<f64>>;
}
