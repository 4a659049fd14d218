//! In-memory question bank.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::Question;
use crate::domain::ports::QuestionBank;

#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Arc<RwLock<HashMap<String, Question>>>,
}

impl InMemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, question: Question) {
        self.questions
            .write()
            .await
            .insert(question.id.clone(), question);
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn get_question(&self, question_id: &str) -> DomainResult<Option<Question>> {
        Ok(self.questions.read().await.get(question_id).cloned())
    }

    async fn available_difficulties(&self, topic_id: &str) -> DomainResult<Vec<f64>> {
        let mut levels: Vec<f64> = self
            .questions
            .read()
            .await
            .values()
            .filter(|q| q.topic_id == topic_id)
            .map(|q| q.difficulty)
            .collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        Ok(levels)
    }
}
