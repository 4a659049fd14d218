use serde::{Deserialize, Serialize};

/// Answer key for one question in the external bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub topic_id: String,
    pub difficulty: f64,
    pub correct_answer: String,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        topic_id: impl Into<String>,
        difficulty: f64,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            topic_id: topic_id.into(),
            difficulty,
            correct_answer: correct_answer.into(),
        }
    }

    /// Grade a submission. Surrounding whitespace and ASCII case are ignored.
    pub fn is_correct(&self, submitted: &str) -> bool {
        self.correct_answer
            .trim()
            .eq_ignore_ascii_case(submitted.trim())
    }
}
