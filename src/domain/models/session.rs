//! Request and result types for the session-start and answer paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::adjustment::AdjustmentReason;
use super::difficulty::DifficultyCalculation;

/// Parameters of a session-start preview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub topic_id: String,

    /// Session-scoped fixed difficulty; loses to a state-level override
    #[serde(default)]
    pub override_difficulty: Option<f64>,

    #[serde(default)]
    pub session_length: Option<u32>,

    #[serde(default)]
    pub time_of_day: Option<u8>,
}

impl SessionConfig {
    pub fn for_topic(topic_id: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            ..Self::default()
        }
    }

    pub fn with_override(mut self, difficulty: f64) -> Self {
        self.override_difficulty = Some(difficulty);
        self
    }
}

/// Where a previewed difficulty came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultySource {
    ManualOverride,
    SessionOverride,
    InsufficientData,
    Algorithm,
}

impl DifficultySource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ManualOverride => "manual_override",
            Self::SessionOverride => "session_override",
            Self::InsufficientData => "insufficient_data",
            Self::Algorithm => "algorithm",
        }
    }
}

/// Read-only preview returned at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDifficulty {
    pub learner_id: String,
    pub topic_id: String,
    pub difficulty: f64,
    pub source: DifficultySource,
    pub data_points: u32,
    pub calculation: Option<DifficultyCalculation>,
}

/// A graded-answer notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub learner_id: String,
    pub topic_id: String,
    pub question_id: String,
    pub submitted_answer: String,
    pub response_time_ms: u64,
    pub answered_at: DateTime<Utc>,
    #[serde(default)]
    pub session_length: Option<u32>,
    #[serde(default)]
    pub time_of_day: Option<u8>,
}

impl AnswerEvent {
    pub fn new(
        learner_id: impl Into<String>,
        topic_id: impl Into<String>,
        question_id: impl Into<String>,
        submitted_answer: impl Into<String>,
    ) -> Self {
        Self {
            learner_id: learner_id.into(),
            topic_id: topic_id.into(),
            question_id: question_id.into(),
            submitted_answer: submitted_answer.into(),
            response_time_ms: 0,
            answered_at: Utc::now(),
            session_length: None,
            time_of_day: None,
        }
    }

    pub const fn with_response_time(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    pub const fn answered_at(mut self, at: DateTime<Utc>) -> Self {
        self.answered_at = at;
        self
    }
}

/// Result of the answer path, including documented no-ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentOutcome {
    pub learner_id: String,
    pub topic_id: String,
    pub reason: AdjustmentReason,
    pub previous_difficulty: f64,
    pub new_difficulty: f64,
    pub adjustment_magnitude: f64,
    pub confidence: f64,
    pub stability_delta: f64,
    pub reasoning: String,
    /// `None` when grading was skipped (override active)
    pub was_correct: Option<bool>,
    pub expected_performance: Option<f64>,
    pub data_points: u32,
}

impl AdjustmentOutcome {
    pub fn is_noop(&self) -> bool {
        self.adjustment_magnitude == 0.0
    }
}
