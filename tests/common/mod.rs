//! Common test utilities for integration tests
//!
//! Wires the difficulty service over the in-memory adapters and replays
//! answers the way the CLI does: the controller runs first, then the graded
//! attempt is appended to the history.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use pacer::adapters::memory::{
    InMemoryAdjustmentLog, InMemoryAttemptHistory, InMemoryProfileStore, InMemoryQuestionBank,
    InMemoryStateStore,
};
use pacer::domain::models::{AdjustmentOutcome, AnswerEvent, Config, PerformancePoint, Question};
use pacer::domain::ports::DifficultyStateRepository;
use pacer::services::DifficultyService;

pub const LEARNER: &str = "alice";
pub const TOPIC: &str = "algebra";
pub const QUESTION: &str = "q-algebra-1";
pub const RIGHT: &str = "42";
pub const WRONG: &str = "41";

pub struct Harness {
    pub states: Arc<InMemoryStateStore>,
    pub history: Arc<InMemoryAttemptHistory>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub questions: Arc<InMemoryQuestionBank>,
    pub audit: Arc<InMemoryAdjustmentLog>,
    pub service: DifficultyService,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(&Config::default()).await
    }

    pub async fn with_config(config: &Config) -> Self {
        let states = Arc::new(InMemoryStateStore::new());
        let history = Arc::new(InMemoryAttemptHistory::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let questions = Arc::new(InMemoryQuestionBank::new());
        let audit = Arc::new(InMemoryAdjustmentLog::new());

        questions
            .insert(Question::new(QUESTION, TOPIC, 5.0, RIGHT))
            .await;

        let service = DifficultyService::new(
            states.clone(),
            history.clone(),
            profiles.clone(),
            questions.clone(),
            audit.clone(),
        )
        .with_config(config);

        Self {
            states,
            history,
            profiles,
            questions,
            audit,
            service,
        }
    }

    /// Submit one answer at `at` and append it to the history if it was graded.
    pub async fn answer_at(&self, correct: bool, at: DateTime<Utc>) -> AdjustmentOutcome {
        let before = self
            .states
            .get(LEARNER, TOPIC)
            .await
            .unwrap()
            .expect("state must be initialized before answering");

        let submitted = if correct { RIGHT } else { WRONG };
        let event = AnswerEvent::new(LEARNER, TOPIC, QUESTION, submitted)
            .with_response_time(2_500)
            .answered_at(at);
        let outcome = self.service.update_difficulty_after_answer(&event).await.unwrap();

        if let Some(success) = outcome.was_correct {
            self.history
                .record(
                    LEARNER,
                    TOPIC,
                    PerformancePoint {
                        difficulty_at_attempt: before.difficulty,
                        success,
                        response_time_ms: 2_500,
                        timestamp: at,
                        expected_success_probability: 0.5,
                    },
                )
                .await;
        }
        outcome
    }

    /// Submit answers one second apart, ending just before now.
    pub async fn answer_streak(&self, results: &[bool]) -> Vec<AdjustmentOutcome> {
        let start = Utc::now() - Duration::seconds(results.len() as i64 + 1);
        let mut outcomes = Vec::with_capacity(results.len());
        for (i, correct) in results.iter().enumerate() {
            outcomes.push(self.answer_at(*correct, start + Duration::seconds(i as i64)).await);
        }
        outcomes
    }
}
