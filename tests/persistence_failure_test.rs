//! State writes under injected storage faults.
//!
//! The store below commits through the in-memory adapter and then misbehaves,
//! so each test can check that one answer or override changes the state once.

mod common;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use common::{LEARNER, QUESTION, RIGHT, TOPIC};
use pacer::adapters::memory::{
    InMemoryAdjustmentLog, InMemoryAttemptHistory, InMemoryProfileStore, InMemoryQuestionBank,
    InMemoryStateStore,
};
use pacer::domain::errors::{DomainError, DomainResult};
use pacer::domain::models::{
    AdjustmentOutcome, AdjustmentReason, AnswerEvent, Config, DifficultyState, PerformancePoint,
    Question,
};
use pacer::domain::ports::DifficultyStateRepository;
use pacer::services::DifficultyService;

const STALL: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    /// The first upsert fails before touching storage
    FailFirst,
    /// The first upsert commits, then reports a storage error
    CommitThenFail,
    /// The first upsert commits, then outlives the I/O timeout
    CommitThenStall,
    /// Every upsert loses the version race
    AlwaysConflict,
}

struct FaultyStore {
    inner: InMemoryStateStore,
    fault: Mutex<Fault>,
    upserts: AtomicU32,
}

impl FaultyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStateStore::new(),
            fault: Mutex::new(Fault::None),
            upserts: AtomicU32::new(0),
        }
    }

    fn arm(&self, fault: Fault) {
        *self.fault.lock().unwrap() = fault;
        self.upserts.store(0, Ordering::SeqCst);
    }

    fn upserts(&self) -> u32 {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DifficultyStateRepository for FaultyStore {
    async fn get(&self, learner_id: &str, topic_id: &str) -> DomainResult<Option<DifficultyState>> {
        self.inner.get(learner_id, topic_id).await
    }

    async fn create(&self, state: &DifficultyState) -> DomainResult<DifficultyState> {
        self.inner.create(state).await
    }

    async fn upsert(&self, state: &DifficultyState) -> DomainResult<DifficultyState> {
        let first = self.upserts.fetch_add(1, Ordering::SeqCst) == 0;
        let fault = *self.fault.lock().unwrap();

        match fault {
            Fault::None => self.inner.upsert(state).await,
            Fault::FailFirst if first => Err(DomainError::Persistence("disk I/O error".into())),
            Fault::FailFirst => self.inner.upsert(state).await,
            Fault::CommitThenFail => {
                let stored = self.inner.upsert(state).await?;
                if first {
                    return Err(DomainError::Persistence("connection reset".into()));
                }
                Ok(stored)
            }
            Fault::CommitThenStall => {
                let stored = self.inner.upsert(state).await?;
                if first {
                    tokio::time::sleep(STALL).await;
                }
                Ok(stored)
            }
            Fault::AlwaysConflict => {
                Err(DomainError::state_conflict(&state.learner_id, &state.topic_id))
            }
        }
    }

    async fn list_by_learner(&self, learner_id: &str) -> DomainResult<Vec<DifficultyState>> {
        self.inner.list_by_learner(learner_id).await
    }
}

struct Fixture {
    states: Arc<FaultyStore>,
    audit: Arc<InMemoryAdjustmentLog>,
    service: DifficultyService,
}

impl Fixture {
    /// A learner with four correct answers on record, so the next answer moves difficulty.
    async fn new() -> Self {
        let mut config = Config::default();
        config.io.timeout_ms = 50;
        config.retry.initial_backoff_ms = 1;
        config.retry.max_backoff_ms = 2;

        let states = Arc::new(FaultyStore::new());
        let history = Arc::new(InMemoryAttemptHistory::new());
        let questions = Arc::new(InMemoryQuestionBank::new());
        let audit = Arc::new(InMemoryAdjustmentLog::new());
        questions
            .insert(Question::new(QUESTION, TOPIC, 5.0, RIGHT))
            .await;

        let now = Utc::now();
        for i in 1..=4 {
            history
                .record(
                    LEARNER,
                    TOPIC,
                    PerformancePoint {
                        difficulty_at_attempt: 5.0,
                        success: true,
                        response_time_ms: 2_500,
                        timestamp: now - Duration::seconds(i),
                        expected_success_probability: 0.5,
                    },
                )
                .await;
        }

        let service = DifficultyService::new(
            states.clone(),
            history,
            Arc::new(InMemoryProfileStore::new()),
            questions,
            audit.clone(),
        )
        .with_config(&config);
        service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();

        Self {
            states,
            audit,
            service,
        }
    }

    async fn answer(&self) -> DomainResult<AdjustmentOutcome> {
        let event = AnswerEvent::new(LEARNER, TOPIC, QUESTION, RIGHT).with_response_time(2_500);
        self.service.update_difficulty_after_answer(&event).await
    }

    async fn stored(&self) -> DifficultyState {
        self.states.get(LEARNER, TOPIC).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn test_storage_error_before_commit_applies_answer_once() {
    let fx = Fixture::new().await;
    fx.states.arm(Fault::FailFirst);

    let outcome = fx.answer().await.unwrap();

    assert_eq!(outcome.reason, AdjustmentReason::PerformanceAdjustment);
    assert_eq!(outcome.previous_difficulty, 5.0);
    assert_eq!(fx.states.upserts(), 2);
    let state = fx.stored().await;
    assert_eq!(state.questions_attempted, 1);
    assert_eq!(state.version, 2);
    assert_eq!(fx.audit.entries().await.len(), 1);
}

#[tokio::test]
async fn test_storage_error_after_commit_applies_answer_once() {
    let fx = Fixture::new().await;
    fx.states.arm(Fault::CommitThenFail);

    let outcome = fx.answer().await.unwrap();

    assert_eq!(outcome.previous_difficulty, 5.0);
    let state = fx.stored().await;
    assert_eq!(state.questions_attempted, 1);
    assert_eq!(state.version, 2);
    assert_eq!(state.difficulty, outcome.new_difficulty);
    assert_eq!(fx.audit.entries().await.len(), 1);
}

#[tokio::test]
async fn test_timeout_after_commit_applies_answer_once() {
    let fx = Fixture::new().await;
    fx.states.arm(Fault::CommitThenStall);

    let outcome = fx.answer().await.unwrap();

    assert_eq!(outcome.reason, AdjustmentReason::PerformanceAdjustment);
    assert_eq!(outcome.previous_difficulty, 5.0);
    assert_eq!(fx.states.upserts(), 1, "a timed-out write must not be replayed");
    let state = fx.stored().await;
    assert_eq!(state.questions_attempted, 1);
    assert_eq!(state.version, 2);
    assert_eq!(state.difficulty, outcome.new_difficulty);
    assert_eq!(fx.audit.entries().await.len(), 1);
}

#[tokio::test]
async fn test_timeout_after_commit_sets_override_once() {
    let fx = Fixture::new().await;
    fx.states.arm(Fault::CommitThenStall);

    let state = fx
        .service
        .set_manual_difficulty_override(LEARNER, TOPIC, 8.0, "exam prep")
        .await
        .unwrap();

    assert_eq!(state.version, 2);
    assert_eq!(fx.states.upserts(), 1);
    let stored = fx.stored().await;
    assert_eq!(stored.version, 2);
    assert_eq!(stored.manual_override.unwrap().difficulty, 8.0);

    fx.states.arm(Fault::CommitThenStall);
    let released = fx.service.remove_manual_override(LEARNER, TOPIC).await.unwrap();

    assert!(released.manual_override.is_none());
    assert_eq!(fx.stored().await.version, 3);
}

#[tokio::test]
async fn test_conflicts_exhaust_retries_without_changing_state() {
    let fx = Fixture::new().await;
    let before = fx.stored().await;
    fx.states.arm(Fault::AlwaysConflict);

    let err = fx.answer().await.unwrap_err();

    assert_eq!(err.code(), "CONCURRENCY_CONFLICT");
    let retries = Config::default().io.max_conflict_retries;
    assert_eq!(fx.states.upserts(), retries + 1);
    assert_eq!(fx.stored().await, before);
    assert!(fx.audit.entries().await.is_empty());
}
