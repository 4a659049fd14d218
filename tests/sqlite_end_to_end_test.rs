//! The full answer loop over a file-backed SQLite database, wired the way the CLI wires it.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use pacer::adapters::sqlite::{
    initialize_database, SqliteAdjustmentLog, SqliteAttemptRepository,
    SqliteDifficultyStateRepository, SqliteProfileRepository, SqliteQuestionRepository,
};
use pacer::domain::errors::DomainError;
use pacer::domain::models::{
    AdjustmentOutcome, AdjustmentReason, AnswerEvent, DifficultySource, LearningProfile,
    LearningStyle, PerformancePoint, Question, SessionConfig, Trend,
};
use pacer::domain::ports::{AdjustmentLog, DifficultyStateRepository};
use pacer::services::DifficultyService;

const LEARNER: &str = "bob";
const TOPIC: &str = "fractions";

struct Fixture {
    _dir: TempDir,
    states: Arc<SqliteDifficultyStateRepository>,
    attempts: Arc<SqliteAttemptRepository>,
    profiles: Arc<SqliteProfileRepository>,
    questions: Arc<SqliteQuestionRepository>,
    audit: Arc<SqliteAdjustmentLog>,
    service: DifficultyService,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("pacer.db").display());
        let pool = initialize_database(&url, 5).await.unwrap();

        let states = Arc::new(SqliteDifficultyStateRepository::new(pool.clone()));
        let attempts = Arc::new(SqliteAttemptRepository::new(pool.clone()));
        let profiles = Arc::new(SqliteProfileRepository::new(pool.clone()));
        let questions = Arc::new(SqliteQuestionRepository::new(pool.clone()));
        let audit = Arc::new(SqliteAdjustmentLog::new(pool));

        for (id, difficulty) in [("f-easy", 3.0), ("f-mid", 5.0), ("f-hard", 7.5)] {
            questions
                .insert_question(&Question::new(id, TOPIC, difficulty, "3/4"))
                .await
                .unwrap();
        }

        let service = DifficultyService::new(
            states.clone(),
            attempts.clone(),
            profiles.clone(),
            questions.clone(),
            audit.clone(),
        );

        Self {
            _dir: dir,
            states,
            attempts,
            profiles,
            questions,
            audit,
            service,
        }
    }

    /// Run the controller, then persist the graded attempt.
    async fn answer(&self, correct: bool, at: DateTime<Utc>) -> AdjustmentOutcome {
        let before = self.states.get(LEARNER, TOPIC).await.unwrap().unwrap();
        let submitted = if correct { "3/4" } else { "2/3" };
        let event = AnswerEvent::new(LEARNER, TOPIC, "f-mid", submitted)
            .with_response_time(4_000)
            .answered_at(at);
        let outcome = self.service.update_difficulty_after_answer(&event).await.unwrap();

        if let Some(success) = outcome.was_correct {
            self.attempts
                .record_attempt(
                    LEARNER,
                    TOPIC,
                    "f-mid",
                    &PerformancePoint {
                        difficulty_at_attempt: before.difficulty,
                        success,
                        response_time_ms: 4_000,
                        timestamp: at,
                        expected_success_probability: outcome.expected_performance.unwrap_or(0.5),
                    },
                )
                .await
                .unwrap();
        }
        outcome
    }

    async fn streak(&self, results: &[bool]) -> Vec<AdjustmentOutcome> {
        let start = Utc::now() - Duration::seconds(results.len() as i64 + 1);
        let mut outcomes = Vec::new();
        for (i, correct) in results.iter().enumerate() {
            outcomes.push(self.answer(*correct, start + Duration::seconds(i as i64)).await);
        }
        outcomes
    }
}

#[tokio::test]
async fn test_streak_persists_state_history_and_audit() {
    let fx = Fixture::new().await;
    let initial = fx.service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();
    assert_eq!(initial.version, 1);
    assert_eq!(initial.difficulty, 5.0);

    let outcomes = fx.streak(&[true; 6]).await;
    assert_eq!(outcomes[0].reason, AdjustmentReason::InsufficientData);
    assert_eq!(outcomes.last().unwrap().reason, AdjustmentReason::PerformanceAdjustment);

    let state = fx.states.get(LEARNER, TOPIC).await.unwrap().unwrap();
    assert_eq!(state.questions_attempted, 6);
    assert_eq!(state.version, 7);
    assert!(state.difficulty > 5.0);

    let entries = fx
        .audit
        .query(LEARNER, TOPIC, Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(entries.len(), 6);
    assert!((entries.last().unwrap().new_difficulty - state.difficulty).abs() < 1e-9);
}

#[tokio::test]
async fn test_override_round_trips_through_sqlite() {
    let fx = Fixture::new().await;
    fx.service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();

    fx.service
        .set_manual_difficulty_override(LEARNER, TOPIC, 7.5, "instructor request")
        .await
        .unwrap();

    let stored = fx.states.get(LEARNER, TOPIC).await.unwrap().unwrap();
    let active = stored.manual_override.as_ref().unwrap();
    assert_eq!(active.difficulty, 7.5);
    assert_eq!(active.reason, "instructor request");

    let outcome = fx.answer(false, Utc::now()).await;
    assert_eq!(outcome.reason, AdjustmentReason::ManualOverride);
    assert!(outcome.was_correct.is_none());

    let preview = fx
        .service
        .calculate_session_difficulty(LEARNER, &SessionConfig::for_topic(TOPIC))
        .await
        .unwrap();
    assert_eq!(preview.source, DifficultySource::ManualOverride);
    assert_eq!(
        fx.service.recommend_question_difficulty(LEARNER, TOPIC).await.unwrap(),
        Some(7.5)
    );

    let released = fx.service.remove_manual_override(LEARNER, TOPIC).await.unwrap();
    assert!(released.manual_override.is_none());
    let reloaded = fx.states.get(LEARNER, TOPIC).await.unwrap().unwrap();
    assert!(reloaded.manual_override.is_none());
    assert_eq!(reloaded.version, released.version);
}

#[tokio::test]
async fn test_profile_seeds_starting_difficulty() {
    let fx = Fixture::new().await;
    fx.profiles
        .upsert_profile(
            &LearningProfile::new(LEARNER, LearningStyle::Kinesthetic).with_affinity(TOPIC, 1.2),
        )
        .await
        .unwrap();

    let state = fx.service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();
    let untouched = fx.service.initialize_user_difficulty(LEARNER, "decimals").await.unwrap();

    assert!(state.difficulty > untouched.difficulty);
}

#[tokio::test]
async fn test_progression_and_recommendations_from_sqlite() {
    let fx = Fixture::new().await;
    fx.service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();
    fx.service.initialize_user_difficulty(LEARNER, "decimals").await.unwrap();
    fx.streak(&[true; 8]).await;

    let progression = fx
        .service
        .get_difficulty_progression(LEARNER, TOPIC, 30)
        .await
        .unwrap();
    assert_eq!(progression.points.len(), 8);
    assert_eq!(progression.trend, Trend::Improving);
    assert!(progression.net_change > 0.0);

    let recs = fx.service.get_optimal_session_recommendations(LEARNER).await.unwrap();
    let mut topics: Vec<&str> = recs.alternatives.iter().map(|r| r.topic_id.as_str()).collect();
    topics.extend(recs.priority_focus.as_ref().map(|r| r.topic_id.as_str()));
    topics.sort_unstable();
    assert_eq!(topics, vec!["decimals", TOPIC]);
}

#[tokio::test]
async fn test_question_selection_and_missing_state() {
    let fx = Fixture::new().await;

    let err = fx
        .service
        .recommend_question_difficulty(LEARNER, TOPIC)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::StateNotFound { .. }));

    fx.service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();
    assert_eq!(
        fx.service.recommend_question_difficulty(LEARNER, TOPIC).await.unwrap(),
        Some(5.0)
    );

    fx.questions
        .insert_question(&Question::new("f-mid", TOPIC, 9.0, "3/4"))
        .await
        .unwrap();
    let picked = fx
        .service
        .recommend_question_difficulty(LEARNER, TOPIC)
        .await
        .unwrap()
        .unwrap();
    assert!([3.0, 7.5].contains(&picked), "picked {picked}");
}
