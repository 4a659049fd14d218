//! Concurrent answers on one learner × topic must never lose an update.

mod common;

use chrono::{Duration, Utc};
use std::sync::Arc;

use common::{Harness, LEARNER, QUESTION, RIGHT, TOPIC};
use pacer::adapters::sqlite::{
    initialize_database, SqliteAdjustmentLog, SqliteAttemptRepository,
    SqliteDifficultyStateRepository, SqliteProfileRepository, SqliteQuestionRepository,
};
use pacer::domain::models::{AnswerEvent, Config, Question};
use pacer::domain::ports::DifficultyStateRepository;
use pacer::services::DifficultyService;

const ANSWERS: usize = 32;

fn contention_config() -> Config {
    let mut config = Config::default();
    config.io.max_conflict_retries = 1_000;
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_answers_all_counted_in_memory() {
    let h = Arc::new(Harness::with_config(&contention_config()).await);
    h.service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();
    let start = Utc::now() - Duration::minutes(1);

    let handles: Vec<_> = (0..ANSWERS)
        .map(|i| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                let event = AnswerEvent::new(LEARNER, TOPIC, QUESTION, RIGHT)
                    .answered_at(start + Duration::milliseconds(i as i64));
                h.service.update_difficulty_after_answer(&event).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = h.states.get(LEARNER, TOPIC).await.unwrap().unwrap();
    assert_eq!(state.questions_attempted as usize, ANSWERS);
    assert_eq!(state.version as usize, ANSWERS + 1);
    assert_eq!(h.audit.entries().await.len(), ANSWERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_pairs_do_not_interfere() {
    let h = Arc::new(Harness::with_config(&contention_config()).await);
    let topics = ["t0", "t1", "t2", "t3"];
    for topic in topics {
        h.service.initialize_user_difficulty(LEARNER, topic).await.unwrap();
        h.questions.insert(Question::new(format!("q-{topic}"), topic, 5.0, RIGHT)).await;
    }

    let handles: Vec<_> = (0..ANSWERS)
        .map(|i| {
            let h = Arc::clone(&h);
            let topic = topics[i % topics.len()];
            tokio::spawn(async move {
                let event = AnswerEvent::new(LEARNER, topic, format!("q-{topic}"), RIGHT);
                h.service.update_difficulty_after_answer(&event).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for topic in topics {
        let state = h.states.get(LEARNER, topic).await.unwrap().unwrap();
        assert_eq!(state.questions_attempted as usize, ANSWERS / topics.len());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_answers_all_counted_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("pacer.db").display());
    let pool = initialize_database(&url, 5).await.unwrap();

    let states = Arc::new(SqliteDifficultyStateRepository::new(pool.clone()));
    let questions = Arc::new(SqliteQuestionRepository::new(pool.clone()));
    questions
        .insert_question(&Question::new(QUESTION, TOPIC, 5.0, RIGHT))
        .await
        .unwrap();

    let service = Arc::new(
        DifficultyService::new(
            states.clone(),
            Arc::new(SqliteAttemptRepository::new(pool.clone())),
            Arc::new(SqliteProfileRepository::new(pool.clone())),
            questions,
            Arc::new(SqliteAdjustmentLog::new(pool.clone())),
        )
        .with_config(&contention_config()),
    );
    service.initialize_user_difficulty(LEARNER, TOPIC).await.unwrap();

    let answers = 16;
    let handles: Vec<_> = (0..answers)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let event = AnswerEvent::new(LEARNER, TOPIC, QUESTION, RIGHT);
                service.update_difficulty_after_answer(&event).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = states.get(LEARNER, TOPIC).await.unwrap().unwrap();
    assert_eq!(state.questions_attempted, answers);
    assert_eq!(state.version, i64::from(answers) + 1);
}
