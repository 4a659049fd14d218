//! SQLite question-attempt history, the PerformanceHistory source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::PerformancePoint;
use crate::domain::ports::PerformanceHistory;

#[derive(Clone)]
pub struct SqliteAttemptRepository {
    pool: SqlitePool,
}

impl SqliteAttemptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one graded attempt.
    pub async fn record_attempt(
        &self,
        learner_id: &str,
        topic_id: &str,
        question_id: &str,
        point: &PerformancePoint,
    ) -> DomainResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO question_attempts (id, learner_id, topic_id, question_id, difficulty_at_attempt,
               success, response_time_ms, expected_success_probability, attempted_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(learner_id)
        .bind(topic_id)
        .bind(question_id)
        .bind(point.difficulty_at_attempt)
        .bind(point.success)
        .bind(i64::try_from(point.response_time_ms).unwrap_or(i64::MAX))
        .bind(point.expected_success_probability)
        .bind(format_datetime(point.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl PerformanceHistory for SqliteAttemptRepository {
    async fn query(
        &self,
        learner_id: &str,
        topic_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<PerformancePoint>> {
        let rows: Vec<AttemptRow> = sqlx::query_as(
            r#"SELECT difficulty_at_attempt, success, response_time_ms, expected_success_probability, attempted_at
               FROM question_attempts
               WHERE learner_id = ? AND topic_id = ? AND attempted_at >= ?
               ORDER BY attempted_at DESC
               LIMIT ?"#,
        )
        .bind(learner_id)
        .bind(topic_id)
        .bind(format_datetime(since))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    difficulty_at_attempt: f64,
    success: bool,
    response_time_ms: i64,
    expected_success_probability: f64,
    attempted_at: String,
}

impl TryFrom<AttemptRow> for PerformancePoint {
    type Error = DomainError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            difficulty_at_attempt: row.difficulty_at_attempt,
            success: row.success,
            response_time_ms: u64::try_from(row.response_time_ms).unwrap_or_default(),
            timestamp: parse_datetime(&row.attempted_at)?,
            expected_success_probability: row.expected_success_probability,
        })
    }
}
