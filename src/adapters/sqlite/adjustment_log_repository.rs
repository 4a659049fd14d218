//! SQLite append-only adjustment log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, parse_count, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AdjustmentLogEntry, AdjustmentReason};
use crate::domain::ports::AdjustmentLog;

#[derive(Clone)]
pub struct SqliteAdjustmentLog {
    pool: SqlitePool,
}

impl SqliteAdjustmentLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdjustmentLog for SqliteAdjustmentLog {
    async fn append(&self, entry: &AdjustmentLogEntry) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO difficulty_adjustments (id, learner_id, topic_id, previous_difficulty, new_difficulty,
               reason, trigger_success_rate, algorithm_confidence, stability_factor, learning_style_influence,
               data_points, adjustment_magnitude, algorithm_version, notes, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.learner_id)
        .bind(&entry.topic_id)
        .bind(entry.previous_difficulty)
        .bind(entry.new_difficulty)
        .bind(entry.reason.as_str())
        .bind(entry.trigger_success_rate)
        .bind(entry.algorithm_confidence)
        .bind(entry.stability_factor)
        .bind(entry.learning_style_influence)
        .bind(i64::from(entry.data_points))
        .bind(entry.adjustment_magnitude)
        .bind(&entry.algorithm_version)
        .bind(&entry.notes)
        .bind(format_datetime(entry.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(
        &self,
        learner_id: &str,
        topic_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<AdjustmentLogEntry>> {
        let rows: Vec<AdjustmentRow> = sqlx::query_as(
            r#"SELECT id, learner_id, topic_id, previous_difficulty, new_difficulty, reason,
               trigger_success_rate, algorithm_confidence, stability_factor, learning_style_influence,
               data_points, adjustment_magnitude, algorithm_version, notes, created_at
               FROM difficulty_adjustments
               WHERE learner_id = ? AND topic_id = ? AND created_at >= ?
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(learner_id)
        .bind(topic_id)
        .bind(format_datetime(since))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct AdjustmentRow {
    id: String,
    learner_id: String,
    topic_id: String,
    previous_difficulty: f64,
    new_difficulty: f64,
    reason: String,
    trigger_success_rate: f64,
    algorithm_confidence: f64,
    stability_factor: f64,
    learning_style_influence: f64,
    data_points: i64,
    adjustment_magnitude: f64,
    algorithm_version: String,
    notes: Option<String>,
    created_at: String,
}

impl TryFrom<AdjustmentRow> for AdjustmentLogEntry {
    type Error = DomainError;

    fn try_from(row: AdjustmentRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id).map_err(|e| DomainError::Serialization(e.to_string()))?;
        let reason = AdjustmentReason::parse_str(&row.reason)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid reason: {}", row.reason)))?;

        Ok(Self {
            id,
            reason,
            data_points: parse_count(row.data_points, "data_points")?,
            created_at: parse_datetime(&row.created_at)?,
            learner_id: row.learner_id,
            topic_id: row.topic_id,
            previous_difficulty: row.previous_difficulty,
            new_difficulty: row.new_difficulty,
            trigger_success_rate: row.trigger_success_rate,
            algorithm_confidence: row.algorithm_confidence,
            stability_factor: row.stability_factor,
            learning_style_influence: row.learning_style_influence,
            adjustment_magnitude: row.adjustment_magnitude,
            algorithm_version: row.algorithm_version,
            notes: row.notes,
        })
    }
}
