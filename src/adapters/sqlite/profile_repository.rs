//! SQLite store of learning-style profiles.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;

use super::{format_datetime, parse_json_or_default};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::LearningProfile;
use crate::domain::ports::LearningProfileSource;

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a learner's profile.
    pub async fn upsert_profile(&self, profile: &LearningProfile) -> DomainResult<()> {
        let affinity_json = serde_json::to_string(&profile.topic_affinity)?;

        sqlx::query(
            r#"INSERT INTO learning_profiles (learner_id, style_key, topic_affinity, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(learner_id) DO UPDATE SET
                   style_key = excluded.style_key,
                   topic_affinity = excluded.topic_affinity,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&profile.learner_id)
        .bind(&profile.style_key)
        .bind(&affinity_json)
        .bind(format_datetime(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LearningProfileSource for SqliteProfileRepository {
    async fn get_profile(&self, learner_id: &str) -> DomainResult<Option<LearningProfile>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "SELECT learner_id, style_key, topic_affinity FROM learning_profiles WHERE learner_id = ?",
        )
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    learner_id: String,
    style_key: String,
    topic_affinity: Option<String>,
}

impl TryFrom<ProfileRow> for LearningProfile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let topic_affinity: HashMap<String, f64> = parse_json_or_default(row.topic_affinity)?;
        Ok(Self {
            learner_id: row.learner_id,
            style_key: row.style_key,
            topic_affinity,
        })
    }
}
