//! SQLite implementation of the DifficultyStateRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{format_datetime, parse_count, parse_datetime, parse_optional_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DifficultyState, ManualOverride};
use crate::domain::ports::DifficultyStateRepository;

const STATE_COLUMNS: &str = "learner_id, topic_id, difficulty, stability, confidence, confidence_interval, \
    target_success_rate, current_success_rate, sessions_analyzed, questions_attempted, \
    override_difficulty, override_reason, override_set_at, last_session_at, version, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteDifficultyStateRepository {
    pool: SqlitePool,
}

impl SqliteDifficultyStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert `state` as version 1. `ON CONFLICT` decides what an existing row means.
    async fn insert(&self, state: &DifficultyState, on_conflict: &str) -> Result<u64, sqlx::Error> {
        let sql = format!(
            "INSERT INTO difficulty_states ({STATE_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?) {on_conflict}"
        );
        let override_ = state.manual_override.as_ref();

        let result = sqlx::query(&sql)
            .bind(&state.learner_id)
            .bind(&state.topic_id)
            .bind(state.difficulty)
            .bind(state.stability)
            .bind(state.confidence)
            .bind(state.confidence_interval)
            .bind(state.target_success_rate)
            .bind(state.current_success_rate)
            .bind(i64::from(state.sessions_analyzed))
            .bind(i64::from(state.questions_attempted))
            .bind(override_.map(|o| o.difficulty))
            .bind(override_.map(|o| o.reason.clone()))
            .bind(override_.map(|o| format_datetime(o.set_at)))
            .bind(state.last_session_at.map(format_datetime))
            .bind(format_datetime(state.created_at))
            .bind(format_datetime(state.updated_at))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DifficultyStateRepository for SqliteDifficultyStateRepository {
    async fn get(&self, learner_id: &str, topic_id: &str) -> DomainResult<Option<DifficultyState>> {
        let sql = format!("SELECT {STATE_COLUMNS} FROM difficulty_states WHERE learner_id = ? AND topic_id = ?");
        let row: Option<StateRow> = sqlx::query_as(&sql)
            .bind(learner_id)
            .bind(topic_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, state: &DifficultyState) -> DomainResult<DifficultyState> {
        self.insert(state, "ON CONFLICT(learner_id, topic_id) DO NOTHING").await?;

        self.get(&state.learner_id, &state.topic_id)
            .await?
            .ok_or_else(|| DomainError::Persistence(format!("state {} vanished after insert", state.key())))
    }

    async fn upsert(&self, state: &DifficultyState) -> DomainResult<DifficultyState> {
        if state.version == 0 {
            return match self.insert(state, "").await {
                Ok(_) => Ok(DifficultyState { version: 1, ..state.clone() }),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    Err(DomainError::state_conflict(&state.learner_id, &state.topic_id))
                }
                Err(e) => Err(e.into()),
            };
        }

        let override_ = state.manual_override.as_ref();
        let result = sqlx::query(
            r#"UPDATE difficulty_states SET difficulty = ?, stability = ?, confidence = ?,
               confidence_interval = ?, target_success_rate = ?, current_success_rate = ?,
               sessions_analyzed = ?, questions_attempted = ?, override_difficulty = ?,
               override_reason = ?, override_set_at = ?, last_session_at = ?,
               version = version + 1, updated_at = ?
               WHERE learner_id = ? AND topic_id = ? AND version = ?"#,
        )
        .bind(state.difficulty)
        .bind(state.stability)
        .bind(state.confidence)
        .bind(state.confidence_interval)
        .bind(state.target_success_rate)
        .bind(state.current_success_rate)
        .bind(i64::from(state.sessions_analyzed))
        .bind(i64::from(state.questions_attempted))
        .bind(override_.map(|o| o.difficulty))
        .bind(override_.map(|o| o.reason.clone()))
        .bind(override_.map(|o| format_datetime(o.set_at)))
        .bind(state.last_session_at.map(format_datetime))
        .bind(format_datetime(state.updated_at))
        .bind(&state.learner_id)
        .bind(&state.topic_id)
        .bind(state.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::state_conflict(&state.learner_id, &state.topic_id));
        }

        Ok(DifficultyState {
            version: state.version + 1,
            ..state.clone()
        })
    }

    async fn list_by_learner(&self, learner_id: &str) -> DomainResult<Vec<DifficultyState>> {
        let sql = format!("SELECT {STATE_COLUMNS} FROM difficulty_states WHERE learner_id = ? ORDER BY topic_id");
        let rows: Vec<StateRow> = sqlx::query_as(&sql)
            .bind(learner_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct StateRow {
    learner_id: String,
    topic_id: String,
    difficulty: f64,
    stability: f64,
    confidence: f64,
    confidence_interval: f64,
    target_success_rate: f64,
    current_success_rate: f64,
    sessions_analyzed: i64,
    questions_attempted: i64,
    override_difficulty: Option<f64>,
    override_reason: Option<String>,
    override_set_at: Option<String>,
    last_session_at: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<StateRow> for DifficultyState {
    type Error = DomainError;

    fn try_from(row: StateRow) -> Result<Self, Self::Error> {
        let manual_override = match (row.override_difficulty, parse_optional_datetime(row.override_set_at)?) {
            (Some(difficulty), Some(set_at)) => Some(ManualOverride {
                difficulty,
                reason: row.override_reason.unwrap_or_default(),
                set_at,
            }),
            (Some(_), None) => {
                return Err(DomainError::Serialization(format!(
                    "override without timestamp for {}/{}",
                    row.learner_id, row.topic_id
                )))
            }
            _ => None,
        };

        Ok(Self {
            sessions_analyzed: parse_count(row.sessions_analyzed, "sessions_analyzed")?,
            questions_attempted: parse_count(row.questions_attempted, "questions_attempted")?,
            last_session_at: parse_optional_datetime(row.last_session_at)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            learner_id: row.learner_id,
            topic_id: row.topic_id,
            difficulty: row.difficulty,
            stability: row.stability,
            confidence: row.confidence,
            confidence_interval: row.confidence_interval,
            target_success_rate: row.target_success_rate,
            current_success_rate: row.current_success_rate,
            manual_override,
            version: row.version,
        })
    }
}
