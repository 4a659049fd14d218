//! Wiring of the SQLite adapters into the service for one CLI invocation.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::adapters::sqlite::{
    initialize_database, SqliteAdjustmentLog, SqliteAttemptRepository,
    SqliteDifficultyStateRepository, SqliteProfileRepository, SqliteQuestionRepository,
};
use crate::domain::models::Config;
use crate::services::DifficultyService;

pub struct CliContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub states: Arc<SqliteDifficultyStateRepository>,
    pub attempts: Arc<SqliteAttemptRepository>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub questions: Arc<SqliteQuestionRepository>,
    pub service: DifficultyService,
}

impl CliContext {
    /// Open (and migrate) the configured database and build the service over it.
    pub async fn open(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database.url(), config.database.max_connections)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}. Run 'pacer init' first.",
                    config.database.path
                )
            })?;

        let states = Arc::new(SqliteDifficultyStateRepository::new(pool.clone()));
        let attempts = Arc::new(SqliteAttemptRepository::new(pool.clone()));
        let profiles = Arc::new(SqliteProfileRepository::new(pool.clone()));
        let questions = Arc::new(SqliteQuestionRepository::new(pool.clone()));
        let audit = Arc::new(SqliteAdjustmentLog::new(pool.clone()));

        let service = DifficultyService::new(
            states.clone(),
            attempts.clone(),
            profiles.clone(),
            questions.clone(),
            audit,
        )
        .with_config(&config);

        Ok(Self {
            config,
            pool,
            states,
            attempts,
            profiles,
            questions,
            service,
        })
    }
}
