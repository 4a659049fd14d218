//! SQLite adapters for every collaborator port.

pub mod adjustment_log_repository;
pub mod attempt_repository;
pub mod connection;
pub mod migrations;
pub mod profile_repository;
pub mod question_repository;
pub mod state_repository;

pub use adjustment_log_repository::SqliteAdjustmentLog;
pub use attempt_repository::SqliteAttemptRepository;
pub use connection::{create_pool, create_test_pool, ConnectionError, PoolConfig};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use profile_repository::SqliteProfileRepository;
pub use question_repository::SqliteQuestionRepository;
pub use state_repository::SqliteDifficultyStateRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};

/// Fixed-width RFC3339 so stored timestamps sort lexicographically.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::Serialization(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an optional RFC3339 datetime string from a SQLite row field.
pub fn parse_optional_datetime(s: Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_datetime).transpose()
}

/// Parse a JSON string from a SQLite row field, falling back to the type's default.
pub fn parse_json_or_default<T: serde::de::DeserializeOwned + Default>(s: Option<String>) -> DomainResult<T> {
    s.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| DomainError::Serialization(e.to_string()))
        .map(Option::unwrap_or_default)
}

/// Convert a stored counter back to its unsigned domain type.
pub fn parse_count(value: i64, column: &str) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::Serialization(format!("{column} out of range: {value}")))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open the database at `database_url` and bring its schema up to date.
pub async fn initialize_database(database_url: &str, max_connections: u32) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, Some(PoolConfig::with_max_connections(max_connections))).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_format_sorts_lexicographically() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let later = early + chrono::Duration::milliseconds(1);
        let (a, b) = (format_datetime(early), format_datetime(later));
        assert!(a < b);
        assert_eq!(a.len(), b.len());
        assert_eq!(parse_datetime(&a).unwrap(), early);
    }

    #[test]
    fn test_parse_count_rejects_negative() {
        assert_eq!(parse_count(7, "questions_attempted").unwrap(), 7);
        assert!(parse_count(-1, "questions_attempted").is_err());
    }
}
