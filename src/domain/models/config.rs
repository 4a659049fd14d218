use serde::{Deserialize, Serialize};

/// Main configuration structure for Pacer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Retry policy for transient persistence failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-call I/O budgets
    #[serde(default)]
    pub io: IoConfig,

    /// Controller tunables
    #[serde(default)]
    pub difficulty: DifficultyConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".pacer/pacer.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling JSON log files; stdout/stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    50
}

const fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// I/O budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IoConfig {
    /// Timeout applied to each collaborator call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Re-read/recompute attempts after an optimistic-concurrency conflict
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

const fn default_timeout_ms() -> u64 {
    2_000
}

const fn default_max_conflict_retries() -> u32 {
    5
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

/// Tunables of the difficulty engine and orchestration service.
///
/// Every numeric coefficient used by the controller lives here so tuning and
/// property tests can vary them without touching algorithm code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DifficultyConfig {
    pub recent_performance_window_size: usize,
    pub min_questions_for_adjustment: usize,
    /// Minimum |window success rate - target| before the gate lets an adjustment through
    pub deviation_threshold: f64,
    pub performance_analysis_window_days: u32,
    pub max_adjustment_magnitude: f64,
    pub default_difficulty: f64,
    pub target_success_rate: f64,
    pub base_stability_score: f64,
    pub initial_confidence: f64,
    pub initial_confidence_interval: f64,
    pub learning_style_influence: f64,
    pub topic_affinity_influence: f64,

    /// Scale of the base adjustment before data-confidence and stability damping
    pub adjustment_strength: f64,
    /// Stability at which the damping modifier halves
    pub stability_dampening_scale: f64,

    pub consistency_variance_threshold: f64,
    pub high_variance_threshold: f64,
    pub consistency_bonus: f64,
    pub moderate_variance_penalty: f64,
    pub high_variance_penalty: f64,
    pub swing_threshold: f64,
    pub swing_penalty: f64,

    /// Steepness of the success-probability sigmoid around difficulty 5
    pub difficulty_slope: f64,
    /// Mean-difficulty shift between early and late halves that counts as a trend
    pub trend_threshold: f64,
    pub retrievability_half_life_days: f64,

    pub low_stability_band: f64,
    pub high_stability_band: f64,
    pub short_session_questions: u32,
    pub standard_session_questions: u32,
    pub long_session_questions: u32,
    /// Idle gap after which an answer starts a new session
    pub session_gap_minutes: i64,

    /// Answers into a session after which evidence is damped; 0 disables
    pub fatigue_onset_questions: u32,
    /// Lowest fatigue damping factor, reached at twice the onset
    pub min_fatigue_factor: f64,
    /// Damping applied to answers given between midnight and 6am local time
    pub late_hours_factor: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            recent_performance_window_size: 20,
            min_questions_for_adjustment: 3,
            deviation_threshold: 0.10,
            performance_analysis_window_days: 7,
            max_adjustment_magnitude: 2.0,
            default_difficulty: 5.0,
            target_success_rate: 0.75,
            base_stability_score: 50.0,
            initial_confidence: 30.0,
            initial_confidence_interval: 2.0,
            learning_style_influence: 0.3,
            topic_affinity_influence: 0.2,
            adjustment_strength: 3.0,
            stability_dampening_scale: 50.0,
            consistency_variance_threshold: 0.10,
            high_variance_threshold: 0.15,
            consistency_bonus: 2.0,
            moderate_variance_penalty: 10.0,
            high_variance_penalty: 25.0,
            swing_threshold: 0.1,
            swing_penalty: 5.0,
            difficulty_slope: 0.8,
            trend_threshold: 0.25,
            retrievability_half_life_days: 14.0,
            low_stability_band: 40.0,
            high_stability_band: 70.0,
            short_session_questions: 10,
            standard_session_questions: 15,
            long_session_questions: 20,
            session_gap_minutes: 30,
            fatigue_onset_questions: 25,
            min_fatigue_factor: 0.5,
            late_hours_factor: 0.85,
        }
    }
}
