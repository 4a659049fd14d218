use crate::domain::models::{Config, DifficultyConfig};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use std::path::Path;
use thiserror::Error;

const PROJECT_CONFIG: &str = ".pacer/config.yaml";
const LOCAL_CONFIG: &str = ".pacer/local.yaml";
const ENV_PREFIX: &str = "PACER_";

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid max_retries: {0}. Must be at least 1")]
    InvalidMaxRetries(u32),

    #[error("Invalid backoff: initial ({0}ms) must be less than max ({1}ms)")]
    InvalidBackoff(u64, u64),

    #[error("Invalid timeout_ms: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid difficulty.{field}: {value}. {expected}")]
    InvalidDifficultySetting {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Configuration loader with hierarchical merging
///
/// Precedence, lowest to highest:
/// 1. Programmatic defaults
/// 2. `.pacer/config.yaml`
/// 3. `.pacer/local.yaml`
/// 4. `PACER_*` environment variables (`__` separates nested keys)
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources and validate it
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config).context("Configuration validation failed")?;

        Ok(config)
    }

    /// Load configuration from a single YAML file layered over the defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        Self::validate(&config).context("Configuration validation failed")?;

        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(PROJECT_CONFIG))
            .merge(Yaml::file(LOCAL_CONFIG))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration values
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.io.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(config.io.timeout_ms));
        }

        validate_difficulty(&config.difficulty)
    }
}

fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> ConfigError {
    ConfigError::InvalidDifficultySetting {
        field,
        value: value.to_string(),
        expected,
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn validate_difficulty(d: &DifficultyConfig) -> Result<(), ConfigError> {
    if !(d.target_success_rate.is_finite() && d.target_success_rate > 0.0 && d.target_success_rate < 1.0) {
        return Err(invalid(
            "target_success_rate",
            d.target_success_rate,
            "Must be strictly between 0 and 1",
        ));
    }

    if !(1.0..=10.0).contains(&d.default_difficulty) {
        return Err(invalid(
            "default_difficulty",
            d.default_difficulty,
            "Must be within 1..=10",
        ));
    }

    if !(0.0..=100.0).contains(&d.base_stability_score) {
        return Err(invalid(
            "base_stability_score",
            d.base_stability_score,
            "Must be within 0..=100",
        ));
    }

    if !is_positive(d.max_adjustment_magnitude) {
        return Err(invalid(
            "max_adjustment_magnitude",
            d.max_adjustment_magnitude,
            "Must be greater than 0",
        ));
    }

    if d.recent_performance_window_size == 0 {
        return Err(invalid(
            "recent_performance_window_size",
            d.recent_performance_window_size,
            "Must be at least 1",
        ));
    }

    if !(0.0..1.0).contains(&d.deviation_threshold) {
        return Err(invalid(
            "deviation_threshold",
            d.deviation_threshold,
            "Must be within 0..1",
        ));
    }

    if d.performance_analysis_window_days == 0 {
        return Err(invalid(
            "performance_analysis_window_days",
            d.performance_analysis_window_days,
            "Must be at least 1",
        ));
    }

    if !is_positive(d.stability_dampening_scale) {
        return Err(invalid(
            "stability_dampening_scale",
            d.stability_dampening_scale,
            "Must be greater than 0",
        ));
    }

    if !is_positive(d.retrievability_half_life_days) {
        return Err(invalid(
            "retrievability_half_life_days",
            d.retrievability_half_life_days,
            "Must be greater than 0",
        ));
    }

    for (field, value) in [
        ("min_fatigue_factor", d.min_fatigue_factor),
        ("late_hours_factor", d.late_hours_factor),
    ] {
        if !(is_positive(value) && value <= 1.0) {
            return Err(invalid(field, value, "Must be within (0, 1]"));
        }
    }

    if d.low_stability_band > d.high_stability_band {
        return Err(invalid(
            "low_stability_band",
            d.low_stability_band,
            "Must not exceed high_stability_band",
        ));
    }

    Ok(())
}
