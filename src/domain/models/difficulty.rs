//! Difficulty state and the value types exchanged with the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;
pub const MIN_STABILITY: f64 = 0.0;
pub const MAX_STABILITY: f64 = 100.0;
pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 100.0;
pub const MIN_CONFIDENCE_INTERVAL: f64 = 0.5;
pub const MAX_CONFIDENCE_INTERVAL: f64 = 3.0;

/// Clamp `value` into `[min, max]`, substituting `fallback` for NaN or infinities.
pub fn bounded(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback.clamp(min, max)
    }
}

/// A fixed difficulty that suspends algorithmic control until removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub difficulty: f64,
    pub reason: String,
    pub set_at: DateTime<Utc>,
}

/// Per learner × topic controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub learner_id: String,
    pub topic_id: String,

    /// Algorithmic difficulty in [1, 10]; untouched while an override is active
    pub difficulty: f64,

    /// Calibration stability in [0, 100]; dampens future swings
    pub stability: f64,

    /// Algorithmic confidence in [0, 100]
    pub confidence: f64,

    /// Half-width of the question-selection band, at least 0.5
    pub confidence_interval: f64,

    pub target_success_rate: f64,
    pub current_success_rate: f64,

    pub sessions_analyzed: u32,
    pub questions_attempted: u32,

    pub manual_override: Option<ManualOverride>,
    pub last_session_at: Option<DateTime<Utc>>,

    /// Optimistic-concurrency token; 0 means never persisted
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DifficultyState {
    pub fn new(learner_id: impl Into<String>, topic_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            learner_id: learner_id.into(),
            topic_id: topic_id.into(),
            difficulty: 5.0,
            stability: 50.0,
            confidence: 30.0,
            confidence_interval: 2.0,
            target_success_rate: 0.75,
            current_success_rate: 0.0,
            sessions_analyzed: 0,
            questions_attempted: 0,
            manual_override: None,
            last_session_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Difficulty questions should currently be served at.
    pub fn effective_difficulty(&self) -> f64 {
        self.manual_override
            .as_ref()
            .map_or(self.difficulty, |o| o.difficulty)
    }

    pub const fn has_override(&self) -> bool {
        self.manual_override.is_some()
    }

    /// Force every bounded field back into its domain.
    pub fn clamp_bounds(&mut self) {
        self.difficulty = bounded(self.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY, 5.0);
        self.stability = bounded(self.stability, MIN_STABILITY, MAX_STABILITY, 50.0);
        self.confidence = bounded(self.confidence, MIN_CONFIDENCE, MAX_CONFIDENCE, 30.0);
        self.confidence_interval = bounded(
            self.confidence_interval,
            MIN_CONFIDENCE_INTERVAL,
            MAX_CONFIDENCE_INTERVAL,
            2.0,
        );
        self.target_success_rate = bounded(self.target_success_rate, 0.0, 1.0, 0.75);
        self.current_success_rate = bounded(self.current_success_rate, 0.0, 1.0, 0.0);
        if let Some(o) = self.manual_override.as_mut() {
            o.difficulty = bounded(o.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY, 5.0);
        }
    }

    /// Entity key used in logs and conflict errors.
    pub fn key(&self) -> String {
        format!("{}/{}", self.learner_id, self.topic_id)
    }
}

/// One graded attempt from the learner's recent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub difficulty_at_attempt: f64,
    pub success: bool,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub expected_success_probability: f64,
}

/// The slice of state the engine reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub difficulty: f64,
    pub stability: f64,
    pub confidence: f64,
    /// Reference rate the recent window is compared against (the learner's target)
    pub success_rate: f64,
    pub retrievability: f64,
}

impl StateSnapshot {
    pub fn from_state(state: &DifficultyState, retrievability: f64) -> Self {
        Self {
            difficulty: state.difficulty,
            stability: state.stability,
            confidence: state.confidence,
            success_rate: state.target_success_rate,
            retrievability,
        }
    }
}

/// Everything the engine needs for one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyContext {
    pub current_state: StateSnapshot,
    /// Most-recent-first, bounded window
    pub recent_performance: Vec<PerformancePoint>,
    pub learning_style_factor: f64,
    pub topic_affinity: f64,
    /// Questions answered so far in the current session
    pub session_length: u32,
    /// Local hour of day, 0-23
    pub time_of_day: u8,
}

/// Result of one engine computation. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCalculation {
    pub next_difficulty: f64,
    pub confidence_score: f64,
    pub stability_update: f64,
    pub reasoning: String,
    pub adjustment_magnitude: f64,
    pub expected_performance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_replaces_non_finite() {
        assert_eq!(bounded(f64::NAN, 1.0, 10.0, 5.0), 5.0);
        assert_eq!(bounded(f64::INFINITY, 1.0, 10.0, 5.0), 5.0);
        assert_eq!(bounded(12.0, 1.0, 10.0, 5.0), 10.0);
        assert_eq!(bounded(-3.0, 1.0, 10.0, 5.0), 1.0);
    }

    #[test]
    fn test_effective_difficulty_prefers_override() {
        let mut state = DifficultyState::new("alice", "algebra");
        state.difficulty = 4.2;
        assert_eq!(state.effective_difficulty(), 4.2);

        state.manual_override = Some(ManualOverride {
            difficulty: 8.0,
            reason: "exam prep".to_string(),
            set_at: Utc::now(),
        });
        assert_eq!(state.effective_difficulty(), 8.0);
        assert_eq!(state.difficulty, 4.2);
    }

    #[test]
    fn test_clamp_bounds() {
        let mut state = DifficultyState::new("alice", "algebra");
        state.difficulty = 14.0;
        state.stability = -5.0;
        state.confidence = f64::NAN;
        state.confidence_interval = 0.1;
        state.current_success_rate = 1.4;

        state.clamp_bounds();

        assert_eq!(state.difficulty, MAX_DIFFICULTY);
        assert_eq!(state.stability, MIN_STABILITY);
        assert_eq!(state.confidence, 30.0);
        assert_eq!(state.confidence_interval, MIN_CONFIDENCE_INTERVAL);
        assert_eq!(state.current_success_rate, 1.0);
    }
}
