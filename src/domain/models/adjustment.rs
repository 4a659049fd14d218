//! Append-only audit records of difficulty decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::difficulty::DifficultyState;

pub const ALGORITHM_VERSION: &str = "pacer-1.0";

/// Why a decision was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// The engine moved (or held) difficulty based on recent performance
    PerformanceAdjustment,
    /// The hysteresis gate saw performance close enough to target
    WithinTargetRange,
    /// Too few data points to move
    InsufficientData,
    /// An override was set or removed, or bypassed the algorithm
    ManualOverride,
}

impl AdjustmentReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerformanceAdjustment => "performance_adjustment",
            Self::WithinTargetRange => "within_target_range",
            Self::InsufficientData => "insufficient_data",
            Self::ManualOverride => "manual_override",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "performance_adjustment" => Some(Self::PerformanceAdjustment),
            "within_target_range" => Some(Self::WithinTargetRange),
            "insufficient_data" => Some(Self::InsufficientData),
            "manual_override" => Some(Self::ManualOverride),
            _ => None,
        }
    }

    /// Whether the decision came out of the algorithm rather than a gate or an operator.
    pub const fn is_algorithmic(&self) -> bool {
        matches!(self, Self::PerformanceAdjustment)
    }
}

impl std::fmt::Display for AdjustmentReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit row; the only source for progression analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentLogEntry {
    pub id: Uuid,
    pub learner_id: String,
    pub topic_id: String,
    pub previous_difficulty: f64,
    pub new_difficulty: f64,
    pub reason: AdjustmentReason,
    pub trigger_success_rate: f64,
    pub algorithm_confidence: f64,
    pub stability_factor: f64,
    pub learning_style_influence: f64,
    pub data_points: u32,
    pub adjustment_magnitude: f64,
    pub algorithm_version: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AdjustmentLogEntry {
    /// Start an entry describing a no-change decision about `state`.
    pub fn for_state(state: &DifficultyState, reason: AdjustmentReason) -> Self {
        let current = state.effective_difficulty();
        Self {
            id: Uuid::new_v4(),
            learner_id: state.learner_id.clone(),
            topic_id: state.topic_id.clone(),
            previous_difficulty: current,
            new_difficulty: current,
            reason,
            trigger_success_rate: state.current_success_rate,
            algorithm_confidence: state.confidence,
            stability_factor: state.stability,
            learning_style_influence: 1.0,
            data_points: 0,
            adjustment_magnitude: 0.0,
            algorithm_version: ALGORITHM_VERSION.to_string(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_change(mut self, previous: f64, new: f64) -> Self {
        self.previous_difficulty = previous;
        self.new_difficulty = new;
        self.adjustment_magnitude = (new - previous).abs();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
