//! Read-side analytics types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::adjustment::AdjustmentReason;

/// Direction of a learner's difficulty over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit entry projected onto the progression series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionPoint {
    pub timestamp: DateTime<Utc>,
    pub previous_difficulty: f64,
    pub difficulty: f64,
    pub reason: AdjustmentReason,
    pub adjustment_magnitude: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProgression {
    pub learner_id: String,
    pub topic_id: String,
    pub window_days: u32,
    /// Oldest first
    pub points: Vec<ProgressionPoint>,
    pub trend: Trend,
    pub starting_difficulty: Option<f64>,
    pub current_difficulty: Option<f64>,
    pub net_change: f64,
    pub algorithmic_adjustments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRecommendation {
    pub topic_id: String,
    pub difficulty: f64,
    pub stability: f64,
    pub confidence: f64,
    pub suggested_session_length: u32,
    pub override_active: bool,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecommendations {
    pub learner_id: String,
    /// Least stable topic; `None` when the learner has no state yet
    pub priority_focus: Option<TopicRecommendation>,
    pub suggested_session_length: u32,
    /// Remaining topics, least stable first
    pub alternatives: Vec<TopicRecommendation>,
}
