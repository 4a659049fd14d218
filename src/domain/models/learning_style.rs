//! Learning-style bias supplied by the external learner-profiling collaborator.
//!
//! The collaborator hands over a style key and per-topic affinities; this module
//! maps them through one fixed table to the two scalars the engine consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::difficulty::{bounded, MAX_DIFFICULTY, MIN_DIFFICULTY};

pub const MIN_STYLE_FACTOR: f64 = 0.7;
pub const MAX_STYLE_FACTOR: f64 = 1.3;
pub const MIN_TOPIC_AFFINITY: f64 = 0.8;
pub const MAX_TOPIC_AFFINITY: f64 = 1.2;

/// Effective learning style reported by the profiling collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    Auditory,
    ReadWrite,
    Kinesthetic,
    Multimodal,
    /// Absent or unrecognised key; maps to neutral bias
    Unknown,
}

impl LearningStyle {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::ReadWrite => "read_write",
            Self::Kinesthetic => "kinesthetic",
            Self::Multimodal => "multimodal",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a collaborator key. Unrecognised keys become `Unknown`.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().replace(&['-', ' '][..], "_").as_str() {
            "visual" => Self::Visual,
            "auditory" | "aural" => Self::Auditory,
            "read_write" | "reading" | "readwrite" => Self::ReadWrite,
            "kinesthetic" => Self::Kinesthetic,
            "multimodal" | "mixed" => Self::Multimodal,
            _ => Self::Unknown,
        }
    }

    /// (learning-style factor, preferred starting difficulty)
    const fn table_entry(self) -> (f64, f64) {
        match self {
            Self::Visual => (1.10, 5.5),
            Self::Auditory => (0.95, 5.0),
            Self::ReadWrite => (1.05, 5.5),
            Self::Kinesthetic => (0.90, 4.5),
            Self::Multimodal | Self::Unknown => (1.0, 5.0),
        }
    }
}

impl std::fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw profile as returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProfile {
    pub learner_id: String,
    pub style_key: String,
    #[serde(default)]
    pub topic_affinity: HashMap<String, f64>,
}

impl LearningProfile {
    pub fn new(learner_id: impl Into<String>, style: LearningStyle) -> Self {
        Self {
            learner_id: learner_id.into(),
            style_key: style.as_str().to_string(),
            topic_affinity: HashMap::new(),
        }
    }

    pub fn with_affinity(mut self, topic_id: impl Into<String>, affinity: f64) -> Self {
        self.topic_affinity.insert(topic_id.into(), affinity);
        self
    }

    pub fn style(&self) -> LearningStyle {
        LearningStyle::from_key(&self.style_key)
    }

    /// Resolve the engine scalars for one topic.
    pub fn bias_for(&self, topic_id: &str) -> StyleBias {
        let (factor, start) = self.style().table_entry();
        let affinity = self.topic_affinity.get(topic_id).copied().unwrap_or(1.0);
        StyleBias::new(factor, affinity, start)
    }
}

/// Scalars the engine consumes from a learner profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleBias {
    pub learning_style_factor: f64,
    pub topic_affinity: f64,
    pub preferred_starting_difficulty: f64,
}

impl StyleBias {
    pub fn new(learning_style_factor: f64, topic_affinity: f64, preferred_starting_difficulty: f64) -> Self {
        Self {
            learning_style_factor: bounded(learning_style_factor, MIN_STYLE_FACTOR, MAX_STYLE_FACTOR, 1.0),
            topic_affinity: bounded(topic_affinity, MIN_TOPIC_AFFINITY, MAX_TOPIC_AFFINITY, 1.0),
            preferred_starting_difficulty: bounded(
                preferred_starting_difficulty,
                MIN_DIFFICULTY,
                MAX_DIFFICULTY,
                5.0,
            ),
        }
    }

    /// Bias used when no profile exists.
    pub const fn neutral() -> Self {
        Self {
            learning_style_factor: 1.0,
            topic_affinity: 1.0,
            preferred_starting_difficulty: 5.0,
        }
    }
}

impl Default for StyleBias {
    fn default() -> Self {
        Self::neutral()
    }
}
