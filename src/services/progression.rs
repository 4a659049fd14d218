//! Helpers for the read-side analytics: trend classification and session sizing.

use crate::domain::models::{AdjustmentReason, DifficultyConfig, ProgressionPoint, Trend};

/// Classify the series by comparing the mean difficulty of its early and late halves.
///
/// Manual override entries are skipped, since they report the pinned value
/// rather than the learner's own difficulty. Fewer than two remaining points is
/// always `Stable`. With an odd count the middle point belongs to the late half.
pub fn classify_trend(points: &[ProgressionPoint], threshold: f64) -> Trend {
    let difficulties: Vec<f64> = points
        .iter()
        .filter(|p| p.reason != AdjustmentReason::ManualOverride)
        .map(|p| p.difficulty)
        .collect();
    if difficulties.len() < 2 {
        return Trend::Stable;
    }

    let (early, late) = difficulties.split_at(difficulties.len() / 2);
    let shift = mean(late) - mean(early);

    if shift > threshold {
        Trend::Improving
    } else if shift < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Suggested questions per session for a topic at the given stability.
pub fn session_length_for_stability(stability: f64, config: &DifficultyConfig) -> u32 {
    if stability < config.low_stability_band {
        config.short_session_questions
    } else if stability < config.high_stability_band {
        config.standard_session_questions
    } else {
        config.long_session_questions
    }
}
