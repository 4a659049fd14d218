//! Pure difficulty computation.
//!
//! Given a snapshot of a learner's state, a recent-performance window and the
//! two learning-style scalars, the engine proposes the next difficulty along
//! with updated stability, a confidence score, a rationale and a predicted
//! success probability. It owns no storage and every method is deterministic,
//! so it can be shared freely across tasks.
//!
//! Degenerate inputs (empty windows, NaN or out-of-range fields) are absorbed
//! by clamping to documented neutral defaults rather than reported as errors.

use chrono::{DateTime, Utc};

use crate::domain::models::learning_style::{
    MAX_STYLE_FACTOR, MAX_TOPIC_AFFINITY, MIN_STYLE_FACTOR, MIN_TOPIC_AFFINITY,
};
use crate::domain::models::{
    bounded, DifficultyCalculation, DifficultyConfig, DifficultyContext, DifficultyState,
    PerformancePoint, StateSnapshot, StyleBias, MAX_CONFIDENCE_INTERVAL, MAX_DIFFICULTY,
    MAX_STABILITY, MIN_CONFIDENCE_INTERVAL, MIN_DIFFICULTY, MIN_STABILITY,
};

/// Success rate assumed when the window is empty.
pub const NEUTRAL_SUCCESS_RATE: f64 = 0.5;

/// Window size at which the base adjustment reaches full strength.
const FULL_STRENGTH_DATA_POINTS: f64 = 10.0;

/// Window size at which the data-quantity share of confidence saturates.
const FULL_QUANTITY_DATA_POINTS: f64 = 20.0;

const MIN_CONFIDENCE_SCORE: f64 = 20.0;
const MAX_CONFIDENCE_SCORE: f64 = 100.0;
const MIN_EXPECTED_PERFORMANCE: f64 = 0.1;
const MAX_EXPECTED_PERFORMANCE: f64 = 0.95;
const MIN_STABILITY_MODIFIER: f64 = 0.1;
const MIN_DATA_RELIABILITY: f64 = 0.1;

/// Pivot of the success-probability sigmoid.
const SIGMOID_PIVOT_DIFFICULTY: f64 = 5.0;

/// Largest possible variance of a success/failure sequence.
const MAX_BOOLEAN_VARIANCE: f64 = 0.25;

/// |delta| below which performance is reported as on target.
const AT_TARGET_TOLERANCE: f64 = 0.05;

/// Changes smaller than this are reported as holding steady.
const HOLD_TOLERANCE: f64 = 0.01;

/// Retrievability below which the rationale mentions the gap since the last session.
const LOW_RETRIEVABILITY: f64 = 0.5;

/// Local hours `[0, LATE_HOURS_END)` count as late-night practice.
const LATE_HOURS_END: u8 = 6;

/// Hour assumed when the caller does not know the learner's local time.
pub const NEUTRAL_HOUR: u8 = 12;

/// Stateless difficulty calculator configured by a [`DifficultyConfig`].
///
/// Cheap to clone and safe to share; every method is a pure function of its
/// arguments and the configuration.
#[derive(Debug, Clone, Default)]
pub struct DifficultyEngine {
    config: DifficultyConfig,
}

impl DifficultyEngine {
    pub const fn new(config: DifficultyConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Compute the next target difficulty for a learner and topic.
    pub fn calculate_next_difficulty(&self, context: &DifficultyContext) -> DifficultyCalculation {
        let c = &self.config;
        let current = self.sanitize_snapshot(&context.current_state);
        let window = context.recent_performance.as_slice();
        let data_points = window.len();

        let style_factor = bounded(
            context.learning_style_factor,
            MIN_STYLE_FACTOR,
            MAX_STYLE_FACTOR,
            1.0,
        );
        let affinity = bounded(context.topic_affinity, MIN_TOPIC_AFFINITY, MAX_TOPIC_AFFINITY, 1.0);

        let recent_success_rate = success_rate(window);
        let performance_delta = recent_success_rate - current.success_rate;

        let stability_modifier = self.stability_modifier(current.stability);
        let style_adjustment = performance_delta * 2.0 * style_factor * c.learning_style_influence;
        let affinity_adjustment = performance_delta * 1.5 * affinity * c.topic_affinity_influence;

        let fatigue = self.fatigue_factor(context.session_length, context.time_of_day);
        let data_confidence = (data_points as f64 / FULL_STRENGTH_DATA_POINTS).min(1.0) * fatigue;
        let base_adjustment =
            performance_delta * (c.adjustment_strength * data_confidence) * stability_modifier;

        let raw_adjustment = base_adjustment + style_adjustment + affinity_adjustment;
        let max_allowed = self.max_allowed_adjustment(current.confidence, data_points);
        let constrained = bounded(raw_adjustment, -max_allowed, max_allowed, 0.0);

        let next_difficulty = bounded(
            current.difficulty + constrained,
            MIN_DIFFICULTY,
            MAX_DIFFICULTY,
            current.difficulty,
        );
        let adjustment_magnitude = (next_difficulty - current.difficulty).abs();

        let stability_update =
            self.update_stability_score(current.stability, window, adjustment_magnitude);
        let confidence_score =
            self.confidence_score(data_points, stability_update, adjustment_magnitude);
        let expected_performance =
            self.predict_performance_at_difficulty(next_difficulty, stability_update, style_factor);

        let reasoning = self.reasoning(&Rationale {
            previous: current.difficulty,
            next: next_difficulty,
            recent_success_rate,
            target_success_rate: current.success_rate,
            data_points,
            confidence: confidence_score,
            retrievability: current.retrievability,
            fatigue,
        });

        DifficultyCalculation {
            next_difficulty,
            confidence_score,
            stability_update,
            reasoning,
            adjustment_magnitude,
            expected_performance,
        }
    }

    /// Stability after observing `recent_performance` and moving by `adjustment_magnitude`.
    ///
    /// Consistent windows (at least two answers with low variance) earn a bonus,
    /// moderate variance a mild penalty, variance past the high threshold a
    /// steeper one, and any non-trivial swing a penalty proportional to its size.
    pub fn update_stability_score(
        &self,
        current_stability: f64,
        recent_performance: &[PerformancePoint],
        adjustment_magnitude: f64,
    ) -> f64 {
        let c = &self.config;
        let current = bounded(current_stability, MIN_STABILITY, MAX_STABILITY, c.base_stability_score);
        let variance = performance_variance(recent_performance);
        let magnitude = bounded(adjustment_magnitude.abs(), 0.0, MAX_DIFFICULTY, 0.0);

        let mut change = 0.0;
        if variance < c.consistency_variance_threshold {
            if recent_performance.len() >= 2 {
                change += c.consistency_bonus;
            }
        } else if variance <= c.high_variance_threshold {
            change -= variance * c.moderate_variance_penalty;
        } else {
            change -= variance * c.high_variance_penalty;
        }

        if magnitude > c.swing_threshold {
            change -= magnitude * c.swing_penalty;
        }

        bounded(current + change, MIN_STABILITY, MAX_STABILITY, current)
    }

    /// Narrow the selection band as evidence grows and performance settles.
    pub fn adjust_confidence_interval(
        &self,
        current_interval: f64,
        recent_performance: &[PerformancePoint],
    ) -> f64 {
        let current = bounded(
            current_interval,
            MIN_CONFIDENCE_INTERVAL,
            MAX_CONFIDENCE_INTERVAL,
            self.config.initial_confidence_interval,
        );
        let data_factor =
            (recent_performance.len() as f64 / FULL_QUANTITY_DATA_POINTS).min(1.0);
        let settledness = 1.0 - performance_variance(recent_performance) / MAX_BOOLEAN_VARIANCE;
        let target = MAX_CONFIDENCE_INTERVAL
            - (MAX_CONFIDENCE_INTERVAL - MIN_CONFIDENCE_INTERVAL) * data_factor * settledness;

        bounded(
            (current + target) / 2.0,
            MIN_CONFIDENCE_INTERVAL,
            MAX_CONFIDENCE_INTERVAL,
            current,
        )
    }

    /// Pick the question difficulty to serve.
    ///
    /// Prefers candidates inside `target ± confidence_interval`, falling back to
    /// the closest candidate overall. Ties go to the first candidate in input order.
    pub fn select_optimal_question_difficulty(
        available_difficulties: &[f64],
        target: f64,
        confidence_interval: f64,
    ) -> Option<f64> {
        let interval = if confidence_interval.is_finite() {
            confidence_interval.max(0.0)
        } else {
            0.0
        };
        let candidates = || available_difficulties.iter().copied().filter(|d| d.is_finite());

        closest(
            candidates().filter(|d| (d - target).abs() <= interval),
            target,
        )
        .or_else(|| closest(candidates(), target))
    }

    /// Probability of success at `difficulty`, bounded to [0.1, 0.95].
    pub fn predict_performance_at_difficulty(
        &self,
        difficulty: f64,
        stability: f64,
        learning_style_factor: f64,
    ) -> f64 {
        let difficulty = bounded(difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY, SIGMOID_PIVOT_DIFFICULTY);
        let stability = bounded(stability, MIN_STABILITY, MAX_STABILITY, 50.0);
        let style = bounded(learning_style_factor, MIN_STYLE_FACTOR, MAX_STYLE_FACTOR, 1.0);

        let logit = -self.config.difficulty_slope * (difficulty - SIGMOID_PIVOT_DIFFICULTY)
            + (stability - 50.0) / 50.0
            + (style - 1.0) * 2.0;

        bounded(
            1.0 / (1.0 + (-logit).exp()),
            MIN_EXPECTED_PERFORMANCE,
            MAX_EXPECTED_PERFORMANCE,
            NEUTRAL_SUCCESS_RATE,
        )
    }

    /// Cold-start state, seeded from the learner's style bias when there is one.
    pub fn create_initial_state(
        &self,
        learner_id: &str,
        topic_id: &str,
        bias: Option<&StyleBias>,
    ) -> DifficultyState {
        let c = &self.config;
        let starting = bias.map_or(c.default_difficulty, |b| {
            b.preferred_starting_difficulty * b.topic_affinity
        });

        let mut state = DifficultyState::new(learner_id, topic_id);
        state.difficulty = bounded(starting, MIN_DIFFICULTY, MAX_DIFFICULTY, c.default_difficulty);
        state.stability = c.base_stability_score;
        state.confidence = c.initial_confidence;
        state.confidence_interval = c.initial_confidence_interval;
        state.target_success_rate = c.target_success_rate;
        state.current_success_rate = c.target_success_rate;
        state.clamp_bounds();
        state
    }

    /// Upper bound on |adjustment| for a given confidence and window size.
    pub fn max_allowed_adjustment(&self, confidence: f64, data_points: usize) -> f64 {
        (self.config.max_adjustment_magnitude
            * confidence_multiplier(confidence)
            * data_reliability(data_points))
        .max(0.0)
    }

    /// Damping in `[min_fatigue_factor, 1]` for evidence gathered late in a
    /// long session or during late-night hours.
    ///
    /// Up to `fatigue_onset_questions` answers the factor is 1; it then falls
    /// linearly, reaching the floor at twice the onset. Late hours multiply in
    /// `late_hours_factor`.
    pub fn fatigue_factor(&self, session_length: u32, time_of_day: u8) -> f64 {
        let c = &self.config;
        let floor = bounded(c.min_fatigue_factor, 0.0, 1.0, 1.0);

        let session = match c.fatigue_onset_questions {
            0 => 1.0,
            onset if session_length > onset => {
                let overrun = f64::from(session_length - onset) / f64::from(onset);
                1.0 - (1.0 - floor) * overrun.min(1.0)
            }
            _ => 1.0,
        };
        let hours = if time_of_day < LATE_HOURS_END {
            bounded(c.late_hours_factor, 0.0, 1.0, 1.0)
        } else {
            1.0
        };

        (session * hours).clamp(floor, 1.0)
    }

    fn stability_modifier(&self, stability: f64) -> f64 {
        bounded(
            1.0 / (1.0 + stability / self.config.stability_dampening_scale),
            MIN_STABILITY_MODIFIER,
            1.0,
            1.0,
        )
    }

    fn confidence_score(&self, data_points: usize, stability: f64, magnitude: f64) -> f64 {
        let quantity = (data_points as f64 / FULL_QUANTITY_DATA_POINTS).min(1.0) * 40.0;
        let stability_share = bounded(stability, MIN_STABILITY, MAX_STABILITY, 0.0) * 0.4;
        let max_magnitude = self.config.max_adjustment_magnitude;
        let precision = if max_magnitude > 0.0 {
            (1.0 - magnitude / max_magnitude).max(0.0)
        } else {
            1.0
        } * 20.0;

        bounded(
            quantity + stability_share + precision,
            MIN_CONFIDENCE_SCORE,
            MAX_CONFIDENCE_SCORE,
            MIN_CONFIDENCE_SCORE,
        )
    }

    fn sanitize_snapshot(&self, snapshot: &StateSnapshot) -> StateSnapshot {
        let c = &self.config;
        StateSnapshot {
            difficulty: bounded(snapshot.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY, c.default_difficulty),
            stability: bounded(snapshot.stability, MIN_STABILITY, MAX_STABILITY, c.base_stability_score),
            confidence: bounded(snapshot.confidence, 0.0, 100.0, c.initial_confidence),
            success_rate: bounded(snapshot.success_rate, 0.0, 1.0, c.target_success_rate),
            retrievability: bounded(snapshot.retrievability, 0.0, 1.0, 1.0),
        }
    }

    fn reasoning(&self, r: &Rationale) -> String {
        let change = r.next - r.previous;
        let movement = if change.abs() < HOLD_TOLERANCE {
            format!("Held difficulty at {:.1}", r.next)
        } else if change > 0.0 {
            format!("Increased difficulty by {:.2} to {:.1}", change.abs(), r.next)
        } else {
            format!("Decreased difficulty by {:.2} to {:.1}", change.abs(), r.next)
        };

        let delta = r.recent_success_rate - r.target_success_rate;
        let standing = if r.data_points == 0 {
            format!(
                "no recent answers, assuming {:.0}% against target ({:.0}%)",
                NEUTRAL_SUCCESS_RATE * 100.0,
                r.target_success_rate * 100.0
            )
        } else {
            let position = if delta.abs() < AT_TARGET_TOLERANCE {
                "at target"
            } else if delta > 0.0 {
                "above target"
            } else {
                "below target"
            };
            format!(
                "recent success {:.0}% is {} ({:.0}%) across {} answer{}",
                r.recent_success_rate * 100.0,
                position,
                r.target_success_rate * 100.0,
                r.data_points,
                if r.data_points == 1 { "" } else { "s" }
            )
        };

        let mut text = format!("{movement}: {standing}. Confidence {:.0}%.", r.confidence);
        if r.fatigue < 1.0 {
            text.push_str(&format!(
                " Fatigue damping applied ({:.0}% strength).",
                r.fatigue * 100.0
            ));
        }
        if r.retrievability < LOW_RETRIEVABILITY {
            text.push_str(&format!(
                " Long gap since last session (retrievability {:.0}%).",
                r.retrievability * 100.0
            ));
        }
        text
    }
}

struct Rationale {
    previous: f64,
    next: f64,
    recent_success_rate: f64,
    target_success_rate: f64,
    data_points: usize,
    confidence: f64,
    retrievability: f64,
    fatigue: f64,
}

/// Fraction of successes; 0.5 for an empty window.
pub fn success_rate(window: &[PerformancePoint]) -> f64 {
    if window.is_empty() {
        return NEUTRAL_SUCCESS_RATE;
    }
    window.iter().filter(|p| p.success).count() as f64 / window.len() as f64
}

/// Population variance of the success/failure outcomes; 0 for an empty window.
pub fn performance_variance(window: &[PerformancePoint]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len() as f64;
    let mean = window.iter().filter(|p| p.success).count() as f64 / n;
    window
        .iter()
        .map(|p| {
            let x = if p.success { 1.0 } else { 0.0 };
            (x - mean).powi(2)
        })
        .sum::<f64>()
        / n
}

/// Maps confidence [0, 100] to [0.5, 1.0].
pub fn confidence_multiplier(confidence: f64) -> f64 {
    0.5 + bounded(confidence, 0.0, 100.0, 0.0) / 200.0
}

/// Maps window size to [0.1, 1.0]; ten answers count as fully reliable.
pub fn data_reliability(data_points: usize) -> f64 {
    (data_points as f64 / FULL_STRENGTH_DATA_POINTS).clamp(MIN_DATA_RELIABILITY, 1.0)
}

/// Recall probability decaying by half every `half_life_days`; 1.0 with no prior session.
pub fn retrievability(
    last_session_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f64 {
    let Some(last) = last_session_at else {
        return 1.0;
    };
    if half_life_days <= 0.0 {
        return 1.0;
    }
    let elapsed_days = (now - last).num_seconds().max(0) as f64 / 86_400.0;
    bounded(0.5_f64.powf(elapsed_days / half_life_days), 0.0, 1.0, 1.0)
}

fn closest(candidates: impl Iterator<Item = f64>, target: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for candidate in candidates {
        let distance = (candidate - target).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn point(success: bool) -> PerformancePoint {
        PerformancePoint {
            difficulty_at_attempt: 5.0,
            success,
            response_time_ms: 4_000,
            timestamp: Utc::now(),
            expected_success_probability: 0.5,
        }
    }

    fn window(outcomes: &[bool]) -> Vec<PerformancePoint> {
        outcomes.iter().map(|&s| point(s)).collect()
    }

    fn context(outcomes: &[bool]) -> DifficultyContext {
        DifficultyContext {
            current_state: StateSnapshot {
                difficulty: 5.0,
                stability: 50.0,
                confidence: 30.0,
                success_rate: 0.75,
                retrievability: 1.0,
            },
            recent_performance: window(outcomes),
            learning_style_factor: 1.0,
            topic_affinity: 1.0,
            session_length: outcomes.len() as u32,
            time_of_day: 14,
        }
    }

    #[test]
    fn test_success_rate_empty_window_is_neutral() {
        assert_eq!(success_rate(&[]), NEUTRAL_SUCCESS_RATE);
        assert_eq!(success_rate(&window(&[true, false, true, true])), 0.75);
    }

    #[test]
    fn test_variance_of_outcomes() {
        assert_eq!(performance_variance(&[]), 0.0);
        assert_eq!(performance_variance(&window(&[true, true, true])), 0.0);
        assert!((performance_variance(&window(&[true, false])) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_hot_streak_increases_difficulty() {
        let engine = DifficultyEngine::default();
        let calc = engine.calculate_next_difficulty(&context(&[true; 5]));

        // delta 0.25: base 0.1875 + style 0.15 + affinity 0.075, cap 2.0 * 0.65 * 0.5
        assert!((calc.next_difficulty - 5.4125).abs() < 1e-9);
        assert!(calc.reasoning.contains("above target"));
        assert!(calc.reasoning.starts_with("Increased"));
    }

    #[test]
    fn test_cold_streak_decreases_difficulty_and_stability() {
        let engine = DifficultyEngine::default();
        let calc = engine.calculate_next_difficulty(&context(&[false; 5]));

        // raw -1.2375 is capped at the 0.65 limit
        assert!((calc.next_difficulty - 4.35).abs() < 1e-9);
        assert!(calc.stability_update < 50.0);
        assert!(calc.reasoning.contains("below target"));
    }

    #[test]
    fn test_empty_window_moves_only_within_tight_cap() {
        let engine = DifficultyEngine::default();
        let calc = engine.calculate_next_difficulty(&context(&[]));

        let cap = engine.max_allowed_adjustment(30.0, 0);
        assert!(calc.adjustment_magnitude <= cap + 1e-12);
        assert!(calc.next_difficulty < 5.0);
        assert!(calc.reasoning.contains("no recent answers"));
    }

    #[test]
    fn test_on_target_performance_holds() {
        let engine = DifficultyEngine::default();
        let calc = engine.calculate_next_difficulty(&context(&[true, true, true, false]));
        assert_eq!(calc.next_difficulty, 5.0);
        assert_eq!(calc.adjustment_magnitude, 0.0);
        assert!(calc.reasoning.contains("at target"));
        assert!(calc.reasoning.starts_with("Held"));
    }

    #[test]
    fn test_degenerate_snapshot_is_clamped() {
        let engine = DifficultyEngine::default();
        let mut ctx = context(&[true; 10]);
        ctx.current_state.difficulty = 42.0;
        ctx.current_state.stability = f64::NAN;
        ctx.current_state.confidence = -10.0;
        ctx.learning_style_factor = 9.0;

        let calc = engine.calculate_next_difficulty(&ctx);
        assert_eq!(calc.next_difficulty, MAX_DIFFICULTY);
        assert!((0.0..=100.0).contains(&calc.stability_update));
        assert!((20.0..=100.0).contains(&calc.confidence_score));
        assert!((0.1..=0.95).contains(&calc.expected_performance));
    }

    #[test]
    fn test_stability_rewards_consistency() {
        let engine = DifficultyEngine::default();
        let steady = engine.update_stability_score(50.0, &window(&[true; 6]), 0.0);
        assert_eq!(steady, 52.0);
    }

    #[test]
    fn test_stability_penalises_high_variance_more_steeply() {
        let engine = DifficultyEngine::default();

        // variance 0.1224 sits between the two thresholds
        let moderate = window(&[true, true, true, true, true, false, false, true, true, true, true, true, true, true]);
        let moderate_variance = performance_variance(&moderate);
        assert!(moderate_variance > 0.10 && moderate_variance <= 0.15);

        let noisy = window(&[true, false, true, false]);
        let noisy_variance = performance_variance(&noisy);

        let moderate_drop = 50.0 - engine.update_stability_score(50.0, &moderate, 0.0);
        let noisy_drop = 50.0 - engine.update_stability_score(50.0, &noisy, 0.0);

        assert!((moderate_drop - moderate_variance * 10.0).abs() < 1e-9);
        assert!((noisy_drop - noisy_variance * 25.0).abs() < 1e-9);
        assert!(noisy_drop / noisy_variance > moderate_drop / moderate_variance);
    }

    #[test]
    fn test_stability_penalises_large_swings() {
        let engine = DifficultyEngine::default();
        let calm = engine.update_stability_score(50.0, &window(&[true; 4]), 0.05);
        let swing = engine.update_stability_score(50.0, &window(&[true; 4]), 1.0);
        assert_eq!(calm, 52.0);
        assert_eq!(swing, 47.0);
    }

    #[test]
    fn test_stability_stays_in_bounds() {
        let engine = DifficultyEngine::default();
        assert_eq!(engine.update_stability_score(99.5, &window(&[true; 4]), 0.0), 100.0);
        assert_eq!(engine.update_stability_score(1.0, &window(&[true, false]), 2.0), 0.0);
    }

    #[test]
    fn test_confidence_interval_narrows_with_settled_data() {
        let engine = DifficultyEngine::default();
        let wide = engine.adjust_confidence_interval(2.0, &[]);
        let narrow = engine.adjust_confidence_interval(2.0, &window(&[true; 20]));
        assert_eq!(wide, 2.5);
        assert!(narrow < 2.0);
        assert!(narrow >= MIN_CONFIDENCE_INTERVAL);

        let noisy = engine.adjust_confidence_interval(2.0, &window(&[true, false].repeat(10)));
        assert!(noisy > narrow);
    }

    #[test]
    fn test_select_prefers_band_with_first_tie() {
        let picked = DifficultyEngine::select_optimal_question_difficulty(&[3.0, 5.0, 7.0, 9.0], 6.0, 1.0);
        assert_eq!(picked, Some(5.0));
        for _ in 0..10 {
            assert_eq!(
                DifficultyEngine::select_optimal_question_difficulty(&[3.0, 5.0, 7.0, 9.0], 6.0, 1.0),
                picked
            );
        }
    }

    #[test]
    fn test_select_falls_back_to_closest_overall() {
        let picked = DifficultyEngine::select_optimal_question_difficulty(&[1.0, 9.5, 2.0], 6.0, 0.5);
        assert_eq!(picked, Some(9.5));
        assert_eq!(DifficultyEngine::select_optimal_question_difficulty(&[], 6.0, 1.0), None);
        assert_eq!(
            DifficultyEngine::select_optimal_question_difficulty(&[f64::NAN, 4.0], 6.0, f64::NAN),
            Some(4.0)
        );
    }

    #[test]
    fn test_prediction_shape() {
        let engine = DifficultyEngine::default();
        let easy = engine.predict_performance_at_difficulty(2.0, 50.0, 1.0);
        let pivot = engine.predict_performance_at_difficulty(5.0, 50.0, 1.0);
        let hard = engine.predict_performance_at_difficulty(9.0, 50.0, 1.0);
        assert!(easy > pivot && pivot > hard);
        assert!((pivot - 0.5).abs() < 1e-12);

        assert!(engine.predict_performance_at_difficulty(5.0, 90.0, 1.0) > pivot);
        assert!(engine.predict_performance_at_difficulty(5.0, 50.0, 1.2) > pivot);

        assert_eq!(engine.predict_performance_at_difficulty(1.0, 100.0, 1.3), 0.95);
        assert_eq!(engine.predict_performance_at_difficulty(10.0, 0.0, 0.7), 0.1);
    }

    #[test]
    fn test_initial_state_without_bias() {
        let engine = DifficultyEngine::default();
        let state = engine.create_initial_state("alice", "algebra", None);
        assert_eq!(state.difficulty, 5.0);
        assert_eq!(state.stability, 50.0);
        assert_eq!(state.confidence, 30.0);
        assert_eq!(state.target_success_rate, 0.75);
        assert_eq!(state.version, 0);
        assert!(state.manual_override.is_none());
    }

    #[test]
    fn test_initial_state_seeded_from_bias() {
        let engine = DifficultyEngine::default();
        let bias = StyleBias::new(1.1, 1.2, 5.5);
        let state = engine.create_initial_state("alice", "algebra", Some(&bias));
        assert!((state.difficulty - 6.6).abs() < 1e-9);
    }

    #[test]
    fn test_max_allowed_adjustment_components() {
        let engine = DifficultyEngine::default();
        assert_eq!(confidence_multiplier(0.0), 0.5);
        assert_eq!(confidence_multiplier(100.0), 1.0);
        assert_eq!(data_reliability(0), 0.1);
        assert_eq!(data_reliability(25), 1.0);
        assert!((engine.max_allowed_adjustment(100.0, 10) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_retrievability_decay() {
        let now = Utc::now();
        assert_eq!(retrievability(None, now, 14.0), 1.0);
        assert!((retrievability(Some(now - Duration::days(14)), now, 14.0) - 0.5).abs() < 1e-9);
        assert!((retrievability(Some(now - Duration::days(28)), now, 14.0) - 0.25).abs() < 1e-9);
        assert_eq!(retrievability(Some(now + Duration::days(3)), now, 14.0), 1.0);
    }

    #[test]
    fn test_low_retrievability_is_mentioned() {
        let engine = DifficultyEngine::default();
        let mut ctx = context(&[true, true, true, false]);
        ctx.current_state.retrievability = 0.3;
        let calc = engine.calculate_next_difficulty(&ctx);
        assert!(calc.reasoning.contains("retrievability 30%"));
    }

    #[test]
    fn test_fatigue_factor_shape() {
        let engine = DifficultyEngine::default();
        assert_eq!(engine.fatigue_factor(0, 14), 1.0);
        assert_eq!(engine.fatigue_factor(25, 14), 1.0);
        assert!((engine.fatigue_factor(30, 14) - 0.9).abs() < 1e-12);
        assert_eq!(engine.fatigue_factor(50, 14), 0.5);
        assert_eq!(engine.fatigue_factor(500, 14), 0.5);
        assert!((engine.fatigue_factor(10, 2) - 0.85).abs() < 1e-12);
        assert_eq!(engine.fatigue_factor(500, 2), 0.5);
    }

    #[test]
    fn test_long_session_damps_adjustment() {
        let engine = DifficultyEngine::default();
        let fresh = engine.calculate_next_difficulty(&context(&[true; 10]));

        let mut late = context(&[true; 10]);
        late.session_length = 50;
        let tired = engine.calculate_next_difficulty(&late);

        assert!(tired.next_difficulty > 5.0);
        assert!(tired.adjustment_magnitude < fresh.adjustment_magnitude);
        assert!(tired.reasoning.contains("Fatigue damping"));
        assert!(!fresh.reasoning.contains("Fatigue damping"));
    }
}
