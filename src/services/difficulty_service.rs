//! Difficulty orchestration service.
//!
//! Resolves override precedence, loads and persists per learner × topic state,
//! applies the hysteresis gate, invokes the engine and writes the audit trail.
//! All collaborators are injected as port trait objects.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AdjustmentLogEntry, AdjustmentOutcome, AdjustmentReason, AnswerEvent, Config,
    DifficultyConfig, DifficultyContext, DifficultyProgression, DifficultySource, DifficultyState,
    IoConfig, ManualOverride, PerformancePoint, ProgressionPoint, SessionConfig, SessionDifficulty,
    SessionRecommendations, StateSnapshot, StyleBias, TopicRecommendation, MAX_DIFFICULTY,
    MIN_DIFFICULTY,
};
use crate::domain::ports::{
    AdjustmentLog, DifficultyStateRepository, LearningProfileSource, PerformanceHistory,
    QuestionBank,
};
use crate::services::difficulty_engine::{
    retrievability, success_rate, DifficultyEngine, NEUTRAL_HOUR,
};
use crate::services::persistence_retry::IoPolicy;
use crate::services::progression::{classify_trend, session_length_for_stability};

/// State change, caller-facing result and audit row computed for one answer.
struct PlannedAnswer {
    state: DifficultyState,
    outcome: AdjustmentOutcome,
    entry: AdjustmentLogEntry,
}

/// Adaptive difficulty controller for learner × topic pairs.
///
/// Owns the engine and the ports it reads and writes through. Every storage
/// call goes through the [`IoPolicy`]; state writes are optimistic and are
/// re-planned on version conflicts up to `max_conflict_retries` times.
pub struct DifficultyService {
    engine: DifficultyEngine,
    states: Arc<dyn DifficultyStateRepository>,
    history: Arc<dyn PerformanceHistory>,
    profiles: Arc<dyn LearningProfileSource>,
    questions: Arc<dyn QuestionBank>,
    audit: Arc<dyn AdjustmentLog>,
    io: IoPolicy,
    max_conflict_retries: u32,
}

impl DifficultyService {
    pub fn new(
        states: Arc<dyn DifficultyStateRepository>,
        history: Arc<dyn PerformanceHistory>,
        profiles: Arc<dyn LearningProfileSource>,
        questions: Arc<dyn QuestionBank>,
        audit: Arc<dyn AdjustmentLog>,
    ) -> Self {
        Self {
            engine: DifficultyEngine::default(),
            states,
            history,
            profiles,
            questions,
            audit,
            io: IoPolicy::default(),
            max_conflict_retries: IoConfig::default().max_conflict_retries,
        }
    }

    /// Apply tunables, retry policy and I/O budgets from a loaded configuration.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.engine = DifficultyEngine::new(config.difficulty.clone());
        self.io = IoPolicy::from_config(&config.retry, &config.io);
        self.max_conflict_retries = config.io.max_conflict_retries;
        self
    }

    pub const fn engine(&self) -> &DifficultyEngine {
        &self.engine
    }

    const fn config(&self) -> &DifficultyConfig {
        self.engine.config()
    }

    /// Get or create the state for a learner and topic. Never overwrites an existing row.
    #[instrument(skip(self), err)]
    pub async fn initialize_user_difficulty(
        &self,
        learner_id: &str,
        topic_id: &str,
    ) -> DomainResult<DifficultyState> {
        validate_ids(learner_id, topic_id)?;

        if let Some(existing) = self.load_state(learner_id, topic_id).await? {
            debug!(version = existing.version, "Difficulty state already exists");
            return Ok(existing);
        }

        let bias = self.style_bias(learner_id, topic_id).await;
        let state = self
            .engine
            .create_initial_state(learner_id, topic_id, bias.as_ref());

        let stored = self
            .io
            .execute("state.create", || self.states.create(&state))
            .await?;

        info!(
            difficulty = stored.difficulty,
            profiled = bias.is_some(),
            "Initialized difficulty state"
        );
        Ok(stored)
    }

    /// Read-only preview of the difficulty a new session should start at.
    ///
    /// State override beats session override beats the algorithm. Only the
    /// algorithmic path creates missing state; nothing here updates state.
    #[instrument(skip(self, session), fields(topic_id = %session.topic_id), err)]
    pub async fn calculate_session_difficulty(
        &self,
        learner_id: &str,
        session: &SessionConfig,
    ) -> DomainResult<SessionDifficulty> {
        let topic_id = session.topic_id.as_str();
        validate_ids(learner_id, topic_id)?;

        let existing = self.load_state(learner_id, topic_id).await?;

        if let Some(active) = existing.as_ref().and_then(|s| s.manual_override.as_ref()) {
            debug!(difficulty = active.difficulty, "Manual override in effect");
            return Ok(SessionDifficulty {
                learner_id: learner_id.to_string(),
                topic_id: topic_id.to_string(),
                difficulty: active.difficulty,
                source: DifficultySource::ManualOverride,
                data_points: 0,
                calculation: None,
            });
        }

        if let Some(requested) = session.override_difficulty {
            let difficulty = validate_difficulty(requested)?;
            debug!(difficulty, "Session override in effect");
            return Ok(SessionDifficulty {
                learner_id: learner_id.to_string(),
                topic_id: topic_id.to_string(),
                difficulty,
                source: DifficultySource::SessionOverride,
                data_points: 0,
                calculation: None,
            });
        }

        let state = match existing {
            Some(state) => state,
            None => self.initialize_user_difficulty(learner_id, topic_id).await?,
        };

        let now = Utc::now();
        let window = self.recent_window(learner_id, topic_id, now).await?;
        let data_points = count(window.len());

        if window.len() < self.config().min_questions_for_adjustment {
            debug!(data_points, "Too few answers to move; previewing current difficulty");
            return Ok(SessionDifficulty {
                learner_id: learner_id.to_string(),
                topic_id: topic_id.to_string(),
                difficulty: state.difficulty,
                source: DifficultySource::InsufficientData,
                data_points,
                calculation: None,
            });
        }

        let bias = self
            .style_bias(learner_id, topic_id)
            .await
            .unwrap_or_default();
        let context = self.build_context(
            &state,
            window,
            &bias,
            session.session_length,
            session.time_of_day,
            now,
        );
        let calculation = self.engine.calculate_next_difficulty(&context);

        Ok(SessionDifficulty {
            learner_id: learner_id.to_string(),
            topic_id: topic_id.to_string(),
            difficulty: calculation.next_difficulty,
            source: DifficultySource::Algorithm,
            data_points,
            calculation: Some(calculation),
        })
    }

    /// Grade one answer and adjust difficulty if the gate allows it.
    ///
    /// Fails with `StateNotFound` when the state was never initialized. Runs
    /// load → compute → compare-and-swap, recomputing on concurrent writes.
    #[instrument(
        skip(self, event),
        fields(
            learner_id = %event.learner_id,
            topic_id = %event.topic_id,
            question_id = %event.question_id
        ),
        err
    )]
    pub async fn update_difficulty_after_answer(
        &self,
        event: &AnswerEvent,
    ) -> DomainResult<AdjustmentOutcome> {
        validate_ids(&event.learner_id, &event.topic_id)?;

        let mut graded: Option<bool> = None;
        let mut conflicts = 0;

        loop {
            let state = self.require_state(&event.learner_id, &event.topic_id).await?;

            if let Some(active) = state.manual_override.as_ref() {
                return Ok(self.bypass_for_override(&state, active.difficulty).await);
            }

            let was_correct = match graded {
                Some(correct) => correct,
                None => {
                    let correct = self.grade(event).await?;
                    graded = Some(correct);
                    correct
                }
            };

            let planned = self.plan_answer(state, event, was_correct).await?;

            match self.persist(&planned.state).await {
                Ok(stored) => {
                    self.record(planned.entry).await;
                    if planned.outcome.reason.is_algorithmic() {
                        info!(
                            previous = planned.outcome.previous_difficulty,
                            next = planned.outcome.new_difficulty,
                            confidence = planned.outcome.confidence,
                            version = stored.version,
                            "Difficulty adjusted"
                        );
                    }
                    return Ok(planned.outcome);
                }
                Err(err) => self.absorb_conflict(err, &mut conflicts)?,
            }
        }
    }

    /// Pin the topic to a fixed difficulty until the override is removed.
    #[instrument(skip(self, reason), err)]
    pub async fn set_manual_difficulty_override(
        &self,
        learner_id: &str,
        topic_id: &str,
        difficulty: f64,
        reason: &str,
    ) -> DomainResult<DifficultyState> {
        validate_ids(learner_id, topic_id)?;
        let difficulty = validate_difficulty(difficulty)?;
        let reason = match reason.trim() {
            "" => "manual override".to_string(),
            given => given.to_string(),
        };

        let mut conflicts = 0;
        loop {
            let state = self.require_state(learner_id, topic_id).await?;
            let previous = state.effective_difficulty();

            let mut updated = state;
            let now = Utc::now();
            updated.manual_override = Some(ManualOverride {
                difficulty,
                reason: reason.clone(),
                set_at: now,
            });
            updated.updated_at = now;

            match self.persist(&updated).await {
                Ok(stored) => {
                    self.record(
                        AdjustmentLogEntry::for_state(&stored, AdjustmentReason::ManualOverride)
                            .with_change(previous, difficulty)
                            .with_notes(format!("override set: {reason}")),
                    )
                    .await;
                    info!(previous, difficulty, "Manual override set");
                    return Ok(stored);
                }
                Err(err) => self.absorb_conflict(err, &mut conflicts)?,
            }
        }
    }

    /// Clear an override; the algorithm resumes from the last algorithmic difficulty.
    #[instrument(skip(self), err)]
    pub async fn remove_manual_override(
        &self,
        learner_id: &str,
        topic_id: &str,
    ) -> DomainResult<DifficultyState> {
        validate_ids(learner_id, topic_id)?;

        let mut conflicts = 0;
        loop {
            let state = self.require_state(learner_id, topic_id).await?;

            let Some(active) = state.manual_override.clone() else {
                self.record(
                    AdjustmentLogEntry::for_state(&state, AdjustmentReason::ManualOverride)
                        .with_notes("override removal requested; no override was active"),
                )
                .await;
                debug!("No override was active");
                return Ok(state);
            };

            let mut updated = state;
            updated.manual_override = None;
            updated.updated_at = Utc::now();

            match self.persist(&updated).await {
                Ok(stored) => {
                    self.record(
                        AdjustmentLogEntry::for_state(&stored, AdjustmentReason::ManualOverride)
                            .with_change(active.difficulty, stored.difficulty)
                            .with_notes(format!(
                                "override removed; algorithmic control resumes at {:.1}",
                                stored.difficulty
                            )),
                    )
                    .await;
                    info!(
                        override_difficulty = active.difficulty,
                        difficulty = stored.difficulty,
                        "Manual override removed"
                    );
                    return Ok(stored);
                }
                Err(err) => self.absorb_conflict(err, &mut conflicts)?,
            }
        }
    }

    /// Difficulty over the last `window_days`, rebuilt from the audit log alone.
    #[instrument(skip(self), err)]
    pub async fn get_difficulty_progression(
        &self,
        learner_id: &str,
        topic_id: &str,
        window_days: u32,
    ) -> DomainResult<DifficultyProgression> {
        validate_ids(learner_id, topic_id)?;
        if window_days == 0 {
            return Err(DomainError::Validation(
                "window_days must be at least 1".to_string(),
            ));
        }

        let since = Utc::now() - Duration::days(i64::from(window_days));
        let mut entries = self
            .io
            .execute("audit.query", || self.audit.query(learner_id, topic_id, since))
            .await?;
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let points: Vec<ProgressionPoint> = entries
            .into_iter()
            .map(|entry| ProgressionPoint {
                timestamp: entry.created_at,
                previous_difficulty: entry.previous_difficulty,
                difficulty: entry.new_difficulty,
                reason: entry.reason,
                adjustment_magnitude: entry.adjustment_magnitude,
                confidence: entry.algorithm_confidence,
            })
            .collect();

        let trend = classify_trend(&points, self.config().trend_threshold);
        let starting_difficulty = points.first().map(|p| p.previous_difficulty);
        let current_difficulty = points.last().map(|p| p.difficulty);
        let net_change = match (starting_difficulty, current_difficulty) {
            (Some(start), Some(current)) => current - start,
            _ => 0.0,
        };
        let algorithmic_adjustments = points.iter().filter(|p| p.reason.is_algorithmic()).count();

        debug!(points = points.len(), trend = %trend, "Built difficulty progression");

        Ok(DifficultyProgression {
            learner_id: learner_id.to_string(),
            topic_id: topic_id.to_string(),
            window_days,
            points,
            trend,
            starting_difficulty,
            current_difficulty,
            net_change,
            algorithmic_adjustments,
        })
    }

    /// Rank a learner's topics by stability and size the next session.
    #[instrument(skip(self), err)]
    pub async fn get_optimal_session_recommendations(
        &self,
        learner_id: &str,
    ) -> DomainResult<SessionRecommendations> {
        if learner_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "learner_id must not be empty".to_string(),
            ));
        }

        let states = self
            .io
            .execute("state.list", || self.states.list_by_learner(learner_id))
            .await?;

        let mut ranked: Vec<TopicRecommendation> = states
            .iter()
            .map(|state| self.topic_recommendation(state))
            .collect();
        ranked.sort_by(|a, b| {
            a.stability
                .total_cmp(&b.stability)
                .then_with(|| a.topic_id.cmp(&b.topic_id))
        });

        let mut ranked = ranked.into_iter();
        let priority_focus = ranked.next();
        let suggested_session_length = priority_focus
            .as_ref()
            .map_or(self.config().standard_session_questions, |p| {
                p.suggested_session_length
            });

        Ok(SessionRecommendations {
            learner_id: learner_id.to_string(),
            priority_focus,
            suggested_session_length,
            alternatives: ranked.collect(),
        })
    }

    /// Difficulty level to draw the next question from, or `None` for an empty bank.
    #[instrument(skip(self), err)]
    pub async fn recommend_question_difficulty(
        &self,
        learner_id: &str,
        topic_id: &str,
    ) -> DomainResult<Option<f64>> {
        validate_ids(learner_id, topic_id)?;
        let state = self.require_state(learner_id, topic_id).await?;

        let available = self
            .io
            .execute("questions.available", || {
                self.questions.available_difficulties(topic_id)
            })
            .await?;

        Ok(DifficultyEngine::select_optimal_question_difficulty(
            &available,
            state.effective_difficulty(),
            state.confidence_interval,
        ))
    }

    async fn plan_answer(
        &self,
        state: DifficultyState,
        event: &AnswerEvent,
        was_correct: bool,
    ) -> DomainResult<PlannedAnswer> {
        let c = self.config();
        let learner_id = event.learner_id.as_str();
        let topic_id = event.topic_id.as_str();

        let mut window = self
            .recent_window(learner_id, topic_id, event.answered_at)
            .await?;
        window.insert(
            0,
            PerformancePoint {
                difficulty_at_attempt: state.difficulty,
                success: was_correct,
                response_time_ms: event.response_time_ms,
                timestamp: event.answered_at,
                expected_success_probability: self.engine.predict_performance_at_difficulty(
                    state.difficulty,
                    state.stability,
                    1.0,
                ),
            },
        );
        window.truncate(c.recent_performance_window_size.max(1));

        let data_points = count(window.len());
        let observed = success_rate(&window);
        let deviation = observed - state.target_success_rate;

        let mut updated = state.clone();
        updated.questions_attempted = updated.questions_attempted.saturating_add(1);
        if starts_new_session(state.last_session_at, event.answered_at, c.session_gap_minutes) {
            updated.sessions_analyzed = updated.sessions_analyzed.saturating_add(1);
        }
        updated.current_success_rate = observed;
        updated.last_session_at = Some(
            state
                .last_session_at
                .map_or(event.answered_at, |last| last.max(event.answered_at)),
        );
        updated.updated_at = Utc::now();

        let insufficient = window.len() < c.min_questions_for_adjustment;
        if insufficient || deviation.abs() <= c.deviation_threshold {
            let (reason, reasoning) = if insufficient {
                (
                    AdjustmentReason::InsufficientData,
                    format!(
                        "Holding difficulty at {:.1}: {} of {} answers needed before adjusting",
                        state.difficulty, data_points, c.min_questions_for_adjustment
                    ),
                )
            } else {
                (
                    AdjustmentReason::WithinTargetRange,
                    format!(
                        "Within target range: recent success {:.0}% is within {:.0} points of the {:.0}% target",
                        observed * 100.0,
                        c.deviation_threshold * 100.0,
                        state.target_success_rate * 100.0
                    ),
                )
            };
            debug!(data_points, observed, reason = %reason, "Gate declined adjustment");

            let mut entry = AdjustmentLogEntry::for_state(&updated, reason).with_notes(reasoning.clone());
            entry.data_points = data_points;

            return Ok(PlannedAnswer {
                outcome: AdjustmentOutcome {
                    learner_id: learner_id.to_string(),
                    topic_id: topic_id.to_string(),
                    reason,
                    previous_difficulty: state.difficulty,
                    new_difficulty: state.difficulty,
                    adjustment_magnitude: 0.0,
                    confidence: state.confidence,
                    stability_delta: 0.0,
                    reasoning,
                    was_correct: Some(was_correct),
                    expected_performance: None,
                    data_points,
                },
                state: updated,
                entry,
            });
        }

        let bias = self
            .style_bias(learner_id, topic_id)
            .await
            .unwrap_or_default();
        let confidence_interval = self
            .engine
            .adjust_confidence_interval(state.confidence_interval, &window);
        let context = self.build_context(
            &state,
            window,
            &bias,
            event.session_length,
            event.time_of_day,
            event.answered_at,
        );
        let calculation = self.engine.calculate_next_difficulty(&context);

        updated.difficulty = calculation.next_difficulty;
        updated.stability = calculation.stability_update;
        updated.confidence = calculation.confidence_score;
        updated.confidence_interval = confidence_interval;
        updated.clamp_bounds();

        let mut entry = AdjustmentLogEntry::for_state(&updated, AdjustmentReason::PerformanceAdjustment)
            .with_change(state.difficulty, updated.difficulty)
            .with_notes(calculation.reasoning.clone());
        entry.learning_style_influence = bias.learning_style_factor;
        entry.data_points = data_points;

        Ok(PlannedAnswer {
            outcome: AdjustmentOutcome {
                learner_id: learner_id.to_string(),
                topic_id: topic_id.to_string(),
                reason: AdjustmentReason::PerformanceAdjustment,
                previous_difficulty: state.difficulty,
                new_difficulty: updated.difficulty,
                adjustment_magnitude: calculation.adjustment_magnitude,
                confidence: calculation.confidence_score,
                stability_delta: updated.stability - state.stability,
                reasoning: calculation.reasoning,
                was_correct: Some(was_correct),
                expected_performance: Some(calculation.expected_performance),
                data_points,
            },
            state: updated,
            entry,
        })
    }

    async fn bypass_for_override(&self, state: &DifficultyState, difficulty: f64) -> AdjustmentOutcome {
        let reasoning =
            format!("Manual override active at {difficulty:.1}; algorithmic adjustment bypassed");
        self.record(
            AdjustmentLogEntry::for_state(state, AdjustmentReason::ManualOverride)
                .with_notes(reasoning.clone()),
        )
        .await;
        debug!(difficulty, "Answer ignored while override is active");

        AdjustmentOutcome {
            learner_id: state.learner_id.clone(),
            topic_id: state.topic_id.clone(),
            reason: AdjustmentReason::ManualOverride,
            previous_difficulty: difficulty,
            new_difficulty: difficulty,
            adjustment_magnitude: 0.0,
            confidence: state.confidence,
            stability_delta: 0.0,
            reasoning,
            was_correct: None,
            expected_performance: None,
            data_points: 0,
        }
    }

    fn build_context(
        &self,
        state: &DifficultyState,
        window: Vec<PerformancePoint>,
        bias: &StyleBias,
        session_length: Option<u32>,
        time_of_day: Option<u8>,
        now: DateTime<Utc>,
    ) -> DifficultyContext {
        let retrievability = retrievability(
            state.last_session_at,
            now,
            self.config().retrievability_half_life_days,
        );
        let session_length = session_length.unwrap_or_else(|| {
            current_session_length(&window, now, self.config().session_gap_minutes)
        });
        let time_of_day = time_of_day.unwrap_or(NEUTRAL_HOUR).min(23);

        debug!(
            data_points = window.len(),
            session_length,
            time_of_day,
            retrievability,
            style_factor = bias.learning_style_factor,
            topic_affinity = bias.topic_affinity,
            "Built difficulty context"
        );

        DifficultyContext {
            current_state: StateSnapshot::from_state(state, retrievability),
            recent_performance: window,
            learning_style_factor: bias.learning_style_factor,
            topic_affinity: bias.topic_affinity,
            session_length,
            time_of_day,
        }
    }

    async fn grade(&self, event: &AnswerEvent) -> DomainResult<bool> {
        let question = self
            .io
            .execute("questions.get", || {
                self.questions.get_question(&event.question_id)
            })
            .await?
            .ok_or_else(|| DomainError::QuestionNotFound(event.question_id.clone()))?;
        if question.topic_id != event.topic_id {
            return Err(DomainError::Validation(format!(
                "question {} belongs to topic {}, not {}",
                question.id, question.topic_id, event.topic_id
            )));
        }
        Ok(question.is_correct(&event.submitted_answer))
    }

    async fn recent_window(
        &self,
        learner_id: &str,
        topic_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<PerformancePoint>> {
        let c = self.config();
        let since = now - Duration::days(i64::from(c.performance_analysis_window_days));
        let limit = c.recent_performance_window_size;

        let mut window = self
            .io
            .execute("history.query", || {
                self.history.query(learner_id, topic_id, since, limit)
            })
            .await?;
        window.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        window.truncate(limit);
        Ok(window)
    }

    /// Profile lookup failures degrade to neutral bias.
    async fn style_bias(&self, learner_id: &str, topic_id: &str) -> Option<StyleBias> {
        match self
            .io
            .execute("profile.get", || self.profiles.get_profile(learner_id))
            .await
        {
            Ok(profile) => profile.map(|p| p.bias_for(topic_id)),
            Err(err) => {
                warn!(error = %err, "Learning profile lookup failed; using neutral bias");
                None
            }
        }
    }

    async fn load_state(
        &self,
        learner_id: &str,
        topic_id: &str,
    ) -> DomainResult<Option<DifficultyState>> {
        self.io
            .execute("state.get", || self.states.get(learner_id, topic_id))
            .await
    }

    async fn require_state(&self, learner_id: &str, topic_id: &str) -> DomainResult<DifficultyState> {
        self.load_state(learner_id, topic_id)
            .await?
            .ok_or_else(|| DomainError::state_not_found(learner_id, topic_id))
    }

    /// Compare-and-swap `state`, reconciling writes whose outcome is unknown.
    ///
    /// A timed-out or retried upsert may have committed before the error was
    /// seen. When the stored row is exactly the planned write it is returned as
    /// success, so callers never plan the same change twice.
    async fn persist(&self, state: &DifficultyState) -> DomainResult<DifficultyState> {
        let err = match self
            .io
            .execute_write("state.upsert", || self.states.upsert(state))
            .await
        {
            Ok(stored) => return Ok(stored),
            Err(err) => err,
        };
        if !matches!(
            err,
            DomainError::ConcurrencyConflict { .. }
                | DomainError::Timeout { .. }
                | DomainError::Persistence(_)
        ) {
            return Err(err);
        }

        match self.load_state(&state.learner_id, &state.topic_id).await {
            Ok(Some(current)) if is_committed_write(state, &current) => {
                warn!(
                    version = current.version,
                    error = %err,
                    "State write landed despite the reported failure"
                );
                Ok(current)
            }
            _ => Err(err),
        }
    }

    /// Audit failures are logged and never undo the decision they describe.
    async fn record(&self, entry: AdjustmentLogEntry) {
        if let Err(err) = self
            .io
            .execute("audit.append", || self.audit.append(&entry))
            .await
        {
            warn!(
                learner_id = %entry.learner_id,
                topic_id = %entry.topic_id,
                reason = %entry.reason,
                error = %err,
                "Failed to append adjustment log entry"
            );
        }
    }

    /// Swallow a concurrency conflict while the retry budget lasts.
    fn absorb_conflict(&self, err: DomainError, conflicts: &mut u32) -> DomainResult<()> {
        if matches!(err, DomainError::ConcurrencyConflict { .. }) && *conflicts < self.max_conflict_retries {
            *conflicts += 1;
            debug!(conflicts = *conflicts, "State changed concurrently; re-reading");
            Ok(())
        } else {
            Err(err)
        }
    }

    fn topic_recommendation(&self, state: &DifficultyState) -> TopicRecommendation {
        let c = self.config();
        let band = if state.stability < c.low_stability_band {
            "still calibrating, keep sessions short and focused"
        } else if state.stability < c.high_stability_band {
            "moderately stable, standard session length"
        } else {
            "well calibrated, longer sessions are fine"
        };
        let mut rationale = format!("Stability {:.0}: {band}", state.stability);
        if state.has_override() {
            rationale.push_str("; manual override active");
        }

        TopicRecommendation {
            topic_id: state.topic_id.clone(),
            difficulty: state.effective_difficulty(),
            stability: state.stability,
            confidence: state.confidence,
            suggested_session_length: session_length_for_stability(state.stability, c),
            override_active: state.has_override(),
            rationale,
        }
    }
}

fn validate_ids(learner_id: &str, topic_id: &str) -> DomainResult<()> {
    if learner_id.trim().is_empty() {
        return Err(DomainError::Validation(
            "learner_id must not be empty".to_string(),
        ));
    }
    if topic_id.trim().is_empty() {
        return Err(DomainError::Validation(
            "topic_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_difficulty(value: f64) -> DomainResult<f64> {
    if value.is_finite() && (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::Validation(format!(
            "difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}, got {value}"
        )))
    }
}

fn starts_new_session(
    last_session_at: Option<DateTime<Utc>>,
    answered_at: DateTime<Utc>,
    gap_minutes: i64,
) -> bool {
    match last_session_at {
        Some(last) => answered_at - last > Duration::minutes(gap_minutes),
        None => true,
    }
}

/// Answers in `window` (newest first) chained to `now` by gaps no longer than
/// the session gap.
fn current_session_length(
    window: &[PerformancePoint],
    now: DateTime<Utc>,
    gap_minutes: i64,
) -> u32 {
    let gap = Duration::minutes(gap_minutes);
    let mut cursor = now;
    let mut answers = 0;
    for point in window {
        if cursor - point.timestamp > gap {
            break;
        }
        cursor = point.timestamp;
        answers += 1;
    }
    count(answers)
}

/// True when `stored` is the row produced by upserting `planned`.
///
/// Timestamps are compared at microsecond precision, the resolution storage keeps.
fn is_committed_write(planned: &DifficultyState, stored: &DifficultyState) -> bool {
    stored.version == planned.version + 1
        && stored.updated_at.timestamp_micros() == planned.updated_at.timestamp_micros()
        && stored.questions_attempted == planned.questions_attempted
        && stored.manual_override.is_some() == planned.manual_override.is_some()
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
