//! Answer submission command.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tracing::debug;

use crate::cli::context::CliContext;
use crate::cli::output::{output, percent, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{AdjustmentOutcome, AnswerEvent, PerformancePoint};
use crate::domain::ports::DifficultyStateRepository;

#[derive(Args, Debug)]
pub struct AnswerArgs {
    pub learner_id: String,
    pub topic_id: String,
    pub question_id: String,
    /// The learner's submitted answer
    pub answer: String,
    /// How long the learner took
    #[arg(long, default_value_t = 0)]
    pub response_time_ms: u64,
    /// Questions planned for the current session
    #[arg(long)]
    pub session_length: Option<u32>,
}

#[derive(Debug, serde::Serialize)]
pub struct AnswerOutput {
    #[serde(flatten)]
    pub outcome: AdjustmentOutcome,
    pub attempt_recorded: bool,
}

impl CommandOutput for AnswerOutput {
    fn to_human(&self) -> String {
        let o = &self.outcome;
        let verdict = match o.was_correct {
            Some(true) => "Correct.",
            Some(false) => "Incorrect.",
            None => "Not graded (override active).",
        };
        let mut lines = vec![verdict.to_string()];
        if o.is_noop() {
            lines.push(format!("Difficulty stays at {:.2} ({})", o.new_difficulty, o.reason));
        } else {
            lines.push(format!(
                "Difficulty {:.2} -> {:.2} (confidence {:.0})",
                o.previous_difficulty, o.new_difficulty, o.confidence
            ));
        }
        if let Some(expected) = o.expected_performance {
            lines.push(format!("Expected success at new level: {}", percent(expected)));
        }
        lines.push(o.reasoning.clone());
        lines.join("\n")
    }
}

/// Run the controller on the answer, then append it to the attempt history.
///
/// The history write follows the state update so the window the controller
/// reads never contains the answer twice.
pub async fn execute(args: AnswerArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let before = ctx
        .states
        .get(&args.learner_id, &args.topic_id)
        .await?
        .ok_or_else(|| DomainError::state_not_found(&args.learner_id, &args.topic_id))?;

    let answered_at = Utc::now();
    let mut event = AnswerEvent::new(&args.learner_id, &args.topic_id, &args.question_id, &args.answer)
        .with_response_time(args.response_time_ms)
        .answered_at(answered_at);
    event.session_length = args.session_length;

    let outcome = ctx.service.update_difficulty_after_answer(&event).await?;

    let attempt_recorded = if let Some(success) = outcome.was_correct {
        let point = PerformancePoint {
            difficulty_at_attempt: before.difficulty,
            success,
            response_time_ms: args.response_time_ms,
            timestamp: answered_at,
            expected_success_probability: ctx.service.engine().predict_performance_at_difficulty(
                before.difficulty,
                before.stability,
                1.0,
            ),
        };
        let id = ctx
            .attempts
            .record_attempt(&args.learner_id, &args.topic_id, &args.question_id, &point)
            .await?;
        debug!(attempt_id = %id, "Recorded attempt");
        true
    } else {
        false
    };

    output(
        &AnswerOutput {
            outcome,
            attempt_recorded,
        },
        json_mode,
    );
    Ok(())
}
