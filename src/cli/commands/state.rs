//! State CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::Cell;

use crate::cli::context::CliContext;
use crate::cli::output::{difficulty_cell, output, percent, table, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::DifficultyState;
use crate::domain::ports::DifficultyStateRepository;

#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommands,
}

#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Create state for a learner and topic (no-op if it exists)
    Init {
        learner_id: String,
        topic_id: String,
    },
    /// Show one topic, or every topic of a learner
    Show {
        learner_id: String,
        topic_id: Option<String>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct StateOutput {
    pub learner_id: String,
    pub topic_id: String,
    pub difficulty: f64,
    pub effective_difficulty: f64,
    pub stability: f64,
    pub confidence: f64,
    pub confidence_interval: f64,
    pub target_success_rate: f64,
    pub current_success_rate: f64,
    pub questions_attempted: u32,
    pub sessions_analyzed: u32,
    pub override_difficulty: Option<f64>,
    pub override_reason: Option<String>,
    pub version: i64,
}

impl From<&DifficultyState> for StateOutput {
    fn from(state: &DifficultyState) -> Self {
        Self {
            learner_id: state.learner_id.clone(),
            topic_id: state.topic_id.clone(),
            difficulty: state.difficulty,
            effective_difficulty: state.effective_difficulty(),
            stability: state.stability,
            confidence: state.confidence,
            confidence_interval: state.confidence_interval,
            target_success_rate: state.target_success_rate,
            current_success_rate: state.current_success_rate,
            questions_attempted: state.questions_attempted,
            sessions_analyzed: state.sessions_analyzed,
            override_difficulty: state.manual_override.as_ref().map(|o| o.difficulty),
            override_reason: state.manual_override.as_ref().map(|o| o.reason.clone()),
            version: state.version,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct StateListOutput {
    pub states: Vec<StateOutput>,
}

impl CommandOutput for StateListOutput {
    fn to_human(&self) -> String {
        if self.states.is_empty() {
            return "No difficulty state found.".to_string();
        }

        let mut t = table([
            "Learner", "Topic", "Difficulty", "Stability", "Confidence", "Success", "Answers", "Override",
        ]);
        for s in &self.states {
            t.add_row(vec![
                Cell::new(&s.learner_id),
                Cell::new(&s.topic_id),
                difficulty_cell(s.difficulty),
                Cell::new(format!("{:.1}", s.stability)),
                Cell::new(format!("{:.0} ±{:.1}", s.confidence, s.confidence_interval)),
                Cell::new(format!(
                    "{} / {}",
                    percent(s.current_success_rate),
                    percent(s.target_success_rate)
                )),
                Cell::new(s.questions_attempted),
                Cell::new(s.override_difficulty.map_or_else(|| "-".to_string(), |d| format!("{d:.1}"))),
            ]);
        }
        t.to_string()
    }
}

pub async fn execute(args: StateArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let states = match args.command {
        StateCommands::Init { learner_id, topic_id } => {
            vec![ctx.service.initialize_user_difficulty(&learner_id, &topic_id).await?]
        }
        StateCommands::Show {
            learner_id,
            topic_id: Some(topic_id),
        } => {
            let state = ctx
                .states
                .get(&learner_id, &topic_id)
                .await?
                .ok_or_else(|| DomainError::state_not_found(&learner_id, &topic_id))?;
            vec![state]
        }
        StateCommands::Show {
            learner_id,
            topic_id: None,
        } => ctx.states.list_by_learner(&learner_id).await?,
    };

    let out = StateListOutput {
        states: states.iter().map(StateOutput::from).collect(),
    };
    output(&out, json_mode);
    Ok(())
}
