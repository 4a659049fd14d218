//! Session preview command.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;
use crate::cli::output::{output, percent, CommandOutput};
use crate::domain::models::{SessionConfig, SessionDifficulty};

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Compute the starting difficulty without changing state
    Preview {
        learner_id: String,
        topic_id: String,
        /// Session-scoped fixed difficulty (a topic override still wins)
        #[arg(long)]
        difficulty: Option<f64>,
        /// Planned number of questions
        #[arg(long)]
        length: Option<u32>,
        /// Local hour of day, 0-23
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..24))]
        hour: Option<u8>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct SessionPreviewOutput {
    #[serde(flatten)]
    pub preview: SessionDifficulty,
}

impl CommandOutput for SessionPreviewOutput {
    fn to_human(&self) -> String {
        let p = &self.preview;
        let mut lines = vec![
            format!("Learner: {}  Topic: {}", p.learner_id, p.topic_id),
            format!("Start at difficulty {:.2} ({})", p.difficulty, p.source.as_str()),
            format!("Recent answers considered: {}", p.data_points),
        ];
        if let Some(calc) = &p.calculation {
            lines.push(format!(
                "Confidence {:.0}, expected success {}",
                calc.confidence_score,
                percent(calc.expected_performance)
            ));
            lines.push(calc.reasoning.clone());
        }
        lines.join("\n")
    }
}

pub async fn execute(args: SessionArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    match args.command {
        SessionCommands::Preview {
            learner_id,
            topic_id,
            difficulty,
            length,
            hour,
        } => {
            let session = SessionConfig {
                topic_id,
                override_difficulty: difficulty,
                session_length: length,
                time_of_day: hour,
            };
            let preview = ctx.service.calculate_session_difficulty(&learner_id, &session).await?;
            output(&SessionPreviewOutput { preview }, json_mode);
        }
    }
    Ok(())
}
