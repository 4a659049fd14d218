//! Manual override commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::commands::state::{StateListOutput, StateOutput};
use crate::cli::context::CliContext;
use crate::cli::output::output;

#[derive(Args, Debug)]
pub struct OverrideArgs {
    #[command(subcommand)]
    pub command: OverrideCommands,
}

#[derive(Subcommand, Debug)]
pub enum OverrideCommands {
    /// Pin a topic to a fixed difficulty (1-10)
    Set {
        learner_id: String,
        topic_id: String,
        difficulty: f64,
        /// Why the override was set
        #[arg(short, long, default_value = "")]
        reason: String,
    },
    /// Hand the topic back to the algorithm
    Remove {
        learner_id: String,
        topic_id: String,
    },
}

pub async fn execute(args: OverrideArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let state = match args.command {
        OverrideCommands::Set {
            learner_id,
            topic_id,
            difficulty,
            reason,
        } => {
            ctx.service
                .set_manual_difficulty_override(&learner_id, &topic_id, difficulty, &reason)
                .await?
        }
        OverrideCommands::Remove { learner_id, topic_id } => {
            ctx.service.remove_manual_override(&learner_id, &topic_id).await?
        }
    };

    let out = StateListOutput {
        states: vec![StateOutput::from(&state)],
    };
    output(&out, json_mode);
    Ok(())
}
