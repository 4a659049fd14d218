//! CLI type definitions
//!
//! Top-level clap structures. Each subcommand's arguments live next to its
//! implementation in `commands/`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{
    answer::AnswerArgs, init::InitArgs, overrides::OverrideArgs, profile::ProfileArgs,
    progression::ProgressionArgs, question::QuestionArgs, recommend::RecommendArgs,
    session::SessionArgs, state::StateArgs,
};

#[derive(Parser, Debug)]
#[command(name = "pacer")]
#[command(about = "Pacer - adaptive difficulty controller", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .pacer/
    #[arg(short, long, global = true, env = "PACER_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .pacer/ with a default config and an up-to-date database
    Init(InitArgs),

    /// Inspect or create per learner × topic difficulty state
    State(StateArgs),

    /// Preview the difficulty a new session would start at
    Session(SessionArgs),

    /// Submit an answer and let the controller adjust difficulty
    Answer(AnswerArgs),

    /// Pin or release a topic's difficulty
    Override(OverrideArgs),

    /// Show how difficulty moved over a time window
    Progression(ProgressionArgs),

    /// Suggest what a learner should practise next
    Recommend(RecommendArgs),

    /// Manage the question bank
    Question(QuestionArgs),

    /// Manage learning-style profiles
    Profile(ProfileArgs),
}
