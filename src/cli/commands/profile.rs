//! Learning-style profile commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;

use crate::cli::context::CliContext;
use crate::cli::output::{output, table, CommandOutput};
use crate::domain::models::{LearningProfile, LearningStyle};
use crate::domain::ports::LearningProfileSource;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Set a learner's style and per-topic affinities
    Set {
        learner_id: String,
        /// visual, auditory, read_write, kinesthetic or multimodal
        style: String,
        /// Topic affinity as topic=factor (0.8-1.2); repeatable
        #[arg(short, long = "affinity", value_parser = parse_affinity)]
        affinities: Vec<(String, f64)>,
    },
    /// Show a learner's profile and the bias it implies per topic
    Show { learner_id: String },
}

#[derive(Debug, serde::Serialize)]
pub struct ProfileOutput {
    pub learner_id: String,
    pub style: LearningStyle,
    pub style_key: String,
    pub topics: Vec<TopicBiasOutput>,
}

#[derive(Debug, serde::Serialize)]
pub struct TopicBiasOutput {
    pub topic_id: String,
    pub topic_affinity: f64,
    pub learning_style_factor: f64,
    pub preferred_starting_difficulty: f64,
}

impl From<&LearningProfile> for ProfileOutput {
    fn from(profile: &LearningProfile) -> Self {
        let mut topics: Vec<TopicBiasOutput> = profile
            .topic_affinity
            .keys()
            .map(|topic_id| {
                let bias = profile.bias_for(topic_id);
                TopicBiasOutput {
                    topic_id: topic_id.clone(),
                    topic_affinity: bias.topic_affinity,
                    learning_style_factor: bias.learning_style_factor,
                    preferred_starting_difficulty: bias.preferred_starting_difficulty,
                }
            })
            .collect();
        topics.sort_by(|a, b| a.topic_id.cmp(&b.topic_id));

        Self {
            learner_id: profile.learner_id.clone(),
            style: profile.style(),
            style_key: profile.style_key.clone(),
            topics,
        }
    }
}

impl CommandOutput for ProfileOutput {
    fn to_human(&self) -> String {
        let header = format!("Learner {}: {} learner", self.learner_id, self.style);
        if self.topics.is_empty() {
            return header;
        }

        let mut t = table(["Topic", "Affinity", "Style factor", "Starts at"]);
        for topic in &self.topics {
            t.add_row(vec![
                Cell::new(&topic.topic_id),
                Cell::new(format!("{:.2}", topic.topic_affinity)),
                Cell::new(format!("{:.2}", topic.learning_style_factor)),
                Cell::new(format!("{:.2}", topic.preferred_starting_difficulty)),
            ]);
        }
        format!("{header}\n{t}")
    }
}

fn parse_affinity(raw: &str) -> Result<(String, f64), String> {
    let (topic, factor) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected topic=factor, got '{raw}'"))?;
    let factor: f64 = factor
        .trim()
        .parse()
        .map_err(|e| format!("invalid affinity '{factor}': {e}"))?;
    let topic = topic.trim();
    if topic.is_empty() {
        return Err("topic must not be empty".to_string());
    }
    Ok((topic.to_string(), factor))
}

pub async fn execute(args: ProfileArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let profile = match args.command {
        ProfileCommands::Set {
            learner_id,
            style,
            affinities,
        } => {
            let mut profile = LearningProfile::new(&learner_id, LearningStyle::from_key(&style));
            profile.style_key = style;
            for (topic_id, factor) in affinities {
                profile = profile.with_affinity(topic_id, factor);
            }
            ctx.profiles.upsert_profile(&profile).await?;
            profile
        }
        ProfileCommands::Show { learner_id } => ctx
            .profiles
            .get_profile(&learner_id)
            .await?
            .with_context(|| format!("No profile for learner {learner_id}"))?,
    };

    output(&ProfileOutput::from(&profile), json_mode);
    Ok(())
}
