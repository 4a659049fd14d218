//! Session recommendations command.

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;

use crate::cli::context::CliContext;
use crate::cli::output::{difficulty_cell, output, table, CommandOutput};
use crate::domain::models::SessionRecommendations;

#[derive(Args, Debug)]
pub struct RecommendArgs {
    pub learner_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct RecommendOutput {
    #[serde(flatten)]
    pub recommendations: SessionRecommendations,
}

impl CommandOutput for RecommendOutput {
    fn to_human(&self) -> String {
        let r = &self.recommendations;
        let Some(focus) = &r.priority_focus else {
            return format!(
                "No topics tracked for {} yet. Suggested session: {} questions.",
                r.learner_id, r.suggested_session_length
            );
        };

        let mut t = table(["Topic", "Difficulty", "Stability", "Questions", "Why"]);
        for rec in std::iter::once(focus).chain(&r.alternatives) {
            let topic = if rec.override_active {
                format!("{} (override)", rec.topic_id)
            } else {
                rec.topic_id.clone()
            };
            t.add_row(vec![
                Cell::new(topic),
                difficulty_cell(rec.difficulty),
                Cell::new(format!("{:.1}", rec.stability)),
                Cell::new(rec.suggested_session_length),
                Cell::new(&rec.rationale),
            ]);
        }

        format!(
            "Focus on {} for {} questions.\n{t}",
            focus.topic_id, r.suggested_session_length
        )
    }
}

pub async fn execute(args: RecommendArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let recommendations = ctx
        .service
        .get_optimal_session_recommendations(&args.learner_id)
        .await?;
    output(&RecommendOutput { recommendations }, json_mode);
    Ok(())
}
