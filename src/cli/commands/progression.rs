//! Difficulty progression report.

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;

use crate::cli::context::CliContext;
use crate::cli::output::{difficulty_cell, output, reason_cell, table, trend_cell, CommandOutput};
use crate::domain::models::DifficultyProgression;

#[derive(Args, Debug)]
pub struct ProgressionArgs {
    pub learner_id: String,
    pub topic_id: String,
    /// How many days back to look
    #[arg(short, long, default_value_t = 30)]
    pub days: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct ProgressionOutput {
    #[serde(flatten)]
    pub progression: DifficultyProgression,
}

impl CommandOutput for ProgressionOutput {
    fn to_human(&self) -> String {
        let p = &self.progression;
        if p.points.is_empty() {
            return format!(
                "No adjustments for {}/{} in the last {} day(s).",
                p.learner_id, p.topic_id, p.window_days
            );
        }

        let mut summary = table(["Trend", "Start", "Current", "Net change", "Algorithmic"]);
        summary.add_row(vec![
            trend_cell(p.trend),
            p.starting_difficulty.map_or_else(|| Cell::new("-"), difficulty_cell),
            p.current_difficulty.map_or_else(|| Cell::new("-"), difficulty_cell),
            Cell::new(format!("{:+.2}", p.net_change)),
            Cell::new(p.algorithmic_adjustments),
        ]);

        let mut history = table(["When", "From", "To", "Reason", "Confidence"]);
        for point in &p.points {
            history.add_row(vec![
                Cell::new(point.timestamp.format("%Y-%m-%d %H:%M")),
                difficulty_cell(point.previous_difficulty),
                difficulty_cell(point.difficulty),
                reason_cell(point.reason),
                Cell::new(format!("{:.0}", point.confidence)),
            ]);
        }

        format!("{summary}\n{history}")
    }
}

pub async fn execute(args: ProgressionArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let progression = ctx
        .service
        .get_difficulty_progression(&args.learner_id, &args.topic_id, args.days)
        .await?;
    output(&ProgressionOutput { progression }, json_mode);
    Ok(())
}
