//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::env;

use crate::domain::models::{AdjustmentReason, Trend};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Bordered table with bold headers that wraps to the terminal width.
pub fn table<const N: usize>(headers: [&str; N]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.map(|h| Cell::new(h).add_attribute(Attribute::Bold)));
    table
}

pub fn difficulty_cell(difficulty: f64) -> Cell {
    Cell::new(format!("{difficulty:.2}"))
}

pub fn reason_cell(reason: AdjustmentReason) -> Cell {
    let cell = Cell::new(reason.as_str());
    if !supports_color() {
        return cell;
    }
    match reason {
        AdjustmentReason::PerformanceAdjustment => cell.fg(Color::Cyan),
        AdjustmentReason::ManualOverride => cell.fg(Color::Magenta),
        AdjustmentReason::WithinTargetRange | AdjustmentReason::InsufficientData => cell.fg(Color::DarkGrey),
    }
}

pub fn trend_cell(trend: Trend) -> Cell {
    let cell = Cell::new(trend.as_str());
    if !supports_color() {
        return cell;
    }
    match trend {
        Trend::Improving => cell.fg(Color::Green),
        Trend::Stable => cell,
        Trend::Declining => cell.fg(Color::Yellow),
    }
}

pub fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_renders_headers_and_rows() {
        let mut t = table(["Topic", "Difficulty"]);
        t.add_row(vec![Cell::new("algebra"), difficulty_cell(5.4125)]);
        let rendered = t.to_string();
        assert!(rendered.contains("Topic"));
        assert!(rendered.contains("algebra"));
        assert!(rendered.contains("5.41"));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.75), "75%");
        assert_eq!(percent(1.0), "100%");
    }
}
