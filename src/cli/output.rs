//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, Table};
use console::style;
use serde::Serialize;

use crate::domain::models::{BackfillReport, EmbeddingStatus, FailureKind, Row, RowOutcome};
use crate::services::BackfillObserver;

/// Characters of row text shown in progress lines.
pub const PREVIEW_CHARS: usize = 50;

/// Command result that renders as text or JSON.
pub trait CommandOutput: Serialize {
    /// Text for a terminal.
    fn to_human(&self) -> String;
    /// Value printed with `--json`.
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` in the selected mode.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// First `max_chars` characters of `s`.
pub fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => &s[..cut],
        None => s,
    }
}

/// Result of `run`.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// Target field.
    pub field: String,
    #[serde(flatten)]
    pub report: BackfillReport,
    /// Percentage of attempted rows that succeeded.
    pub success_rate: Option<f64>,
}

impl RunOutput {
    /// Wrap a finished report.
    pub fn new(field: impl Into<String>, report: BackfillReport) -> Self {
        let success_rate = report.success_rate();
        Self {
            field: field.into(),
            report,
            success_rate,
        }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        if self.report.is_empty() {
            return format!("No rows found without {}.", self.field);
        }

        let mut lines = vec![
            String::new(),
            style("Final Results:").bold().to_string(),
            format!("  Attempted: {}", self.report.attempted()),
            format!(
                "  {} Succeeded: {}",
                style("✅").green(),
                self.report.succeeded()
            ),
            format!("  {} Failed: {}", style("❌").red(), self.report.failed()),
        ];
        if let Some(rate) = self.success_rate {
            lines.push(format!("  Success rate: {rate:.1}%"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Result of `status`.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    /// Table name.
    pub table: String,
    /// Target field.
    pub field: String,
    #[serde(flatten)]
    pub status: EmbeddingStatus,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Table").add_attribute(Attribute::Bold),
            Cell::new("Field").add_attribute(Attribute::Bold),
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new("With embedding").add_attribute(Attribute::Bold),
            Cell::new("Without embedding").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new(&self.table),
            Cell::new(&self.field),
            Cell::new(self.status.total),
            Cell::new(self.status.embedded),
            Cell::new(self.status.missing),
        ]);
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Prints a line before and after each row to stdout. Silent in JSON mode.
pub struct ConsoleProgress {
    quiet: bool,
}

impl ConsoleProgress {
    /// Progress printer, quiet when `json_mode` is set.
    pub const fn new(json_mode: bool) -> Self {
        Self { quiet: json_mode }
    }
}

fn row_start_line(position: usize, total: usize, row: &Row) -> String {
    format!(
        "Processing {position}/{total}: {}...",
        preview(&row.text, PREVIEW_CHARS)
    )
}

fn row_outcome_line(row: &Row, outcome: &RowOutcome) -> String {
    match outcome {
        RowOutcome::Succeeded { dimension, .. } => format!(
            "  {} Updated {} ({dimension} dims)",
            style("✅").green(),
            row.id
        ),
        RowOutcome::Failed(failure) => {
            let action = match failure.kind {
                FailureKind::Embedding => "generate embedding for",
                FailureKind::Write => "update",
            };
            format!(
                "  {} Failed to {action} {}: {}",
                style("❌").red(),
                row.id,
                failure.message
            )
        }
    }
}

impl BackfillObserver for ConsoleProgress {
    fn on_start(&self, found: usize, selected: usize) {
        if self.quiet || found == 0 {
            return;
        }
        if selected < found {
            println!("Found {found} rows without embeddings, processing {selected} this run.");
        } else {
            println!("Found {found} rows without embeddings.");
        }
    }

    fn on_row_start(&self, position: usize, total: usize, row: &Row) {
        if !self.quiet {
            println!("{}", row_start_line(position, total, row));
        }
    }

    fn on_row(&self, _position: usize, _total: usize, row: &Row, outcome: &RowOutcome) {
        if !self.quiet {
            println!("{}", row_outcome_line(row, outcome));
        }
    }
}
