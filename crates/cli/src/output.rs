//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use std::time::Duration;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// What a finished (or failed) run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub flow: String,
    pub site: String,
    pub base_url: String,
    pub duration_ms: u128,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    pub fn new(flow: &str, site: &str, base_url: &str, elapsed: Duration, error: Option<String>) -> Self {
        Self {
            flow: flow.to_string(),
            site: site.to_string(),
            base_url: base_url.to_string(),
            duration_ms: elapsed.as_millis(),
            passed: error.is_none(),
            error,
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("Flow", self.flow.clone()),
            ("Site", self.site.clone()),
            ("URL", self.base_url.clone()),
            ("Duration", format!("{:.1}s", self.duration_ms as f64 / 1000.0)),
            ("Outcome", if self.passed { "✓ passed" } else { "✗ failed" }.to_string()),
        ];
        if let Some(error) = &self.error {
            fields.push(("Error", error.clone()));
        }
        fields
    }
}

/// Render a summary in the requested format.
pub fn render_summary(summary: &RunSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            let fields = summary.fields();
            table.set_header(fields.iter().map(|(header, _)| *header).collect::<Vec<_>>());
            table.add_row(fields.into_iter().map(|(_, value)| value).collect::<Vec<_>>());
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(summary).unwrap_or_default(),
        OutputFormat::Plain => summary
            .fields()
            .into_iter()
            .map(|(header, value)| format!("{}: {}", header, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn print_summary(summary: &RunSummary, format: OutputFormat) {
    println!("{}", render_summary(summary, format));
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
