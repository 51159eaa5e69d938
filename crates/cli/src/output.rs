//! Output formatting utilities

use crate::client::ValidationIssue;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// One prediction as shown in a table
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PredictionRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Prediction")]
    pub prediction: String,
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Error")]
    kind: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&items) {
                println!("{}", json);
            }
        }
    }
}

/// Render a 422 answer as one line per offending field
pub fn print_validation_issues(issues: &[ValidationIssue], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&serde_json::json!({ "detail": issues })) {
                eprintln!("{}", json);
            }
        }
        OutputFormat::Table => {
            print_error("The server rejected the input:");
            let rows: Vec<IssueRow> = issues
                .iter()
                .map(|issue| IssueRow {
                    field: issue.field().cyan().to_string(),
                    kind: issue.kind.clone(),
                    message: issue.msg.clone(),
                })
                .collect();
            eprintln!("{}", Table::new(rows).with(Style::rounded()));
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Two decimals, matching the server's rounding
pub fn format_prediction(value: f64) -> String {
    format!("{:.2}", value)
}

/// `predicted_carbon_manufacturing` -> `carbon manufacturing`
pub fn metric_label(response_key: &str) -> String {
    response_key
        .strip_prefix("predicted_")
        .unwrap_or(response_key)
        .replace('_', " ")
}
