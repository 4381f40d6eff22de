//! Terminal rendering for `eventify` commands.
//!
//! Every command honours `--format`. Text goes to people; JSON mode prints
//! one object per message so scripts can parse the output line by line.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a command result: pretty JSON, or `text` for people.
pub fn print<T: Serialize>(value: &T, format: &OutputFormat, text: impl FnOnce(&T)) {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: {}", e),
        },
    }
}

pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => println!("{}", status_line("success", message)),
    }
}

/// Errors go to stderr in both formats.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => eprintln!("{}", status_line("error", message)),
    }
}

fn status_line(status: &str, message: &str) -> serde_json::Value {
    serde_json::json!({ "status": status, "message": message })
}

/// `  Label:           value`, aligned for identity and pagination details.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Section title (a dashboard path, "Signed in") over a rule.
pub fn print_heading(text: &str) {
    println!("\n{}\n{}", text, "-".repeat(50));
}
