#![warn(missing_docs)]
//! PulseBench Report - Reporting
//!
//! Turns finished runs into output:
//! - `Run`, the immutable record reporters observe
//! - `Context`, the per-invocation header information
//! - The `Reporter` trait with console, JSON, and CSV implementations

mod console;
mod csv;
mod json;
mod reporter;
mod run;

pub use console::ConsoleReporter;
pub use csv::CsvReporter;
pub use json::JsonReporter;
pub use reporter::{create_reporter, OutputOptions, ReportError, Reporter};
pub use run::{humanize, Context, Run};

/// Output format selection for a reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    Console,
    /// Machine-readable JSON.
    Json,
    /// Spreadsheet-compatible CSV.
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
