//! The Reporter Contract

use std::io::Write;

use crate::console::ConsoleReporter;
use crate::csv::CsvReporter;
use crate::json::JsonReporter;
use crate::run::{Context, Run};
use crate::OutputFormat;

/// Failure while emitting report output.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The underlying stream rejected a write.
    #[error("failed to write report output")]
    Io(#[from] std::io::Error),
    /// JSON serialization failed.
    #[error("failed to serialize JSON report")]
    Json(#[from] serde_json::Error),
}

/// Display options resolved from the color and tabular flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Colorize console output with ANSI escapes.
    pub color: bool,
    /// Print user counters as aligned columns instead of `name=value`.
    pub tabular: bool,
}

/// Consumes run records and produces output on its streams.
///
/// The orchestrator calls `report_context` once (a `false` return aborts the
/// whole invocation), then `report_runs` zero, one, or two times per
/// benchmark instance (non-aggregates, then aggregates), then `finalize`.
/// Streams are flushed after every call.
pub trait Reporter {
    /// Emit the invocation header. Returning `false` refuses the run.
    fn report_context(&mut self, ctx: &Context) -> bool;

    /// Emit a batch of run records.
    fn report_runs(&mut self, runs: &[Run]) -> Result<(), ReportError>;

    /// Emit any buffered trailer output.
    fn finalize(&mut self) -> Result<(), ReportError>;

    /// Flush the output and error streams.
    fn flush(&mut self);
}

/// Writer pair every reporter owns. The error stream carries diagnostics the
/// output format cannot (e.g. CSV counter mismatches).
pub(crate) struct Streams {
    pub out: Box<dyn Write + Send>,
    pub err: Box<dyn Write + Send>,
}

impl Streams {
    pub(crate) fn flush(&mut self) {
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}

/// Construct the reporter for `format` writing to the given streams.
pub fn create_reporter(
    format: OutputFormat,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    opts: OutputOptions,
) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleReporter::new(out, err, opts)),
        OutputFormat::Json => Box::new(JsonReporter::new(out, err)),
        OutputFormat::Csv => Box::new(CsvReporter::new(out, err)),
    }
}
