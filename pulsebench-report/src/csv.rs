//! CSV Reporter
//!
//! Fixed columns plus user-counter columns discovered from the first batch.
//! Counters appearing only in later batches cannot be added to an
//! already-printed header; they are reported on the error stream instead.

use std::collections::BTreeSet;
use std::io::Write;

use crate::reporter::{ReportError, Reporter, Streams};
use crate::run::{Context, Run};

const ELEMENTS: [&str; 10] = [
    "name",
    "iterations",
    "real_time",
    "cpu_time",
    "time_unit",
    "bytes_per_second",
    "items_per_second",
    "label",
    "error_occurred",
    "error_message",
];

fn csv_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Reporter producing spreadsheet-compatible CSV.
pub struct CsvReporter {
    streams: Streams,
    printed_header: bool,
    user_counter_names: BTreeSet<String>,
}

impl CsvReporter {
    /// A CSV reporter writing to the given streams.
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            streams: Streams { out, err },
            printed_header: false,
            user_counter_names: BTreeSet::new(),
        }
    }

    fn print_run(&mut self, run: &Run) -> Result<(), ReportError> {
        let out = &mut self.streams.out;
        write!(out, "{},", csv_quote(&run.benchmark_name))?;

        if run.error_occurred {
            // Skip to the error columns.
            write!(out, "{}", ",".repeat(ELEMENTS.len() - 3))?;
            writeln!(out, "true,{}", csv_quote(&run.error_message))?;
            return Ok(());
        }

        if !run.report_big_o && !run.report_rms {
            write!(out, "{}", run.iterations)?;
        }
        write!(out, ",{},{},", run.adjusted_real_time(), run.adjusted_cpu_time())?;
        if run.report_big_o {
            write!(out, "{}", run.complexity.label())?;
        } else if !run.report_rms {
            write!(out, "{}", run.time_unit.suffix())?;
        }
        write!(out, ",")?;
        if run.bytes_per_second > 0.0 {
            write!(out, "{}", run.bytes_per_second)?;
        }
        write!(out, ",")?;
        if run.items_per_second > 0.0 {
            write!(out, "{}", run.items_per_second)?;
        }
        write!(out, ",")?;
        if !run.report_label.is_empty() {
            write!(out, "{}", csv_quote(&run.report_label))?;
        }
        // Empty error_occurred and error_message columns.
        write!(out, ",,")?;

        for name in &self.user_counter_names {
            match run.counters.get(name) {
                Some(counter) => write!(out, ",{}", counter.value)?,
                None => write!(out, ",")?,
            }
        }
        writeln!(out)?;
        Ok(())
    }
}

impl Reporter for CsvReporter {
    fn report_context(&mut self, _ctx: &Context) -> bool {
        true
    }

    fn report_runs(&mut self, runs: &[Run]) -> Result<(), ReportError> {
        if !self.printed_header {
            for run in runs {
                self.user_counter_names
                    .extend(run.counters.keys().cloned());
            }
            let mut header = ELEMENTS.join(",");
            for name in &self.user_counter_names {
                header.push(',');
                header.push_str(&csv_quote(name));
            }
            writeln!(self.streams.out, "{header}")?;
            self.printed_header = true;
        } else {
            for run in runs {
                for name in run.counters.keys() {
                    if !self.user_counter_names.contains(name) {
                        writeln!(
                            self.streams.err,
                            "counter '{name}' appeared after the CSV header was printed; \
                             all counters must be present in the first report"
                        )?;
                    }
                }
            }
        }

        for run in runs {
            self.print_run(run)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ReportError> {
        Ok(())
    }

    fn flush(&mut self) {
        self.streams.flush();
    }
}
