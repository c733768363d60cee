//! Console Reporter
//!
//! Human-readable table output: one line per run with name, per-iteration
//! real and CPU time, iteration count, throughput rates, label, and user
//! counters. Complexity records print fitted coefficients and rms instead.

use std::io::Write;

use pulsebench_core::OneK;

use crate::reporter::{OutputOptions, ReportError, Reporter, Streams};
use crate::run::{humanize, Context, Run};

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";

/// Reporter producing a human-readable table.
pub struct ConsoleReporter {
    streams: Streams,
    opts: OutputOptions,
    name_field_width: usize,
    printed_header: bool,
    // Counter columns when tabular mode is on, fixed by the first batch.
    counter_columns: Vec<String>,
}

impl ConsoleReporter {
    /// A console reporter writing to the given streams.
    pub fn new(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        opts: OutputOptions,
    ) -> Self {
        Self {
            streams: Streams { out, err },
            opts,
            name_field_width: 10,
            printed_header: false,
            counter_columns: Vec::new(),
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.opts.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    // The header is deferred to the first batch: tabular counter columns are
    // unknown until runs arrive.
    fn print_header(&mut self, runs: &[Run]) -> Result<(), ReportError> {
        if self.opts.tabular {
            let mut names: Vec<String> = runs
                .iter()
                .flat_map(|r| r.counters.keys().cloned())
                .collect();
            names.sort();
            names.dedup();
            self.counter_columns = names;
        }

        let mut header = format!(
            "{:<width$} {:>13} {:>13} {:>10}",
            "Benchmark",
            "Time",
            "CPU",
            "Iterations",
            width = self.name_field_width
        );
        for name in &self.counter_columns {
            header.push_str(&format!(" {name:>10}"));
        }
        let rule = "-".repeat(header.len());
        writeln!(self.streams.out, "{rule}")?;
        writeln!(self.streams.out, "{header}")?;
        writeln!(self.streams.out, "{rule}")?;
        Ok(())
    }

    fn print_run(&mut self, run: &Run) -> Result<(), ReportError> {
        let name = format!(
            "{:<width$}",
            run.benchmark_name,
            width = self.name_field_width
        );
        let mut line = self.paint(GREEN, &name);

        if run.error_occurred {
            line.push(' ');
            line.push_str(&self.paint(RED, &format!("ERROR OCCURRED: '{}'", run.error_message)));
            writeln!(self.streams.out, "{line}")?;
            return Ok(());
        }

        let real = run.adjusted_real_time();
        let cpu = run.adjusted_cpu_time();
        if run.report_big_o {
            let label = run.complexity.label();
            line.push(' ');
            line.push_str(&self.paint(YELLOW, &format!("{real:>10.2} {label} {cpu:>10.2} {label}")));
        } else if run.report_rms {
            line.push(' ');
            line.push_str(&self.paint(
                YELLOW,
                &format!("{:>10.0} % {:>10.0} %", real * 100.0, cpu * 100.0),
            ));
        } else {
            let unit = run.time_unit.suffix();
            line.push(' ');
            line.push_str(&self.paint(YELLOW, &format!("{real:>10.0} {unit} {cpu:>10.0} {unit}")));
        }

        if !run.report_rms {
            line.push(' ');
            line.push_str(&self.paint(CYAN, &format!("{:>10}", run.iterations)));
        }

        if self.opts.tabular {
            for name in &self.counter_columns {
                match run.counters.get(name) {
                    Some(c) => line.push_str(&format!(" {:>10}", humanize(c.value, c.one_k))),
                    None => line.push_str(&format!(" {:>10}", "")),
                }
            }
        } else {
            for (name, c) in &run.counters {
                line.push_str(&format!(" {name}={}", humanize(c.value, c.one_k)));
            }
        }

        if run.bytes_per_second > 0.0 {
            line.push_str(&format!(
                " {:>16}",
                format!("{}B/s", humanize(run.bytes_per_second, OneK::Is1024))
            ));
        }
        if run.items_per_second > 0.0 {
            line.push_str(&format!(
                " {:>18}",
                format!("{} items/s", humanize(run.items_per_second, OneK::Is1000))
            ));
        }
        if run.has_memory_result {
            line.push_str(&format!(
                " {:.2} allocs/iter {} peakB",
                run.allocs_per_iter, run.max_bytes_used
            ));
        }
        if !run.report_label.is_empty() {
            line.push(' ');
            line.push_str(&run.report_label);
        }

        writeln!(self.streams.out, "{line}")?;
        Ok(())
    }
}

impl Reporter for ConsoleReporter {
    fn report_context(&mut self, ctx: &Context) -> bool {
        self.name_field_width = ctx.name_field_width;
        // The preamble goes to the error stream so piped output stays a
        // clean table.
        let _ = writeln!(
            self.streams.err,
            "{} running {} on {} x {} ({} build)",
            ctx.timestamp.format("%Y-%m-%d %H:%M:%S"),
            ctx.executable_name,
            ctx.num_cpus,
            ctx.cpu_model,
            ctx.build_type,
        );
        true
    }

    fn report_runs(&mut self, runs: &[Run]) -> Result<(), ReportError> {
        if !self.printed_header {
            self.print_header(runs)?;
            self.printed_header = true;
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

#[cfg(test)]
mod tests {
    use super::*;
    use pulsebench_core::{Counter, TimeUnit};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn reporter_with_buffer(opts: OutputOptions) -> (ConsoleReporter, SharedBuf) {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::new(
            Box::new(buf.clone()),
            Box::new(std::io::sink()),
            opts,
        );
        (reporter, buf)
    }

    fn sample_run(name: &str) -> Run {
        Run {
            benchmark_name: name.to_string(),
            iterations: 1000,
            real_accumulated_time: 1e-6,
            cpu_accumulated_time: 1e-6,
            time_unit: TimeUnit::Nanosecond,
            ..Run::default()
        }
    }

    #[test]
    fn plain_run_line_has_name_times_iterations() {
        let (mut reporter, buf) = reporter_with_buffer(OutputOptions::default());
        reporter.report_context(&Context::new(20));
        reporter.report_runs(&[sample_run("bm_fast/8")]).unwrap();

        let out = buf.contents();
        assert!(out.contains("Benchmark"));
        assert!(out.contains("bm_fast/8"));
        assert!(out.contains("1000"));
        assert!(out.contains("ns"));
        assert!(!out.contains("\x1b["), "color off by default");
    }

    #[test]
    fn color_wraps_fields_when_enabled() {
        let (mut reporter, buf) = reporter_with_buffer(OutputOptions {
            color: true,
            tabular: false,
        });
        reporter.report_context(&Context::new(20));
        reporter.report_runs(&[sample_run("bm_color")]).unwrap();
        assert!(buf.contents().contains("\x1b[32m"));
    }

    #[test]
    fn error_runs_print_the_message() {
        let (mut reporter, buf) = reporter_with_buffer(OutputOptions::default());
        reporter.report_context(&Context::new(20));
        let run = Run {
            benchmark_name: "bm_broken".to_string(),
            error_occurred: true,
            error_message: "device lost".to_string(),
            ..Run::default()
        };
        reporter.report_runs(&[run]).unwrap();
        assert!(buf.contents().contains("ERROR OCCURRED: 'device lost'"));
    }

    #[test]
    fn rms_runs_skip_iterations() {
        let (mut reporter, buf) = reporter_with_buffer(OutputOptions::default());
        reporter.report_context(&Context::new(20));
        let run = Run {
            benchmark_name: "bm_family_RMS".to_string(),
            iterations: 0,
            real_accumulated_time: 0.03,
            cpu_accumulated_time: 0.03,
            report_rms: true,
            ..Run::default()
        };
        reporter.report_runs(&[run]).unwrap();
        let out = buf.contents();
        assert!(out.contains('%'));
    }

    #[test]
    fn tabular_counters_become_columns() {
        let (mut reporter, buf) = reporter_with_buffer(OutputOptions {
            color: false,
            tabular: true,
        });
        reporter.report_context(&Context::new(20));
        let mut run = sample_run("bm_tab");
        run.counters
            .insert("misses".to_string(), Counter::new(42.0));
        reporter.report_runs(&[run]).unwrap();

        let out = buf.contents();
        assert!(out.contains("misses"));
        assert!(out.contains("42"));
    }

    #[test]
    fn inline_counters_print_name_equals_value() {
        let (mut reporter, buf) = reporter_with_buffer(OutputOptions::default());
        reporter.report_context(&Context::new(20));
        let mut run = sample_run("bm_inline");
        run.counters.insert("hits".to_string(), Counter::new(7.0));
        reporter.report_runs(&[run]).unwrap();
        assert!(buf.contents().contains("hits=7"));
    }
}
