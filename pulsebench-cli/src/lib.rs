#![warn(missing_docs)]
//! PulseBench CLI Library
//!
//! The harness entry point for benchmark binaries. Call
//! [`run`] from your main function to parse the `--benchmark_*` flag
//! surface, select benchmarks, and drive them through the reporters:
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     pulsebench_cli::run()?;
//!     Ok(())
//! }
//! ```

mod complexity;
mod config;
mod driver;
mod statistics;

pub use complexity::compute_big_o;
pub use config::{EngineConfig, OutputConfig, PulsebenchConfig};
pub use driver::{run_benchmark, EngineSettings, RunResults, MAX_ITERATIONS};
pub use statistics::compute_stats;

use std::io::IsTerminal;

use anyhow::Context as _;
use clap::Parser;
use pulsebench_core::{collect_instances, Instance};
use pulsebench_report::{
    create_reporter, Context, OutputFormat, OutputOptions, ReportError, Reporter, Run,
};
use regex::Regex;

/// PulseBench command-line flags.
#[derive(Parser, Debug)]
#[command(name = "pulsebench", about = "PulseBench - microbenchmark harness")]
pub struct Cli {
    /// Print the names of all matching benchmarks instead of running them.
    #[arg(
        long = "benchmark_list_tests",
        default_value_t = false,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub benchmark_list_tests: bool,

    /// Regular expression selecting the benchmarks to run. Empty or "all"
    /// selects everything.
    #[arg(long = "benchmark_filter", default_value = ".")]
    pub benchmark_filter: String,

    /// Minimum seconds a measurement must cover before it is considered
    /// significant.
    #[arg(long = "benchmark_min_time", default_value_t = 0.5)]
    pub benchmark_min_time: f64,

    /// Number of repetitions of each benchmark; above 1, summary statistics
    /// are reported as well.
    #[arg(long = "benchmark_repetitions", default_value_t = 1)]
    pub benchmark_repetitions: u64,

    /// Report only aggregate records for repeated benchmarks, on every
    /// reporter.
    #[arg(
        long = "benchmark_report_aggregates_only",
        default_value_t = false,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub benchmark_report_aggregates_only: bool,

    /// Display only aggregate records for repeated benchmarks; file output
    /// still carries everything.
    #[arg(
        long = "benchmark_display_aggregates_only",
        default_value_t = false,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub benchmark_display_aggregates_only: bool,

    /// Display reporter format: console, json, or csv.
    #[arg(long = "benchmark_format", default_value = "console")]
    pub benchmark_format: String,

    /// File reporter format: console, json, or csv.
    #[arg(long = "benchmark_out_format", default_value = "json")]
    pub benchmark_out_format: String,

    /// File to write additional output to; empty disables file output.
    #[arg(long = "benchmark_out", default_value = "")]
    pub benchmark_out: String,

    /// Console coloring: auto, or a truthy/falsy value.
    #[arg(long = "benchmark_color", default_value = "auto")]
    pub benchmark_color: String,

    /// Print user counters as aligned columns instead of name=value pairs.
    #[arg(
        long = "benchmark_counters_tabular",
        default_value_t = false,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub benchmark_counters_tabular: bool,

    /// Verbosity of internal logging.
    #[arg(long = "v", default_value_t = 0)]
    pub v: u32,
}

// Flags resolved against the optional pulsebench.toml: a flag wins when it
// differs from its clap default, otherwise the file value applies.
struct Resolved {
    min_time: f64,
    repetitions: u64,
    format: String,
    out_format: String,
    out: String,
    color: String,
    counters_tabular: bool,
}

fn resolve(cli: &Cli, file: &PulsebenchConfig) -> Resolved {
    fn pick_str(cli_value: &str, default: &str, file_value: &str) -> String {
        if cli_value != default {
            cli_value.to_string()
        } else {
            file_value.to_string()
        }
    }

    Resolved {
        min_time: if cli.benchmark_min_time != 0.5 {
            cli.benchmark_min_time
        } else {
            file.engine.min_time
        },
        repetitions: if cli.benchmark_repetitions != 1 {
            cli.benchmark_repetitions
        } else {
            file.engine.repetitions
        },
        format: pick_str(&cli.benchmark_format, "console", &file.output.format),
        out_format: pick_str(&cli.benchmark_out_format, "json", &file.output.out_format),
        out: pick_str(&cli.benchmark_out, "", &file.output.out),
        color: pick_str(&cli.benchmark_color, "auto", &file.output.color),
        counters_tabular: cli.benchmark_counters_tabular || file.output.counters_tabular,
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "on" | "1"
    )
}

fn resolve_color(value: &str) -> bool {
    if value == "auto" {
        std::io::stdout().is_terminal()
    } else {
        is_truthy(value)
    }
}

fn init_logging(verbosity: u32) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(format!("pulsebench={level}"))
        .try_init();
}

/// Parse the command line and run the selected benchmarks.
///
/// Returns the number of matched benchmark instances. `--help` prints usage
/// and exits 0; unrecognized flags print a single-line error to stderr and
/// exit 1.
pub fn run() -> anyhow::Result<usize> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            print!("{e}");
            std::process::exit(0);
        }
        Err(e) => {
            let message = e.to_string();
            eprintln!(
                "pulsebench: error: {}",
                message.lines().next().unwrap_or("invalid arguments")
            );
            std::process::exit(1);
        }
    };
    run_with_cli(cli)
}

/// Run with pre-parsed flags; the programmatic entry point.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<usize> {
    init_logging(cli.v);

    let file_config = PulsebenchConfig::discover().unwrap_or_default();
    let resolved = resolve(&cli, &file_config);

    let display_format: OutputFormat = resolved
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let out_format: OutputFormat = resolved
        .out_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let opts = OutputOptions {
        color: resolve_color(&resolved.color),
        tabular: resolved.counters_tabular,
    };
    let mut display = create_reporter(
        display_format,
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
        opts,
    );

    let mut file_reporter: Option<Box<dyn Reporter>> = if resolved.out.is_empty() {
        None
    } else {
        let out_file = std::fs::File::create(&resolved.out)
            .with_context(|| format!("invalid file name: '{}'", resolved.out))?;
        let err_file = out_file.try_clone()?;
        Some(create_reporter(
            out_format,
            Box::new(out_file),
            Box::new(err_file),
            OutputOptions::default(),
        ))
    };

    let mut spec = cli.benchmark_filter.clone();
    if spec.is_empty() || spec == "all" {
        spec = ".".to_string();
    }
    let re =
        Regex::new(&spec).with_context(|| format!("invalid benchmark filter regex: '{spec}'"))?;

    let instances: Vec<Instance> = collect_instances()
        .into_iter()
        .filter(|i| re.is_match(&i.name))
        .collect();
    if instances.is_empty() {
        eprintln!("failed to match any benchmarks against regex: {spec}");
        return Ok(0);
    }
    let count = instances.len();

    if cli.benchmark_list_tests {
        for instance in &instances {
            println!("{}", instance.name);
        }
        return Ok(count);
    }

    let settings = EngineSettings {
        min_time: resolved.min_time,
        repetitions: resolved.repetitions,
        report_aggregates_only: cli.benchmark_report_aggregates_only,
        display_aggregates_only: cli.benchmark_display_aggregates_only,
    };

    run_benchmarks(
        &instances,
        &mut *display,
        file_reporter.as_mut().map(|f| &mut **f as &mut dyn Reporter),
        &settings,
    )?;
    Ok(count)
}

/// Drive every selected instance through the repetition driver, funneling
/// records to the display reporter and, when configured, the file reporter.
pub fn run_benchmarks(
    instances: &[Instance],
    display: &mut dyn Reporter,
    mut file: Option<&mut dyn Reporter>,
    settings: &EngineSettings,
) -> Result<(), ReportError> {
    // Width of the name column: at least 10, wide enough for every name,
    // plus room for the statistic suffix when aggregates will be printed.
    let mut has_repetitions = settings.repetitions > 1;
    let mut name_field_width: usize = 10;
    let mut stat_field_width: usize = 0;
    for b in instances {
        name_field_width = name_field_width.max(b.name.len());
        has_repetitions |= b.repetitions > 1;
        for stat in &b.statistics {
            stat_field_width = stat_field_width.max(stat.name.len());
        }
    }
    if has_repetitions {
        name_field_width += 1 + stat_field_width;
    }

    let ctx = Context::new(name_field_width);
    let mut complexity_reports: Vec<Run> = Vec::new();

    let proceed =
        display.report_context(&ctx) && file.as_mut().map_or(true, |f| f.report_context(&ctx));
    display.flush();
    if let Some(f) = file.as_mut() {
        f.flush();
    }

    if proceed {
        for b in instances {
            let results = run_benchmark(b, settings, &mut complexity_reports);

            report_to(display, &results, results.display_report_aggregates_only)?;
            display.flush();
            if let Some(f) = file.as_mut() {
                report_to(&mut **f, &results, results.file_report_aggregates_only)?;
                f.flush();
            }
        }
    }

    display.finalize()?;
    display.flush();
    if let Some(f) = file.as_mut() {
        f.finalize()?;
        f.flush();
    }
    Ok(())
}

fn report_to(
    reporter: &mut dyn Reporter,
    results: &RunResults,
    aggregates_only: bool,
) -> Result<(), ReportError> {
    if !aggregates_only {
        reporter.report_runs(&results.non_aggregates)?;
    }
    if !results.aggregates_only.is_empty() {
        reporter.report_runs(&results.aggregates_only)?;
    }
    Ok(())
}
