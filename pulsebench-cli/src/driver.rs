//! Convergence Loop and Repetition Driver
//!
//! For each benchmark instance the driver searches for an iteration count
//! whose measurement covers the convergence target, repeats the converged
//! measurement, optionally performs a serial memory-accounting pass, and
//! classifies the resulting records into per-repetition and aggregate sets.

use pulsebench_core::{
    is_zero, memory_manager, run_one, run_one_serial, Complexity, Instance, MemoryResult,
    RunResult,
};
use pulsebench_report::Run;

use crate::complexity::compute_big_o;
use crate::statistics::compute_stats;

/// Hard ceiling on the iteration count of a single measurement.
pub const MAX_ITERATIONS: u64 = 1_000_000_000;

/// Global engine settings resolved from flags and the config file.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Default convergence target in seconds.
    pub min_time: f64,
    /// Default repetition count.
    pub repetitions: u64,
    /// Suppress non-aggregate records everywhere.
    pub report_aggregates_only: bool,
    /// Suppress non-aggregate records on the display reporter only.
    pub display_aggregates_only: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_time: 0.5,
            repetitions: 1,
            report_aggregates_only: false,
            display_aggregates_only: false,
        }
    }
}

/// Everything one benchmark instance produced.
#[derive(Debug, Default)]
pub struct RunResults {
    /// One record per repetition.
    pub non_aggregates: Vec<Run>,
    /// Statistics across repetitions plus any complexity-fit records.
    pub aggregates_only: Vec<Run>,
    /// Whether the display reporter should skip the non-aggregates.
    pub display_report_aggregates_only: bool,
    /// Whether the file reporter should skip the non-aggregates.
    pub file_report_aggregates_only: bool,
}

fn create_run_report(
    b: &Instance,
    results: &RunResult,
    memory_iterations: u64,
    memory_result: MemoryResult,
    seconds: f64,
) -> Run {
    let mut report = Run {
        benchmark_name: b.name.clone(),
        error_occurred: results.has_error,
        error_message: results.error_message.clone(),
        report_label: results.report_label.clone(),
        // Total iterations across all threads.
        iterations: results.iterations,
        time_unit: b.time_unit,
        ..Run::default()
    };

    if !report.error_occurred {
        let mut bytes_per_second = 0.0;
        if results.bytes_processed > 0 && seconds > 0.0 {
            bytes_per_second = results.bytes_processed as f64 / seconds;
        }
        let mut items_per_second = 0.0;
        if results.items_processed > 0 && seconds > 0.0 {
            items_per_second = results.items_processed as f64 / seconds;
        }

        report.real_accumulated_time = if b.use_manual_time {
            results.manual_time_used
        } else {
            results.real_time_used
        };
        report.cpu_accumulated_time = results.cpu_time_used;
        report.bytes_per_second = bytes_per_second;
        report.items_per_second = items_per_second;
        report.complexity_n = results.complexity_n;
        report.complexity = b.complexity;
        report.complexity_lambda = b.complexity_lambda;
        report.statistics = b.statistics.clone();
        report.counters = results.counters.clone();

        if memory_iterations > 0 {
            report.has_memory_result = true;
            report.allocs_per_iter = memory_result.num_allocs as f64 / memory_iterations as f64;
            report.max_bytes_used = memory_result.max_bytes_used;
        }

        pulsebench_core::finish(&mut report.counters, results.iterations, seconds, b.threads);
    }
    report
}

/// Run one benchmark instance to completion: converge, repeat, aggregate.
///
/// `complexity_reports` accumulates error-free records of the instance's
/// family; when the final family member finishes, the fitted complexity
/// records are appended to the aggregates and the accumulator is cleared.
pub fn run_benchmark(
    b: &Instance,
    settings: &EngineSettings,
    complexity_reports: &mut Vec<Run>,
) -> RunResults {
    let mut run_results = RunResults::default();

    let has_explicit_iteration_count = b.iterations != 0;
    let mut iters: u64 = if has_explicit_iteration_count {
        b.iterations
    } else {
        1
    };
    let repeats = if b.repetitions != 0 {
        b.repetitions
    } else {
        settings.repetitions
    };
    if repeats != 1 {
        run_results.display_report_aggregates_only =
            settings.report_aggregates_only || settings.display_aggregates_only;
        run_results.file_report_aggregates_only = settings.report_aggregates_only;
        if b.aggregation_report_mode.is_specified() {
            run_results.display_report_aggregates_only =
                b.aggregation_report_mode.display_aggregates_only();
            run_results.file_report_aggregates_only =
                b.aggregation_report_mode.file_aggregates_only();
        }
    }

    for repetition_num in 0..repeats {
        loop {
            tracing::debug!(benchmark = %b.name, iters, "running");

            let results = run_one(b, iters);

            // Base the convergence decision on the clock this benchmark
            // declared authoritative.
            let seconds = if b.use_manual_time {
                results.manual_time_used
            } else if b.use_real_time {
                results.real_time_used
            } else {
                results.cpu_time_used
            };

            let min_time = if !is_zero(b.min_time) {
                b.min_time
            } else {
                settings.min_time
            };

            // Report when retrying cannot help: a later repetition, a caller-
            // fixed iteration count, an error, the iteration ceiling, enough
            // measured time, or a CPU-gated run that already burned five
            // times the target in real time.
            let should_report = repetition_num > 0
                || has_explicit_iteration_count
                || results.has_error
                || iters >= MAX_ITERATIONS
                || seconds >= min_time
                || (results.real_time_used >= 5.0 * min_time && !b.use_manual_time);

            if should_report {
                let mut memory_result = MemoryResult::default();
                let mut memory_iterations = 0;
                if let Some(mm) = memory_manager() {
                    // A handful of iterations keeps one-time allocations from
                    // dominating the per-iteration figure.
                    memory_iterations = iters.min(16);
                    mm.start();
                    let _ = run_one_serial(b, memory_iterations);
                    memory_result = mm.stop();
                }

                let report =
                    create_run_report(b, &results, memory_iterations, memory_result, seconds);
                if !report.error_occurred && b.complexity != Complexity::None {
                    complexity_reports.push(report.clone());
                }
                run_results.non_aggregates.push(report);
                break;
            }

            let mut multiplier = min_time * 1.4 / seconds.max(1e-9);
            // A run below 10% of the target says little about the true cost;
            // cap the expansion at 10x there. Past 10% the multiplier itself
            // is already bounded by 14x.
            let is_significant = (seconds / min_time) > 0.1;
            if !is_significant {
                multiplier = multiplier.min(10.0);
            }
            if multiplier <= 1.0 {
                multiplier = 2.0;
            }
            let next_iters = (multiplier * iters as f64)
                .max(iters as f64 + 1.0)
                .min(MAX_ITERATIONS as f64);
            tracing::trace!(next_iters, multiplier, "growing iteration count");
            iters = (next_iters + 0.5) as u64;
        }
    }

    run_results.aggregates_only = compute_stats(&run_results.non_aggregates);

    if b.complexity != Complexity::None && b.last_benchmark_instance {
        run_results
            .aggregates_only
            .extend(compute_big_o(complexity_reports));
        complexity_reports.clear();
    }

    run_results
}
