//! Run-Level Statistics
//!
//! Reduces the per-repetition records of one benchmark instance into one
//! aggregate record per registered statistic.

use std::collections::BTreeMap;

use pulsebench_core::Counter;
use pulsebench_report::Run;

/// Compute aggregate records across repetitions.
///
/// Produces nothing unless at least two error-free repetitions exist; a
/// single measurement has no spread worth reporting. Each statistic yields
/// one record named `<benchmark>_<statistic>` reducing the accumulated
/// times, the throughput rates, and every user counter.
pub fn compute_stats(reports: &[Run]) -> Vec<Run> {
    let mut results = Vec::new();

    let error_count = reports.iter().filter(|r| r.error_occurred).count();
    if reports.len() - error_count < 2 {
        return results;
    }

    let mut real_accumulated = Vec::with_capacity(reports.len());
    let mut cpu_accumulated = Vec::with_capacity(reports.len());
    let mut bytes_per_second = Vec::with_capacity(reports.len());
    let mut items_per_second = Vec::with_capacity(reports.len());
    let mut counter_values: BTreeMap<String, (Counter, Vec<f64>)> = BTreeMap::new();

    // Repetitions run with one converged iteration count, so the first
    // record's count stands for all of them.
    let run_iterations = reports[0].iterations;

    for run in reports {
        debug_assert_eq!(run.benchmark_name, reports[0].benchmark_name);
        if run.error_occurred {
            continue;
        }
        debug_assert_eq!(run.iterations, run_iterations);

        real_accumulated.push(run.real_accumulated_time);
        cpu_accumulated.push(run.cpu_accumulated_time);
        bytes_per_second.push(run.bytes_per_second);
        items_per_second.push(run.items_per_second);
        for (name, counter) in &run.counters {
            counter_values
                .entry(name.clone())
                .or_insert_with(|| (*counter, Vec::new()))
                .1
                .push(counter.value);
        }
    }

    // The label survives aggregation only when every repetition agrees.
    let mut report_label = reports[0].report_label.clone();
    for run in &reports[1..] {
        if run.report_label != report_label {
            report_label.clear();
            break;
        }
    }

    for stat in &reports[0].statistics {
        let mut data = Run {
            benchmark_name: format!("{}_{}", reports[0].benchmark_name, stat.name),
            report_label: report_label.clone(),
            iterations: run_iterations,
            time_unit: reports[0].time_unit,
            real_accumulated_time: (stat.compute)(&real_accumulated),
            cpu_accumulated_time: (stat.compute)(&cpu_accumulated),
            bytes_per_second: (stat.compute)(&bytes_per_second),
            items_per_second: (stat.compute)(&items_per_second),
            ..Run::default()
        };
        for (name, (counter, values)) in &counter_values {
            data.counters.insert(
                name.clone(),
                Counter {
                    value: (stat.compute)(values),
                    flags: counter.flags,
                    one_k: counter.one_k,
                },
            );
        }
        results.push(data);
    }

    results
}
