//! Integration tests for PulseBench
//!
//! End-to-end behavior of the execution engine: fixed-iteration runs,
//! multi-thread accounting, error short-circuits, convergence, the runaway
//! real-time escape, complexity families, and reporter plumbing.

use std::sync::{Arc, Mutex};

use pulsebench::{
    run_benchmark, run_benchmarks, Benchmark, Complexity, ConsoleReporter, EngineSettings,
    Instance, JsonReporter, OutputOptions, MAX_ITERATIONS,
};

fn settings(min_time: f64, repetitions: u64) -> EngineSettings {
    EngineSettings {
        min_time,
        repetitions,
        ..EngineSettings::default()
    }
}

fn first_instance(b: &Benchmark) -> Instance {
    b.instances().remove(0)
}

/// Scenario: fixed iteration count on a single thread.
#[test]
fn fixed_iterations_single_thread() {
    let mut b = Benchmark::new("bm_items", |state| {
        let mut items = 0_u64;
        while state.keep_running() {
            // Burn a little CPU so the measured time is nonzero.
            let mut acc = 0_u64;
            for i in 0..512_u64 {
                acc = acc.wrapping_add(std::hint::black_box(i));
            }
            std::hint::black_box(acc);
            items += 1;
        }
        state.set_items_processed(items);
    });
    b.iterations(100);

    let mut family = Vec::new();
    let results = run_benchmark(&first_instance(&b), &settings(10.0, 1), &mut family);

    assert_eq!(results.non_aggregates.len(), 1);
    let run = &results.non_aggregates[0];
    assert_eq!(run.iterations, 100);
    assert!(run.cpu_accumulated_time > 0.0);
    // items_per_second is items over the authoritative (CPU) seconds.
    let expected = 100.0 / run.cpu_accumulated_time;
    assert!((run.items_per_second - expected).abs() / expected < 1e-6);
}

/// Scenario: four threads summing bytes and items.
#[test]
fn multi_thread_accounting() {
    let mut b = Benchmark::new("bm_mt", |state| {
        let mut bytes = 0_u64;
        let mut items = 0_u64;
        while state.keep_running() {
            bytes += 7;
            items += 3;
        }
        state.set_bytes_processed(bytes);
        state.set_items_processed(items);
    });
    b.threads(4).iterations(10);

    let results = pulsebench::run_one(&first_instance(&b), 10);
    assert_eq!(results.iterations, 40);
    assert_eq!(results.bytes_processed, 280);
    assert_eq!(results.items_processed, 120);
}

/// Scenario: an error on one thread short-circuits it, the others finish,
/// and the repetition loop still performs the remaining attempts.
#[test]
fn error_short_circuit() {
    let mut b = Benchmark::new("bm_err", |state| {
        if state.thread_index == 2 {
            state.skip_with_error("bad");
        }
        while state.keep_running() {}
    });
    b.threads(4).iterations(10).repetitions(2);

    let mut family = Vec::new();
    let results = run_benchmark(&first_instance(&b), &settings(0.5, 1), &mut family);

    assert_eq!(results.non_aggregates.len(), 2);
    for run in &results.non_aggregates {
        assert!(run.error_occurred);
        assert_eq!(run.error_message, "bad");
    }
}

/// Scenario: manual time converges onto the target within a handful of
/// growth rounds.
#[test]
fn convergence_on_manual_time() {
    let mut b = Benchmark::new("bm_manual", |state| {
        while state.keep_running() {
            state.set_iteration_time(0.001);
        }
    });
    b.use_manual_time().min_time(0.5);

    let mut family = Vec::new();
    let results = run_benchmark(&first_instance(&b), &settings(0.5, 1), &mut family);

    let run = &results.non_aggregates[0];
    assert!(run.real_accumulated_time >= 0.5);
    assert!(run.iterations >= 500);
    assert!(run.iterations < MAX_ITERATIONS);
}

/// Scenario: a CPU-gated benchmark whose real time dwarfs the target is
/// reported after the first qualifying run.
#[test]
fn runaway_real_time_is_capped() {
    let mut b = Benchmark::new("bm_sleep", |state| {
        while state.keep_running() {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    });
    b.min_time(0.001);

    let mut family = Vec::new();
    let results = run_benchmark(&first_instance(&b), &settings(0.001, 1), &mut family);

    assert_eq!(results.non_aggregates.len(), 1);
    assert_eq!(results.non_aggregates[0].iterations, 1);
}

/// Scenario: a four-member complexity family appends exactly one fit after
/// the final member and drains the family buffer.
#[test]
fn complexity_family_fit() {
    let mut b = Benchmark::new("bm_linear", |state| {
        let n = state.range(0);
        while state.keep_running() {
            state.set_iteration_time(n as f64 * 1e-6);
        }
        state.set_complexity_n(n);
    });
    b.arg(1)
        .arg(10)
        .arg(100)
        .arg(1000)
        .iterations(8)
        .use_manual_time()
        .complexity(Complexity::N);

    let instances = b.instances();
    let s = settings(0.5, 1);
    let mut family = Vec::new();

    let mut fit_records = Vec::new();
    for instance in &instances {
        let results = run_benchmark(instance, &s, &mut family);
        fit_records.extend(
            results
                .aggregates_only
                .iter()
                .filter(|r| r.report_big_o || r.report_rms)
                .cloned(),
        );
    }

    assert_eq!(fit_records.len(), 2, "one BigO and one RMS record");
    assert_eq!(fit_records[0].benchmark_name, "bm_linear_BigO");
    assert_eq!(fit_records[1].benchmark_name, "bm_linear_RMS");
    assert!(family.is_empty());
    // Perfectly linear manual timing: ~1us per unit of n.
    assert!((fit_records[0].real_accumulated_time - 1e-6).abs() < 1e-8);
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
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

/// The orchestrator hands every repetition to the display reporter and the
/// aggregate set afterwards.
#[test]
fn orchestrator_reports_repetitions_and_aggregates() {
    let mut b = Benchmark::new("bm_orch", |state| {
        while state.keep_running() {
            std::hint::black_box(0_u64);
        }
    });
    b.iterations(50).repetitions(3);
    let instances = b.instances();

    let buf = SharedBuf::default();
    let mut display = ConsoleReporter::new(
        Box::new(buf.clone()),
        Box::new(std::io::sink()),
        OutputOptions::default(),
    );

    run_benchmarks(&instances, &mut display, None, &settings(10.0, 1)).unwrap();

    let out = buf.contents();
    assert_eq!(out.matches("bm_orch ").count(), 3);
    assert!(out.contains("bm_orch_mean"));
    assert!(out.contains("bm_orch_median"));
    assert!(out.contains("bm_orch_stddev"));
}

/// The file reporter receives the same records; JSON output is one document
/// with all benchmarks.
#[test]
fn file_reporter_receives_runs() {
    let mut b = Benchmark::new("bm_file", |state| {
        while state.keep_running() {
            std::hint::black_box(0_u64);
        }
    });
    b.iterations(20);
    let instances = b.instances();

    let display_buf = SharedBuf::default();
    let mut display = ConsoleReporter::new(
        Box::new(display_buf.clone()),
        Box::new(std::io::sink()),
        OutputOptions::default(),
    );

    let file_buf = SharedBuf::default();
    let mut file = JsonReporter::new(Box::new(file_buf.clone()), Box::new(std::io::sink()));

    run_benchmarks(
        &instances,
        &mut display,
        Some(&mut file),
        &settings(10.0, 1),
    )
    .unwrap();

    let doc: serde_json::Value = serde_json::from_str(&file_buf.contents()).unwrap();
    let benchmarks = doc["benchmarks"].as_array().unwrap();
    assert_eq!(benchmarks.len(), 1);
    assert_eq!(benchmarks[0]["name"], "bm_file");
    assert_eq!(benchmarks[0]["iterations"], 20);
}
