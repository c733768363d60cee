//! PulseBench Example Benchmarks
//!
//! Demonstrates the registration surface and serves as a template for your
//! own benchmark suite.
//!
//! Run with:
//!   cargo run --example benchmarks                              # Run everything
//!   cargo run --example benchmarks -- --benchmark_list_tests    # List names
//!   cargo run --example benchmarks -- --benchmark_filter=sort   # Select by regex
//!   cargo run --example benchmarks -- --benchmark_format=json   # JSON output
//!   cargo run --example benchmarks -- --help                    # Show all options

use std::hint::black_box;

use pulsebench::prelude::*;
use pulsebench::State;

/// Simple arithmetic benchmark.
fn bm_addition(state: &mut State) {
    let x = 42u64;
    let y = 17u64;
    while state.keep_running() {
        black_box(black_box(x) + black_box(y));
    }
}

/// Vector sum over a size driven by the benchmark argument.
fn bm_vector_sum(state: &mut State) {
    let len = state.range(0) as usize;
    let data: Vec<i64> = (0..len as i64).collect();
    let mut items = 0_u64;
    while state.keep_running() {
        black_box(data.iter().sum::<i64>());
        items += len as u64;
    }
    state.set_items_processed(items);
    state.set_complexity_n(len as i64);
}

/// Sorting with a per-iteration clone, tracked as bytes processed.
fn bm_sort(state: &mut State) {
    let len = state.range(0) as usize;
    let data: Vec<u64> = (0..len as u64).rev().collect();
    let mut bytes = 0_u64;
    while state.keep_running() {
        let mut scratch = data.clone();
        scratch.sort_unstable();
        black_box(&scratch);
        bytes += (len * std::mem::size_of::<u64>()) as u64;
    }
    state.set_bytes_processed(bytes);
}

/// Contended counter increments across four threads.
fn bm_contended_counter(state: &mut State) {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    while state.keep_running() {
        COUNTER.fetch_add(1, Ordering::Relaxed);
    }
    state
        .counters
        .insert("adds".to_string(), Counter::with_flags(
            state.iterations() as f64,
            CounterFlags::RATE,
        ));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut addition = Benchmark::new("bm_addition", bm_addition);
    addition.iterations(1_000_000);
    register(addition);

    let mut vector_sum = Benchmark::new("bm_vector_sum", bm_vector_sum);
    vector_sum
        .range(64, 64 << 10)
        .complexity(Complexity::N)
        .unit(TimeUnit::Microsecond);
    register(vector_sum);

    let mut sort = Benchmark::new("bm_sort", bm_sort);
    sort.arg(1 << 10).arg(1 << 14);
    register(sort);

    let mut contended = Benchmark::new("bm_contended_counter", bm_contended_counter);
    contended.threads(1).threads(4);
    register(contended);

    pulsebench::run()?;
    Ok(())
}
