//! # PulseBench
//!
//! Microbenchmark harness for Rust.
//!
//! PulseBench measures how long a piece of code takes by converging an
//! iteration count onto a target measurement duration, running the timed
//! region on one or more coordinated threads, and reporting per-iteration
//! real and CPU time with optional throughput rates, user counters, summary
//! statistics, and asymptotic-complexity fits.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pulsebench::prelude::*;
//!
//! fn bm_sum(state: &mut State) {
//!     let data: Vec<u64> = (0..1024).collect();
//!     while state.keep_running() {
//!         std::hint::black_box(data.iter().sum::<u64>());
//!     }
//!     state.set_items_processed(1024 * state.iterations());
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut b = Benchmark::new("bm_sum", bm_sum);
//!     b.range(64, 64 << 10).threads(1).threads(4);
//!     register(b);
//!     pulsebench::run()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Multi-threaded benchmarks
//!
//! A benchmark configured with `threads(n)` runs its body on `n` threads
//! that enter and leave the timed region together; iteration counts and
//! byte/item totals are summed across threads, wall time is averaged, and
//! CPU time is summed.

// Re-export the engine surface.
pub use pulsebench_core::{
    clear_registry, collect_instances, current_allocation, is_zero, memory_manager, register,
    register_memory_manager, reset_allocation_counter, run_one, run_one_serial,
    AggregationReportMode, Benchmark, BenchmarkDecl, BenchmarkFn, Complexity, ComplexityFn,
    Counter, CounterFlags, Instance, MemoryManager, MemoryResult, OneK, RunResult, State,
    Statistic, StatisticsFn, ThreadManager, ThreadTimer, TimeUnit, TrackingAllocator,
    UserCounters,
};

// Re-export reporting.
pub use pulsebench_report::{
    create_reporter, ConsoleReporter, Context, CsvReporter, JsonReporter, OutputFormat,
    OutputOptions, ReportError, Reporter, Run,
};

// Re-export numeric routines.
pub use pulsebench_stats::{coefficient_of_variation, least_sq, mean, median, stdev, LeastSq};

// Re-export the harness.
pub use pulsebench_cli::{
    compute_big_o, compute_stats, run, run_benchmark, run_benchmarks, run_with_cli, Cli,
    EngineSettings, PulsebenchConfig, RunResults, MAX_ITERATIONS,
};

/// Prelude for benchmark binaries.
pub mod prelude {
    pub use crate::{
        register, run, Benchmark, Complexity, Counter, CounterFlags, State, TimeUnit,
    };
}
