//! Memory-measurement pass
//!
//! Lives in its own test binary: the memory manager registration is
//! process-global, and these assertions depend on it being the only one.

use std::sync::atomic::{AtomicU64, Ordering};

use pulsebench::{
    register_memory_manager, run_benchmark, Benchmark, EngineSettings, MemoryManager, MemoryResult,
};

struct FixedManager {
    starts: AtomicU64,
    stops: AtomicU64,
}

impl MemoryManager for FixedManager {
    fn start(&self) {
        self.starts.fetch_add(1, Ordering::Relaxed);
    }

    fn stop(&self) -> MemoryResult {
        self.stops.fetch_add(1, Ordering::Relaxed);
        MemoryResult {
            num_allocs: 32,
            max_bytes_used: 4096,
        }
    }
}

static MANAGER: FixedManager = FixedManager {
    starts: AtomicU64::new(0),
    stops: AtomicU64::new(0),
};

#[test]
fn memory_pass_brackets_a_serial_rerun() {
    register_memory_manager(&MANAGER);

    let mut b = Benchmark::new("bm_mem", |state| {
        while state.keep_running() {
            std::hint::black_box(0_u64);
        }
    });
    b.iterations(100);
    let instance = b.instances().remove(0);

    let mut family = Vec::new();
    let results = run_benchmark(
        &instance,
        &EngineSettings {
            min_time: 10.0,
            ..EngineSettings::default()
        },
        &mut family,
    );

    assert_eq!(MANAGER.starts.load(Ordering::Relaxed), 1);
    assert_eq!(MANAGER.stops.load(Ordering::Relaxed), 1);

    let run = &results.non_aggregates[0];
    assert!(run.has_memory_result);
    // The re-run is capped at 16 iterations: 32 allocations over 16.
    assert!((run.allocs_per_iter - 2.0).abs() < 1e-12);
    assert_eq!(run.max_bytes_used, 4096);
}
