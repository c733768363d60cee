//! Single Measured Execution
//!
//! `run_one` executes one benchmark instance for a fixed iteration count
//! across its configured threads and returns the merged result. The caller
//! (the convergence loop) decides whether the measurement was long enough.

use crate::bench::Instance;
use crate::counter;
use crate::manager::{RunResult, ThreadManager};
use crate::state::State;
use crate::timer::ThreadTimer;

/// Execute one thread of `b` for `iters` iterations and fold the collected
/// stats into the manager's shared result.
fn run_in_thread(b: &Instance, iters: u64, thread_index: usize, manager: &ThreadManager) {
    let mut timer = ThreadTimer::new();
    let mut state = State::new(
        iters,
        b.args.clone(),
        thread_index,
        b.threads,
        &mut timer,
        manager,
    );
    (b.body)(&mut state);
    assert!(
        state.iterations() >= state.max_iterations,
        "benchmark '{}' returned before State::keep_running() returned false",
        b.name
    );

    let iterations = state.iterations();
    let bytes_processed = state.bytes_processed();
    let items_processed = state.items_processed();
    let complexity_n = state.complexity_n();
    let counters = std::mem::take(&mut state.counters);
    drop(state);

    {
        let mut results = manager.lock();
        results.iterations += iterations;
        results.cpu_time_used += timer.cpu_time_used();
        results.real_time_used += timer.real_time_used();
        results.manual_time_used += timer.manual_time_used();
        results.bytes_processed += bytes_processed;
        results.items_processed += items_processed;
        results.complexity_n += complexity_n;
        counter::increment(&mut results.counters, &counters);
    }
    manager.notify_thread_complete();
}

/// Run `b` once for exactly `iters` iterations per thread.
///
/// Spawns `threads - 1` helpers; the caller acts as thread 0. All threads
/// enter and leave the timed region together via the manager's barrier. In
/// the returned result, `real_time_used` and `manual_time_used` are averages
/// across threads; `cpu_time_used` is the sum.
pub fn run_one(b: &Instance, iters: u64) -> RunResult {
    let manager = ThreadManager::new(b.threads);

    std::thread::scope(|scope| {
        for thread_index in 1..b.threads {
            let manager = &manager;
            scope.spawn(move || run_in_thread(b, iters, thread_index, manager));
        }
        run_in_thread(b, iters, 0, &manager);
        manager.wait_for_all_threads();
    });

    let mut results = manager.lock().clone();
    // Real and manual time were accumulated per thread; the run's wall time
    // is their average. CPU time stays summed: it is a resource consumed
    // across all threads.
    results.real_time_used /= b.threads as f64;
    results.manual_time_used /= b.threads as f64;
    results
}

/// Run `b` once on a single thread regardless of its configured thread
/// count. Used for the memory-measurement pass, where allocator accounting
/// wants a serial execution.
pub fn run_one_serial(b: &Instance, iters: u64) -> RunResult {
    let manager = ThreadManager::new(1);
    run_in_thread(b, iters, 0, &manager);
    manager.wait_for_all_threads();
    let results = manager.lock().clone();
    results
}
