//! Thread Coordination
//!
//! A `ThreadManager` is constructed fresh for every measured run. It owns the
//! shared result that worker threads fold their accumulators into, the
//! barrier that brackets the timed region, and the completion handshake the
//! main thread waits on.

use std::sync::{Barrier, Condvar, Mutex, MutexGuard};

use crate::counter::UserCounters;

/// Accumulated outcome of one measured run, summed across worker threads
/// under the benchmark mutex.
///
/// After [`crate::run_one`] returns, `real_time_used` and `manual_time_used`
/// hold per-thread averages while `cpu_time_used` stays a sum: CPU time is a
/// resource consumed across all threads, wall time is not.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Total iterations across all threads.
    pub iterations: u64,
    /// Wall-clock seconds (summed per thread, averaged after the join).
    pub real_time_used: f64,
    /// CPU seconds, summed across threads.
    pub cpu_time_used: f64,
    /// Manually-reported seconds (summed per thread, averaged after the join).
    pub manual_time_used: f64,
    /// Bytes processed, summed across threads.
    pub bytes_processed: u64,
    /// Items processed, summed across threads.
    pub items_processed: u64,
    /// Complexity-n input, summed across threads.
    pub complexity_n: i64,
    /// User counters, merged per name.
    pub counters: UserCounters,
    /// Label to attach to the report; last writer wins.
    pub report_label: String,
    /// Whether any thread reported an error. First writer wins.
    pub has_error: bool,
    /// The first error message reported.
    pub error_message: String,
}

/// Coordinates the worker threads of one measured run.
pub struct ThreadManager {
    results: Mutex<RunResult>,
    start_stop: Barrier,
    alive_threads: Mutex<usize>,
    done: Condvar,
}

impl ThreadManager {
    /// A manager for a run with `num_threads` participants.
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads >= 1, "a run needs at least one thread");
        Self {
            results: Mutex::new(RunResult::default()),
            start_stop: Barrier::new(num_threads),
            alive_threads: Mutex::new(num_threads),
            done: Condvar::new(),
        }
    }

    /// Lock the shared result (the "benchmark mutex").
    pub fn lock(&self) -> MutexGuard<'_, RunResult> {
        self.results.lock().unwrap()
    }

    /// Rendezvous that every participating thread must reach before any may
    /// pass. Hit exactly twice per benchmark body: entering and leaving the
    /// timed region.
    pub fn start_stop_barrier(&self) {
        self.start_stop.wait();
    }

    /// Mark the calling thread's work as done, waking the main thread when
    /// the last worker finishes.
    pub fn notify_thread_complete(&self) {
        let mut alive = self.alive_threads.lock().unwrap();
        *alive -= 1;
        if *alive == 0 {
            self.done.notify_all();
        }
    }

    /// Block until every thread has called [`Self::notify_thread_complete`].
    pub fn wait_for_all_threads(&self) {
        let mut alive = self.alive_threads.lock().unwrap();
        while *alive != 0 {
            alive = self.done.wait(alive).unwrap();
        }
    }
}
