//! The Per-Thread Loop Handle
//!
//! `State` is what a benchmark body receives. Its `keep_running` check is the
//! innermost operation of every benchmark, called once per iteration on every
//! thread, so the fast path must stay a predictable decrement-and-branch on a
//! field within the first cache line. The start/stop transitions are factored
//! into a `#[cold]` out-of-line path.

use crate::counter::UserCounters;
use crate::manager::ThreadManager;
use crate::timer::ThreadTimer;

/// Per-thread handle driving one benchmark body through its measured loop.
///
/// Layout is `repr(C)` so the countdown counter sits at offset zero and the
/// error flag stays within the first cache line; both are touched on the loop
/// path and must not straddle lines.
#[repr(C)]
pub struct State<'a> {
    // Countdown cache for the hot loop; 0 outside the timed region.
    total_iterations: u64,
    // Iterations granted beyond the budget by the last keep_running_batch.
    batch_leftover: u64,
    /// Iterations each thread will run; immutable and at least 1.
    pub max_iterations: u64,
    started: bool,
    finished: bool,
    error_occurred: bool,

    range: Vec<i64>,
    bytes_processed: u64,
    items_processed: u64,
    complexity_n: i64,

    /// Counters accumulated by this thread, merged into the shared result in
    /// the run epilogue.
    pub counters: UserCounters,

    /// Index of this thread within the run, in `[0, threads)`.
    pub thread_index: usize,
    /// Number of threads participating in the run.
    pub threads: usize,

    timer: &'a mut ThreadTimer,
    manager: &'a ThreadManager,
}

// The loop-driving fields must be reachable within one cache line of the
// State's address.
const _: () = {
    assert!(std::mem::offset_of!(State<'static>, total_iterations) == 0);
    assert!(std::mem::offset_of!(State<'static>, error_occurred) < 64);
};

impl<'a> State<'a> {
    /// A fresh not-started state for one thread of a run.
    ///
    /// `max_iterations` must be nonzero and `thread_index` must be below
    /// `threads`; both are contract violations otherwise.
    pub fn new(
        max_iterations: u64,
        range: Vec<i64>,
        thread_index: usize,
        threads: usize,
        timer: &'a mut ThreadTimer,
        manager: &'a ThreadManager,
    ) -> Self {
        assert!(max_iterations != 0, "at least one iteration must be run");
        assert!(
            thread_index < threads,
            "thread_index must be less than threads"
        );
        Self {
            total_iterations: 0,
            batch_leftover: 0,
            max_iterations,
            started: false,
            finished: false,
            error_occurred: false,
            range,
            bytes_processed: 0,
            items_processed: 0,
            complexity_n: 0,
            counters: UserCounters::new(),
            thread_index,
            threads,
            timer,
            manager,
        }
    }

    /// Whether the body should run another iteration. Returns `true` exactly
    /// `max_iterations` times per thread.
    ///
    /// The first call enters the timed region: it waits for all threads at
    /// the start barrier and starts the timer. The call after the final
    /// iteration leaves it: the timer stops, then all threads rendezvous
    /// again so nobody's teardown is charged to anyone's measurement.
    #[inline(always)]
    pub fn keep_running(&mut self) -> bool {
        if self.total_iterations != 0 {
            self.total_iterations -= 1;
            return true;
        }
        self.keep_running_slow(1, false)
    }

    /// Batched variant: claims `n` iterations at once, for bodies whose work
    /// items come in groups. The final batch may overshoot the budget; the
    /// overshoot is tracked so `iterations()` stays accurate.
    #[inline(always)]
    pub fn keep_running_batch(&mut self, n: u64) -> bool {
        if self.total_iterations >= n {
            self.total_iterations -= n;
            return true;
        }
        self.keep_running_slow(n, true)
    }

    #[cold]
    fn keep_running_slow(&mut self, n: u64, is_batch: bool) -> bool {
        if !self.started {
            self.start_keep_running();
            if !self.error_occurred && self.total_iterations >= n {
                self.total_iterations -= n;
                return true;
            }
        }
        if is_batch && self.total_iterations != 0 {
            self.batch_leftover = n - self.total_iterations;
            self.total_iterations = 0;
            return true;
        }
        self.finish_keep_running();
        false
    }

    fn start_keep_running(&mut self) {
        assert!(
            !self.started && !self.finished,
            "keep_running() loop restarted on a finished state"
        );
        self.started = true;
        self.total_iterations = if self.error_occurred {
            0
        } else {
            self.max_iterations
        };
        self.manager.start_stop_barrier();
        if !self.error_occurred {
            self.timer.start_timer();
        }
    }

    fn finish_keep_running(&mut self) {
        assert!(
            self.started && (!self.finished || self.error_occurred),
            "keep_running() called again after the loop finished"
        );
        if !self.error_occurred {
            self.timer.stop_timer();
        }
        self.total_iterations = 0;
        self.finished = true;
        self.manager.start_stop_barrier();
    }

    /// Stop the timer without affecting iteration counting. No-op once an
    /// error has been reported.
    pub fn pause_timing(&mut self) {
        if self.error_occurred {
            return;
        }
        assert!(
            self.started && !self.finished,
            "pause_timing() outside the measured loop"
        );
        self.timer.stop_timer();
    }

    /// Restart the timer after [`Self::pause_timing`]. Resuming after an
    /// error is a contract violation.
    pub fn resume_timing(&mut self) {
        assert!(
            self.started && !self.finished && !self.error_occurred,
            "resume_timing() outside the measured loop"
        );
        self.timer.start_timer();
    }

    /// Report the measured duration of the current iteration explicitly,
    /// for benchmarks whose interesting span the wall clock cannot observe.
    pub fn set_iteration_time(&mut self, seconds: f64) {
        self.timer.set_iteration_time(seconds);
    }

    /// Abort this thread's measurement with an error message. The first
    /// message across all threads wins; the remaining iteration budget is
    /// dropped so the next `keep_running()` returns `false`. Other threads
    /// run to completion.
    pub fn skip_with_error(&mut self, msg: &str) {
        self.error_occurred = true;
        {
            let mut results = self.manager.lock();
            if !results.has_error {
                results.error_message = msg.to_string();
                results.has_error = true;
            }
        }
        self.total_iterations = 0;
        if self.timer.running() {
            self.timer.stop_timer();
        }
    }

    /// Attach a label to the run's report. Last writer across threads wins.
    pub fn set_label(&mut self, label: &str) {
        let mut results = self.manager.lock();
        results.report_label = label.to_string();
    }

    /// Iterations completed so far on this thread; equals `max_iterations`
    /// once the loop has finished.
    pub fn iterations(&self) -> u64 {
        if !self.started {
            return 0;
        }
        self.max_iterations - self.total_iterations + self.batch_leftover
    }

    /// Whether this thread reported an error.
    pub fn error_occurred(&self) -> bool {
        self.error_occurred
    }

    /// The benchmark argument at position `index`.
    pub fn range(&self, index: usize) -> i64 {
        self.range[index]
    }

    /// Declare how many bytes each full run of the loop processed; reporters
    /// derive a bytes-per-second rate from it.
    pub fn set_bytes_processed(&mut self, bytes: u64) {
        self.bytes_processed = bytes;
    }

    /// Bytes declared via [`Self::set_bytes_processed`].
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Declare how many items the loop processed.
    pub fn set_items_processed(&mut self, items: u64) {
        self.items_processed = items;
    }

    /// Items declared via [`Self::set_items_processed`].
    pub fn items_processed(&self) -> u64 {
        self.items_processed
    }

    /// Record the problem size for asymptotic-complexity fitting.
    pub fn set_complexity_n(&mut self, n: i64) {
        self.complexity_n = n;
    }

    /// Problem size recorded via [`Self::set_complexity_n`].
    pub fn complexity_n(&self) -> i64 {
        self.complexity_n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_state<R>(max_iterations: u64, f: impl FnOnce(&mut State<'_>) -> R) -> R {
        let manager = ThreadManager::new(1);
        let mut timer = ThreadTimer::new();
        let mut state = State::new(max_iterations, vec![], 0, 1, &mut timer, &manager);
        f(&mut state)
    }

    #[test]
    fn keep_running_returns_true_exactly_max_iterations_times() {
        with_state(10, |state| {
            let mut count = 0;
            while state.keep_running() {
                count += 1;
            }
            assert_eq!(count, 10);
            assert_eq!(state.iterations(), 10);
        });
    }

    #[test]
    fn keep_running_batch_overshoot_is_tracked() {
        with_state(10, |state| {
            let mut claimed = 0;
            while state.keep_running_batch(4) {
                claimed += 4;
            }
            // 4 + 4 + 4: the final batch overshoots the budget of 10 by 2.
            assert_eq!(claimed, 12);
            assert_eq!(state.iterations(), 12);
        });
    }

    #[test]
    fn error_zeroes_remaining_budget() {
        with_state(1000, |state| {
            let mut count = 0;
            while state.keep_running() {
                count += 1;
                if count == 3 {
                    state.skip_with_error("boom");
                }
            }
            assert_eq!(count, 3);
            assert!(state.error_occurred());
        });
    }

    #[test]
    fn error_before_loop_skips_all_iterations() {
        with_state(1000, |state| {
            state.skip_with_error("early");
            let mut count = 0;
            while state.keep_running() {
                count += 1;
            }
            assert_eq!(count, 0);
        });
    }

    #[test]
    fn error_message_is_published_first_writer_wins() {
        let manager = ThreadManager::new(1);
        let mut timer = ThreadTimer::new();
        let mut state = State::new(5, vec![], 0, 1, &mut timer, &manager);

        state.skip_with_error("first");
        state.skip_with_error("second");
        while state.keep_running() {}
        drop(state);

        let results = manager.lock();
        assert!(results.has_error);
        assert_eq!(results.error_message, "first");
    }

    #[test]
    fn pause_after_error_is_noop() {
        with_state(10, |state| {
            while state.keep_running() {
                state.skip_with_error("stop");
                state.pause_timing();
            }
        });
    }

    #[test]
    #[should_panic(expected = "resume_timing")]
    fn resume_after_error_panics() {
        with_state(10, |state| {
            while state.keep_running() {
                state.skip_with_error("stop");
                state.resume_timing();
            }
        });
    }

    #[test]
    fn pause_resume_keeps_iteration_count() {
        with_state(8, |state| {
            let mut count = 0;
            while state.keep_running() {
                state.pause_timing();
                state.resume_timing();
                count += 1;
            }
            assert_eq!(count, 8);
        });
    }

    #[test]
    fn label_last_writer_wins() {
        let manager = ThreadManager::new(1);
        let mut timer = ThreadTimer::new();
        let mut state = State::new(2, vec![], 0, 1, &mut timer, &manager);
        while state.keep_running() {
            state.set_label("working");
        }
        state.set_label("done");
        drop(state);

        assert_eq!(manager.lock().report_label, "done");
    }

    #[test]
    fn range_returns_arguments() {
        let manager = ThreadManager::new(1);
        let mut timer = ThreadTimer::new();
        let state = State::new(1, vec![64, 512], 0, 1, &mut timer, &manager);
        assert_eq!(state.range(0), 64);
        assert_eq!(state.range(1), 512);
    }

    #[test]
    #[should_panic(expected = "at least one iteration")]
    fn zero_max_iterations_panics() {
        with_state(0, |_| {});
    }

    #[test]
    #[should_panic(expected = "less than threads")]
    fn thread_index_out_of_range_panics() {
        let manager = ThreadManager::new(1);
        let mut timer = ThreadTimer::new();
        let _ = State::new(1, vec![], 2, 2, &mut timer, &manager);
    }
}
