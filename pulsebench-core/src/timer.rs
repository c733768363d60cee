//! Per-Thread Timing
//!
//! Accumulates three clocks independently: wall-clock time from
//! `std::time::Instant`, the calling thread's CPU time, and "manual" time
//! reported explicitly by benchmark bodies via `set_iteration_time`.
//!
//! On unix the CPU clock is `CLOCK_THREAD_CPUTIME_ID`; elsewhere it degrades
//! to wall-clock time.

use std::time::Instant;

/// Seconds of CPU time consumed by the calling thread.
#[cfg(unix)]
fn thread_cpu_now() -> f64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec and the clock id is a
    // constant supported on all unix targets we build for.
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) };
    debug_assert_eq!(rc, 0, "clock_gettime(CLOCK_THREAD_CPUTIME_ID) failed");
    ts.tv_sec as f64 + ts.tv_nsec as f64 * 1e-9
}

#[cfg(not(unix))]
fn thread_cpu_now() -> f64 {
    use std::sync::OnceLock;
    static BASE: OnceLock<Instant> = OnceLock::new();
    BASE.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Per-thread accumulator of real, CPU, and manual seconds.
///
/// One timer exists per worker thread per measured run; the [`crate::State`]
/// loop handle starts and stops it around the timed region.
#[derive(Debug)]
pub struct ThreadTimer {
    running: bool,
    start_real: Instant,
    start_cpu: f64,

    real_time_used: f64,
    cpu_time_used: f64,
    // Manually set iteration time, e.g. for async benchmarks measuring a
    // duration the wall clock cannot observe.
    manual_time_used: f64,
}

impl ThreadTimer {
    /// A stopped timer with all accumulators at zero.
    pub fn new() -> Self {
        Self {
            running: false,
            start_real: Instant::now(),
            start_cpu: 0.0,
            real_time_used: 0.0,
            cpu_time_used: 0.0,
            manual_time_used: 0.0,
        }
    }

    /// Begin a timed span. Starting a running timer is a contract violation.
    pub fn start_timer(&mut self) {
        assert!(!self.running, "start_timer() called on a running timer");
        self.running = true;
        self.start_real = Instant::now();
        self.start_cpu = thread_cpu_now();
    }

    /// End the current span, folding its duration into the accumulators.
    /// Stopping a stopped timer is a contract violation.
    pub fn stop_timer(&mut self) {
        assert!(self.running, "stop_timer() called on a stopped timer");
        self.running = false;
        self.real_time_used += self.start_real.elapsed().as_secs_f64();
        self.cpu_time_used += thread_cpu_now() - self.start_cpu;
    }

    /// Whether a span is currently open.
    pub fn running(&self) -> bool {
        self.running
    }

    /// Fold `seconds` into the manual accumulator, independent of whether the
    /// timer is running.
    pub fn set_iteration_time(&mut self, seconds: f64) {
        self.manual_time_used += seconds;
    }

    /// Accumulated wall-clock seconds.
    pub fn real_time_used(&self) -> f64 {
        self.real_time_used
    }

    /// Accumulated thread CPU seconds.
    pub fn cpu_time_used(&self) -> f64 {
        self.cpu_time_used
    }

    /// Accumulated manually-reported seconds.
    pub fn manual_time_used(&self) -> f64 {
        self.manual_time_used
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}
