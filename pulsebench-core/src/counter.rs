//! User Counters
//!
//! Benchmark bodies accumulate named counters; the engine merges them across
//! threads additively and applies each counter's flag semantics exactly once
//! when a run finishes.

use std::collections::BTreeMap;
use std::ops::{BitOr, BitOrAssign};

/// Behavior flags for a [`Counter`], combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterFlags(u32);

impl CounterFlags {
    /// Report the value as-is.
    pub const NONE: CounterFlags = CounterFlags(0);
    /// Divide by the measured seconds, reporting a per-second rate.
    pub const RATE: CounterFlags = CounterFlags(1 << 0);
    /// Divide by the number of worker threads.
    pub const AVG_THREADS: CounterFlags = CounterFlags(1 << 1);
    /// Multiply by the iteration count (for values constant per iteration).
    pub const ITERATION_INVARIANT: CounterFlags = CounterFlags(1 << 2);
    /// Divide by the iteration count.
    pub const AVG_ITERATIONS: CounterFlags = CounterFlags(1 << 3);
    /// Report the reciprocal; applied after every other flag.
    pub const INVERT: CounterFlags = CounterFlags(1 << 4);

    /// Whether every flag in `other` is set in `self`.
    pub fn contains(self, other: CounterFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CounterFlags {
    type Output = CounterFlags;

    fn bitor(self, rhs: CounterFlags) -> CounterFlags {
        CounterFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CounterFlags {
    fn bitor_assign(&mut self, rhs: CounterFlags) {
        self.0 |= rhs.0;
    }
}

/// Base used when humanizing a counter value for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OneK {
    /// SI prefixes: 1k = 1000.
    #[default]
    Is1000,
    /// Binary prefixes: 1k = 1024.
    Is1024,
}

/// A single named counter value with its reporting semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counter {
    /// Accumulated raw value.
    pub value: f64,
    /// How the value is transformed when the run finishes.
    pub flags: CounterFlags,
    /// Scaling base used by the console humanizer.
    pub one_k: OneK,
}

impl Counter {
    /// A plain counter reporting its raw value.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            flags: CounterFlags::NONE,
            one_k: OneK::Is1000,
        }
    }

    /// A counter with explicit flags.
    pub fn with_flags(value: f64, flags: CounterFlags) -> Self {
        Self {
            value,
            flags,
            one_k: OneK::Is1000,
        }
    }

    /// Apply this counter's flag semantics for a finished run.
    fn finish(&self, iterations: u64, seconds: f64, threads: usize) -> f64 {
        let mut v = self.value;
        if self.flags.contains(CounterFlags::RATE) {
            v /= seconds;
        }
        if self.flags.contains(CounterFlags::AVG_THREADS) {
            v /= threads as f64;
        }
        if self.flags.contains(CounterFlags::ITERATION_INVARIANT) {
            v *= iterations as f64;
        }
        if self.flags.contains(CounterFlags::AVG_ITERATIONS) {
            v /= iterations as f64;
        }
        if self.flags.contains(CounterFlags::INVERT) {
            v = 1.0 / v;
        }
        v
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl From<f64> for Counter {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// Named counters, ordered so reporter output is deterministic.
pub type UserCounters = BTreeMap<String, Counter>;

/// Merge `src` into `dst` per name: values add, flags of the first writer
/// stick, unknown names are inserted.
pub fn increment(dst: &mut UserCounters, src: &UserCounters) {
    for (name, counter) in src {
        match dst.get_mut(name) {
            Some(existing) => existing.value += counter.value,
            None => {
                dst.insert(name.clone(), *counter);
            }
        }
    }
}

/// Apply flag semantics to every counter in place. Must be called exactly
/// once per run, after the per-thread merge.
pub fn finish(counters: &mut UserCounters, iterations: u64, seconds: f64, threads: usize) {
    for counter in counters.values_mut() {
        counter.value = counter.finish(iterations, seconds, threads);
    }
}
