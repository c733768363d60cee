//! Benchmark Definitions
//!
//! The `Benchmark` builder describes a family: a body plus argument tuples,
//! thread counts, timing flags, and reporting options. `instances()` expands
//! a family into the concrete `Instance`s the engine actually measures, one
//! per (argument tuple × thread count).

use std::sync::Arc;

use pulsebench_stats::{mean, median, stdev};

use crate::state::State;

/// A benchmark body: drives the [`State`] loop on one thread of a run.
pub type BenchmarkFn = Arc<dyn Fn(&mut State<'_>) + Send + Sync>;

/// A user statistic reducing the repetition values of one quantity.
pub type StatisticsFn = fn(&[f64]) -> f64;

/// A fitting curve for user-defined asymptotic complexity.
pub type ComplexityFn = fn(i64) -> f64;

/// A named statistic computed across repetitions.
#[derive(Debug, Clone)]
pub struct Statistic {
    /// Suffix appended to the benchmark name in aggregate records.
    pub name: String,
    /// Reducer over the per-repetition values.
    pub compute: StatisticsFn,
}

impl Statistic {
    /// A named reducer.
    pub fn new(name: impl Into<String>, compute: StatisticsFn) -> Self {
        Self {
            name: name.into(),
            compute,
        }
    }
}

/// Unit used when reporting per-iteration times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    /// Report in nanoseconds.
    #[default]
    Nanosecond,
    /// Report in microseconds.
    Microsecond,
    /// Report in milliseconds.
    Millisecond,
}

impl TimeUnit {
    /// Factor converting seconds into this unit.
    pub fn multiplier(self) -> f64 {
        match self {
            TimeUnit::Nanosecond => 1e9,
            TimeUnit::Microsecond => 1e6,
            TimeUnit::Millisecond => 1e3,
        }
    }

    /// Display suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Nanosecond => "ns",
            TimeUnit::Microsecond => "us",
            TimeUnit::Millisecond => "ms",
        }
    }
}

/// Asymptotic complexity class used for the family-level fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Complexity {
    /// No complexity fit requested.
    #[default]
    None,
    /// Constant.
    O1,
    /// Logarithmic.
    LogN,
    /// Linear.
    N,
    /// Linearithmic.
    NLogN,
    /// Quadratic.
    NSquared,
    /// Cubic.
    NCubed,
    /// Exponential.
    TwoPowN,
    /// Factorial.
    Factorial,
    /// User-supplied fitting curve.
    Lambda,
}

impl Complexity {
    /// Human-readable label used by reporters, e.g. `N^2`.
    pub fn label(self) -> &'static str {
        match self {
            Complexity::None => "",
            Complexity::O1 => "(1)",
            Complexity::LogN => "lgN",
            Complexity::N => "N",
            Complexity::NLogN => "NlgN",
            Complexity::NSquared => "N^2",
            Complexity::NCubed => "N^3",
            Complexity::TwoPowN => "2^N",
            Complexity::Factorial => "N!",
            Complexity::Lambda => "f(N)",
        }
    }
}

/// Per-benchmark override of the aggregate-only reporting flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregationReportMode(u32);

impl AggregationReportMode {
    /// No override; the global flags decide.
    pub const UNSPECIFIED: AggregationReportMode = AggregationReportMode(0);
    /// Override is present (even if neither suppression bit is set).
    pub const DEFAULT: AggregationReportMode = AggregationReportMode(1 << 0);
    /// Suppress non-aggregates in file output.
    pub const FILE_AGGREGATES_ONLY: AggregationReportMode = AggregationReportMode(1 << 0 | 1 << 1);
    /// Suppress non-aggregates in display output.
    pub const DISPLAY_AGGREGATES_ONLY: AggregationReportMode =
        AggregationReportMode(1 << 0 | 1 << 2);
    /// Suppress non-aggregates everywhere.
    pub const AGGREGATES_ONLY: AggregationReportMode = AggregationReportMode(1 << 0 | 1 << 1 | 1 << 2);

    /// Whether any override was set.
    pub fn is_specified(self) -> bool {
        self.0 != 0
    }

    /// Whether the file-suppression bit is set.
    pub fn file_aggregates_only(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    /// Whether the display-suppression bit is set.
    pub fn display_aggregates_only(self) -> bool {
        self.0 & (1 << 2) != 0
    }
}

impl std::ops::BitOr for AggregationReportMode {
    type Output = AggregationReportMode;

    fn bitor(self, rhs: AggregationReportMode) -> AggregationReportMode {
        AggregationReportMode(self.0 | rhs.0)
    }
}

/// One concrete (arguments, thread count, flags) expansion of a benchmark,
/// immutable during execution.
#[derive(Clone)]
pub struct Instance {
    /// Full display name, e.g. `bm_sort/4096/threads:2`.
    pub name: String,
    /// The benchmark body.
    pub body: BenchmarkFn,
    /// Argument tuple handed to the body via `State::range`.
    pub args: Vec<i64>,
    /// Threads participating in the timed region.
    pub threads: usize,
    /// Explicit iteration count; 0 means the engine converges one.
    pub iterations: u64,
    /// Repetition count; 0 means the global default applies.
    pub repetitions: u64,
    /// Convergence target in seconds; 0 means the global default applies.
    pub min_time: f64,
    /// Converge and report on wall-clock rather than CPU time.
    pub use_real_time: bool,
    /// Converge and report on manually-reported time.
    pub use_manual_time: bool,
    /// Unit for reported per-iteration times.
    pub time_unit: TimeUnit,
    /// Complexity class for the family-level fit.
    pub complexity: Complexity,
    /// User fitting curve when `complexity` is [`Complexity::Lambda`].
    pub complexity_lambda: Option<ComplexityFn>,
    /// Statistics computed across repetitions.
    pub statistics: Vec<Statistic>,
    /// Per-benchmark aggregate-only override.
    pub aggregation_report_mode: AggregationReportMode,
    /// Whether this is the final instance of its family; triggers the
    /// complexity fit.
    pub last_benchmark_instance: bool,
}

/// A benchmark family under construction.
///
/// Builder methods mutate in place and chain, so a registration reads:
///
/// ```ignore
/// let mut b = Benchmark::new("bm_copy", |state| { /* ... */ });
/// b.range(8, 8 << 10).threads(4).use_real_time();
/// pulsebench_core::register(b);
/// ```
pub struct Benchmark {
    name: String,
    body: BenchmarkFn,
    args: Vec<Vec<i64>>,
    thread_counts: Vec<usize>,
    range_multiplier: i64,
    iterations: u64,
    repetitions: u64,
    min_time: f64,
    use_real_time: bool,
    use_manual_time: bool,
    time_unit: TimeUnit,
    complexity: Complexity,
    complexity_lambda: Option<ComplexityFn>,
    statistics: Vec<Statistic>,
    aggregation_report_mode: AggregationReportMode,
}

impl Benchmark {
    /// A family with defaults: one single-threaded instance, no arguments,
    /// engine-converged iterations, mean/median/stddev statistics.
    pub fn new(name: impl Into<String>, body: impl Fn(&mut State<'_>) + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            body: Arc::new(body),
            args: Vec::new(),
            thread_counts: Vec::new(),
            range_multiplier: 8,
            iterations: 0,
            repetitions: 0,
            min_time: 0.0,
            use_real_time: false,
            use_manual_time: false,
            time_unit: TimeUnit::default(),
            complexity: Complexity::None,
            complexity_lambda: None,
            statistics: vec![
                Statistic::new("mean", mean),
                Statistic::new("median", median),
                Statistic::new("stddev", stdev),
            ],
            aggregation_report_mode: AggregationReportMode::UNSPECIFIED,
        }
    }

    /// The family name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an instance with a single argument.
    pub fn arg(&mut self, value: i64) -> &mut Self {
        self.args.push(vec![value]);
        self
    }

    /// Add an instance with an argument tuple.
    pub fn args(&mut self, values: &[i64]) -> &mut Self {
        self.args.push(values.to_vec());
        self
    }

    /// Add instances covering `[lo, hi]` at the range multiplier's powers.
    pub fn range(&mut self, lo: i64, hi: i64) -> &mut Self {
        let mut values = Vec::new();
        add_range(&mut values, lo, hi, self.range_multiplier);
        for v in values {
            self.args.push(vec![v]);
        }
        self
    }

    /// Multiplier used by [`Self::range`] (default 8).
    pub fn range_multiplier(&mut self, multiplier: i64) -> &mut Self {
        assert!(multiplier >= 2, "range multiplier must be at least 2");
        self.range_multiplier = multiplier;
        self
    }

    /// Add instances running on `threads` concurrent threads.
    pub fn threads(&mut self, threads: usize) -> &mut Self {
        assert!(threads >= 1, "thread count must be at least 1");
        self.thread_counts.push(threads);
        self
    }

    /// Fix the iteration count, disabling convergence.
    pub fn iterations(&mut self, iterations: u64) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Repeat the whole measurement this many times.
    pub fn repetitions(&mut self, repetitions: u64) -> &mut Self {
        self.repetitions = repetitions;
        self
    }

    /// Per-family convergence target in seconds.
    pub fn min_time(&mut self, seconds: f64) -> &mut Self {
        assert!(seconds > 0.0, "min_time must be positive");
        self.min_time = seconds;
        self
    }

    /// Converge on wall-clock time instead of CPU time.
    pub fn use_real_time(&mut self) -> &mut Self {
        assert!(
            !self.use_manual_time,
            "real time and manual time are mutually exclusive"
        );
        self.use_real_time = true;
        self
    }

    /// Converge on manually-reported iteration time.
    pub fn use_manual_time(&mut self) -> &mut Self {
        assert!(
            !self.use_real_time,
            "real time and manual time are mutually exclusive"
        );
        self.use_manual_time = true;
        self
    }

    /// Unit for reported per-iteration times.
    pub fn unit(&mut self, unit: TimeUnit) -> &mut Self {
        self.time_unit = unit;
        self
    }

    /// Request a family-level complexity fit against `complexity`.
    pub fn complexity(&mut self, complexity: Complexity) -> &mut Self {
        self.complexity = complexity;
        self
    }

    /// Request a complexity fit against a user-supplied curve.
    pub fn complexity_with(&mut self, curve: ComplexityFn) -> &mut Self {
        self.complexity = Complexity::Lambda;
        self.complexity_lambda = Some(curve);
        self
    }

    /// Register an additional statistic across repetitions.
    pub fn compute_statistic(&mut self, name: impl Into<String>, compute: StatisticsFn) -> &mut Self {
        self.statistics.push(Statistic::new(name, compute));
        self
    }

    /// Override the aggregate-only reporting flags for this family.
    pub fn aggregation_report_mode(&mut self, mode: AggregationReportMode) -> &mut Self {
        self.aggregation_report_mode = mode;
        self
    }

    /// Expand this family into concrete instances, one per (argument tuple ×
    /// thread count), marking the final one.
    pub fn instances(&self) -> Vec<Instance> {
        let no_args = [Vec::new()];
        let arg_tuples: &[Vec<i64>] = if self.args.is_empty() {
            &no_args
        } else {
            &self.args
        };
        let threads_specified = !self.thread_counts.is_empty();
        let thread_counts: &[usize] = if threads_specified {
            &self.thread_counts
        } else {
            &[1]
        };

        let mut out = Vec::with_capacity(arg_tuples.len() * thread_counts.len());
        for (tuple_index, args) in arg_tuples.iter().enumerate() {
            let last_tuple = tuple_index + 1 == arg_tuples.len();
            for &threads in thread_counts {
                let mut name = self.name.clone();
                for arg in args {
                    name.push('/');
                    name.push_str(&arg.to_string());
                }
                if threads_specified {
                    name.push_str(&format!("/threads:{threads}"));
                }
                out.push(Instance {
                    name,
                    body: Arc::clone(&self.body),
                    args: args.clone(),
                    threads,
                    iterations: self.iterations,
                    repetitions: self.repetitions,
                    min_time: self.min_time,
                    use_real_time: self.use_real_time,
                    use_manual_time: self.use_manual_time,
                    time_unit: self.time_unit,
                    complexity: self.complexity,
                    complexity_lambda: self.complexity_lambda,
                    statistics: self.statistics.clone(),
                    aggregation_report_mode: self.aggregation_report_mode,
                    // Marked on every instance of the final argument tuple so
                    // the family-level complexity fit still fires when a
                    // later filter drops some thread-count expansions.
                    last_benchmark_instance: last_tuple,
                });
            }
        }
        out
    }
}

// Expansion used by `Benchmark::range`: lo, then every power of `mult`
// strictly between lo and hi, then hi.
fn add_range(dst: &mut Vec<i64>, lo: i64, hi: i64, mult: i64) {
    assert!(lo >= 0, "range lower bound must be non-negative");
    assert!(hi >= lo, "range upper bound must not be below the lower bound");
    assert!(mult >= 2);

    dst.push(lo);
    let mut i: i64 = 1;
    while i < i64::MAX / mult {
        if i >= hi {
            break;
        }
        if i > lo {
            dst.push(i);
        }
        i *= mult;
    }
    if hi != lo {
        dst.push(hi);
    }
}
