//! Run Records and Reporter Context

use chrono::{DateTime, Utc};
use pulsebench_core::{Complexity, ComplexityFn, OneK, Statistic, TimeUnit, UserCounters};

/// Immutable result of one measurement (or one aggregate), as observed by
/// reporters.
#[derive(Debug, Clone)]
pub struct Run {
    /// Full benchmark name, including argument and thread suffixes.
    pub benchmark_name: String,
    /// Whether the run ended via `skip_with_error`.
    pub error_occurred: bool,
    /// First error message reported across threads.
    pub error_message: String,
    /// Label attached via `set_label`; last writer wins.
    pub report_label: String,
    /// Iterations summed across all threads. Zero for complexity records.
    pub iterations: u64,
    /// Unit for per-iteration time display.
    pub time_unit: TimeUnit,
    /// Accumulated wall-clock (or manual) seconds, averaged across threads.
    pub real_accumulated_time: f64,
    /// Accumulated CPU seconds, summed across threads.
    pub cpu_accumulated_time: f64,
    /// Bytes-per-second rate, 0 when not reported.
    pub bytes_per_second: f64,
    /// Items-per-second rate, 0 when not reported.
    pub items_per_second: f64,
    /// Problem size recorded for complexity fitting.
    pub complexity_n: i64,
    /// Complexity class of the family.
    pub complexity: Complexity,
    /// User fitting curve when the class is `Lambda`.
    pub complexity_lambda: Option<ComplexityFn>,
    /// Statistics the repetition driver computes over this run's family.
    pub statistics: Vec<Statistic>,
    /// User counters with flag semantics already applied.
    pub counters: UserCounters,
    /// This record carries fitted complexity coefficients.
    pub report_big_o: bool,
    /// This record carries the normalized rms of the complexity fit.
    pub report_rms: bool,
    /// Whether a memory-measurement pass ran.
    pub has_memory_result: bool,
    /// Allocations per iteration observed by the memory pass.
    pub allocs_per_iter: f64,
    /// Peak bytes observed by the memory pass.
    pub max_bytes_used: u64,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            benchmark_name: String::new(),
            error_occurred: false,
            error_message: String::new(),
            report_label: String::new(),
            iterations: 1,
            time_unit: TimeUnit::default(),
            real_accumulated_time: 0.0,
            cpu_accumulated_time: 0.0,
            bytes_per_second: 0.0,
            items_per_second: 0.0,
            complexity_n: 0,
            complexity: Complexity::None,
            complexity_lambda: None,
            statistics: Vec::new(),
            counters: UserCounters::new(),
            report_big_o: false,
            report_rms: false,
            has_memory_result: false,
            allocs_per_iter: 0.0,
            max_bytes_used: 0,
        }
    }
}

impl Run {
    /// Accumulated real time scaled to the display unit and divided by the
    /// iteration count. Complexity records (iterations = 0) are scaled only.
    pub fn adjusted_real_time(&self) -> f64 {
        let t = self.real_accumulated_time * self.time_unit.multiplier();
        if self.iterations != 0 {
            t / self.iterations as f64
        } else {
            t
        }
    }

    /// Accumulated CPU time scaled like [`Self::adjusted_real_time`].
    pub fn adjusted_cpu_time(&self) -> f64 {
        let t = self.cpu_accumulated_time * self.time_unit.multiplier();
        if self.iterations != 0 {
            t / self.iterations as f64
        } else {
            t
        }
    }
}

/// Header information reporters emit once per invocation.
#[derive(Debug, Clone)]
pub struct Context {
    /// Width of the name column, precomputed by the orchestrator.
    pub name_field_width: usize,
    /// When the run started.
    pub timestamp: DateTime<Utc>,
    /// Name of the running executable.
    pub executable_name: String,
    /// Available CPU cores.
    pub num_cpus: u32,
    /// CPU model string, when the platform exposes one.
    pub cpu_model: String,
    /// "debug" or "release".
    pub build_type: &'static str,
}

impl Context {
    /// Collect host information for a run whose widest name column is
    /// `name_field_width`.
    pub fn new(name_field_width: usize) -> Self {
        Self {
            name_field_width,
            timestamp: Utc::now(),
            executable_name: std::env::current_exe()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "unknown".to_string()),
            num_cpus: std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1),
            cpu_model: cpu_model().unwrap_or_else(|| "unknown".to_string()),
            build_type: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }
}

/// CPU model name from /proc/cpuinfo (Linux only).
fn cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Format a value with k/M/G/T prefixes in the given base, e.g.
/// `humanize(1536.0, OneK::Is1024)` is `"1.5k"`.
pub fn humanize(value: f64, one_k: OneK) -> String {
    let base = match one_k {
        OneK::Is1000 => 1000.0,
        OneK::Is1024 => 1024.0,
    };
    let mut v = value.abs();
    let mut prefix = "";
    for candidate in ["k", "M", "G", "T"] {
        if v < base {
            break;
        }
        v /= base;
        prefix = candidate;
    }
    let sign = if value < 0.0 { "-" } else { "" };
    if prefix.is_empty() && v.fract() == 0.0 {
        format!("{sign}{v:.0}")
    } else {
        format!("{sign}{v:.5}{prefix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjusted_times_divide_by_iterations() {
        let run = Run {
            iterations: 100,
            real_accumulated_time: 1e-3,
            cpu_accumulated_time: 2e-3,
            time_unit: TimeUnit::Nanosecond,
            ..Run::default()
        };
        assert!((run.adjusted_real_time() - 10_000.0).abs() < 1e-6);
        assert!((run.adjusted_cpu_time() - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn complexity_records_are_scaled_only() {
        let run = Run {
            iterations: 0,
            real_accumulated_time: 2.5,
            time_unit: TimeUnit::Microsecond,
            report_big_o: true,
            ..Run::default()
        };
        assert!((run.adjusted_real_time() - 2_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn unit_multiplier_applies() {
        let run = Run {
            iterations: 1,
            real_accumulated_time: 0.5,
            time_unit: TimeUnit::Millisecond,
            ..Run::default()
        };
        assert!((run.adjusted_real_time() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn humanize_prefixes() {
        assert_eq!(humanize(950.0, OneK::Is1000), "950");
        assert_eq!(humanize(1536.0, OneK::Is1024), "1.50000k");
        assert!(humanize(2_000_000.0, OneK::Is1000).ends_with('M'));
        assert!(humanize(-4096.0, OneK::Is1024).starts_with('-'));
    }

    #[test]
    fn context_collects_host_basics() {
        let ctx = Context::new(24);
        assert_eq!(ctx.name_field_width, 24);
        assert!(ctx.num_cpus >= 1);
        assert!(!ctx.executable_name.is_empty());
    }
}
