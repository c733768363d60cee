//! JSON Reporter
//!
//! Accumulates run records and emits a single `{context, benchmarks}`
//! document at finalize, pretty-printed.

use std::io::Write;

use serde_json::{json, Map, Value};

use crate::reporter::{ReportError, Reporter, Streams};
use crate::run::{Context, Run};

/// Reporter producing a machine-readable JSON document.
pub struct JsonReporter {
    streams: Streams,
    context: Option<Value>,
    benchmarks: Vec<Value>,
}

impl JsonReporter {
    /// A JSON reporter writing to the given streams.
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            streams: Streams { out, err },
            context: None,
            benchmarks: Vec::new(),
        }
    }

    fn run_to_value(run: &Run) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), json!(run.benchmark_name));

        if run.error_occurred {
            obj.insert("error_occurred".to_string(), json!(true));
            obj.insert("error_message".to_string(), json!(run.error_message));
        }

        if !run.report_big_o && !run.report_rms {
            obj.insert("iterations".to_string(), json!(run.iterations));
        }
        obj.insert("real_time".to_string(), json!(run.adjusted_real_time()));
        obj.insert("cpu_time".to_string(), json!(run.adjusted_cpu_time()));

        if run.report_big_o {
            obj.insert("big_o".to_string(), json!(run.complexity.label()));
        } else if run.report_rms {
            obj.insert("rms".to_string(), json!(run.adjusted_real_time()));
        } else {
            obj.insert("time_unit".to_string(), json!(run.time_unit.suffix()));
        }

        if run.bytes_per_second > 0.0 {
            obj.insert("bytes_per_second".to_string(), json!(run.bytes_per_second));
        }
        if run.items_per_second > 0.0 {
            obj.insert("items_per_second".to_string(), json!(run.items_per_second));
        }
        if !run.report_label.is_empty() {
            obj.insert("label".to_string(), json!(run.report_label));
        }
        for (name, counter) in &run.counters {
            obj.insert(name.clone(), json!(counter.value));
        }
        if run.has_memory_result {
            obj.insert("allocs_per_iter".to_string(), json!(run.allocs_per_iter));
            obj.insert("max_bytes_used".to_string(), json!(run.max_bytes_used));
        }

        Value::Object(obj)
    }
}

impl Reporter for JsonReporter {
    fn report_context(&mut self, ctx: &Context) -> bool {
        self.context = Some(json!({
            "date": ctx.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            "executable": ctx.executable_name,
            "num_cpus": ctx.num_cpus,
            "cpu_model": ctx.cpu_model,
            "library_build_type": ctx.build_type,
        }));
        true
    }

    fn report_runs(&mut self, runs: &[Run]) -> Result<(), ReportError> {
        self.benchmarks.extend(runs.iter().map(Self::run_to_value));
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ReportError> {
        let document = json!({
            "context": self.context.take().unwrap_or(Value::Null),
            "benchmarks": std::mem::take(&mut self.benchmarks),
        });
        let rendered = serde_json::to_string_pretty(&document)?;
        writeln!(self.streams.out, "{rendered}")?;
        Ok(())
    }

    fn flush(&mut self) {
        self.streams.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsebench_core::{Complexity, Counter, TimeUnit};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn render(runs: &[Run]) -> Value {
        let buf = SharedBuf::default();
        let mut reporter = JsonReporter::new(Box::new(buf.clone()), Box::new(std::io::sink()));
        reporter.report_context(&Context::new(10));
        reporter.report_runs(runs).unwrap();
        reporter.finalize().unwrap();

        let bytes = buf.0.lock().unwrap().clone();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn document_has_context_and_benchmarks() {
        let run = Run {
            benchmark_name: "bm_json".to_string(),
            iterations: 10,
            real_accumulated_time: 1e-6,
            cpu_accumulated_time: 2e-6,
            time_unit: TimeUnit::Nanosecond,
            ..Run::default()
        };
        let doc = render(&[run]);

        assert!(doc["context"]["num_cpus"].as_u64().unwrap() >= 1);
        let bench = &doc["benchmarks"][0];
        assert_eq!(bench["name"], "bm_json");
        assert_eq!(bench["iterations"], 10);
        assert_eq!(bench["time_unit"], "ns");
        assert!((bench["real_time"].as_f64().unwrap() - 100.0).abs() < 1e-9);
        assert!(bench.get("error_occurred").is_none());
    }

    #[test]
    fn error_fields_appear_only_on_errors() {
        let run = Run {
            benchmark_name: "bm_err".to_string(),
            error_occurred: true,
            error_message: "oops".to_string(),
            ..Run::default()
        };
        let doc = render(&[run]);
        let bench = &doc["benchmarks"][0];
        assert_eq!(bench["error_occurred"], true);
        assert_eq!(bench["error_message"], "oops");
    }

    #[test]
    fn big_o_records_use_complexity_label() {
        let run = Run {
            benchmark_name: "bm_family_BigO".to_string(),
            iterations: 0,
            complexity: Complexity::N,
            report_big_o: true,
            ..Run::default()
        };
        let doc = render(&[run]);
        let bench = &doc["benchmarks"][0];
        assert_eq!(bench["big_o"], "N");
        assert!(bench.get("iterations").is_none());
        assert!(bench.get("time_unit").is_none());
    }

    #[test]
    fn counters_are_inlined() {
        let mut run = Run {
            benchmark_name: "bm_counters".to_string(),
            ..Run::default()
        };
        run.counters
            .insert("cache_misses".to_string(), Counter::new(12.5));
        let doc = render(&[run]);
        assert_eq!(doc["benchmarks"][0]["cache_misses"], 12.5);
    }

    #[test]
    fn memory_results_included_when_present() {
        let run = Run {
            benchmark_name: "bm_mem".to_string(),
            has_memory_result: true,
            allocs_per_iter: 2.0,
            max_bytes_used: 8192,
            ..Run::default()
        };
        let doc = render(&[run]);
        let bench = &doc["benchmarks"][0];
        assert_eq!(bench["allocs_per_iter"], 2.0);
        assert_eq!(bench["max_bytes_used"], 8192);
    }
}
