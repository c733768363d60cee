//! Benchmark Registry
//!
//! Two registration paths feed the same process-global registry:
//!
//! - Static declarations collected through `inventory`, for benchmarks
//!   declared at module scope:
//!
//!   ```ignore
//!   fn bm_parse(state: &mut State) {
//!       while state.keep_running() {
//!           parse(input());
//!       }
//!   }
//!
//!   inventory::submit! {
//!       BenchmarkDecl::new("bm_parse", bm_parse).configure(|b| {
//!           b.range(64, 64 << 10);
//!       })
//!   }
//!   ```
//!
//! - Runtime registration via [`register`], for benchmarks generated
//!   programmatically.
//!
//! The registry is read-only while benchmarks run; mutation is expected to
//! stop before the orchestrator is invoked.

use std::sync::Mutex;

use crate::bench::{Benchmark, Instance};
use crate::state::State;

/// A statically-declared benchmark, collected via `inventory`.
pub struct BenchmarkDecl {
    /// Family name.
    pub name: &'static str,
    /// The benchmark body.
    pub body: fn(&mut State<'_>),
    /// Applied to the builder before instance expansion.
    pub configure: fn(&mut Benchmark),
}

fn no_configure(_: &mut Benchmark) {}

impl BenchmarkDecl {
    /// A declaration with no extra configuration.
    pub const fn new(name: &'static str, body: fn(&mut State<'_>)) -> Self {
        Self {
            name,
            body,
            configure: no_configure,
        }
    }

    /// Attach builder configuration to the declaration.
    pub const fn configure(mut self, configure: fn(&mut Benchmark)) -> Self {
        self.configure = configure;
        self
    }
}

inventory::collect!(BenchmarkDecl);

static REGISTRY: Mutex<Vec<Benchmark>> = Mutex::new(Vec::new());

/// Register a built family at runtime.
pub fn register(benchmark: Benchmark) {
    REGISTRY.lock().unwrap().push(benchmark);
}

/// Drop every runtime-registered family. Static declarations are unaffected.
pub fn clear_registry() {
    REGISTRY.lock().unwrap().clear();
}

/// Expand every registered family (static declarations first, then runtime
/// registrations) into the instance list the orchestrator consumes.
pub fn collect_instances() -> Vec<Instance> {
    let mut out = Vec::new();
    for decl in inventory::iter::<BenchmarkDecl> {
        let mut b = Benchmark::new(decl.name, decl.body);
        (decl.configure)(&mut b);
        out.extend(b.instances());
    }
    for b in REGISTRY.lock().unwrap().iter() {
        out.extend(b.instances());
    }
    out
}
