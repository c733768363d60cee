//! Memory Accounting Hook
//!
//! An optional process-wide hook bracketing a small serial re-run of each
//! converged benchmark. Registered at most once at startup; read-only while
//! benchmarks run.

use std::sync::OnceLock;

/// Allocation totals observed between `start` and `stop`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryResult {
    /// Allocations performed during the measured span.
    pub num_allocs: u64,
    /// Peak live bytes during the measured span.
    pub max_bytes_used: u64,
}

/// Accounting hook bracketing the memory-measurement re-run.
pub trait MemoryManager: Send + Sync {
    /// Begin accounting.
    fn start(&self);
    /// Stop accounting and report what was observed.
    fn stop(&self) -> MemoryResult;
}

static MEMORY_MANAGER: OnceLock<&'static dyn MemoryManager> = OnceLock::new();

/// Install the process-wide memory manager. Only the first registration
/// takes effect.
pub fn register_memory_manager(manager: &'static (dyn MemoryManager + 'static)) {
    let _ = MEMORY_MANAGER.set(manager);
}

/// The registered memory manager, if any.
pub fn memory_manager() -> Option<&'static dyn MemoryManager> {
    MEMORY_MANAGER.get().copied()
}
