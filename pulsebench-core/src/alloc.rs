//! Allocation Tracking
//!
//! A `GlobalAlloc` wrapper counting allocations and peak live bytes with
//! relaxed atomics, plus a [`MemoryManager`] implementation over those
//! counters so a benchmark binary gets allocation accounting by declaring:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: TrackingAllocator = TrackingAllocator;
//!
//! fn main() {
//!     pulsebench_core::register_memory_manager(&ALLOC);
//!     // ...
//! }
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::memory::{MemoryManager, MemoryResult};

static ALLOC_COUNT: AtomicU64 = AtomicU64::new(0);
static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static PEAK_BYTES: AtomicU64 = AtomicU64::new(0);

// Snapshots taken by MemoryManager::start.
static START_ALLOCS: AtomicU64 = AtomicU64::new(0);

/// Allocator wrapper that counts allocations and tracks peak live bytes.
pub struct TrackingAllocator;

// SAFETY: defers all allocation to `System`; the counters are simple
// relaxed atomics and never allocate themselves.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
            let live = LIVE_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed)
                + layout.size() as u64;
            PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        LIVE_BYTES.fetch_sub(layout.size() as u64, Ordering::Relaxed);
    }
}

/// Current `(allocation count, peak live bytes)` since the last reset.
pub fn current_allocation() -> (u64, u64) {
    (
        ALLOC_COUNT.load(Ordering::Relaxed),
        PEAK_BYTES.load(Ordering::Relaxed),
    )
}

/// Reset the allocation counter and fold the peak down to the current live
/// size.
pub fn reset_allocation_counter() {
    ALLOC_COUNT.store(0, Ordering::Relaxed);
    PEAK_BYTES.store(LIVE_BYTES.load(Ordering::Relaxed), Ordering::Relaxed);
}

impl MemoryManager for TrackingAllocator {
    fn start(&self) {
        START_ALLOCS.store(ALLOC_COUNT.load(Ordering::Relaxed), Ordering::Relaxed);
        PEAK_BYTES.store(LIVE_BYTES.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    fn stop(&self) -> MemoryResult {
        MemoryResult {
            num_allocs: ALLOC_COUNT
                .load(Ordering::Relaxed)
                .saturating_sub(START_ALLOCS.load(Ordering::Relaxed)),
            max_bytes_used: PEAK_BYTES.load(Ordering::Relaxed),
        }
    }
}
