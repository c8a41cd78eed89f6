//! Allocator statistics tracking
//!
//! Single-threaded counterpart of the usual atomic statistics recorders:
//! the allocators carry no synchronization, so plain `Cell` counters do.

use core::cell::Cell;

/// Statistics snapshot for memory allocators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Bytes currently allocated
    pub allocated_bytes: usize,
    /// Peak bytes allocated
    pub peak_allocated_bytes: usize,
    /// Total number of allocations
    pub allocation_count: usize,
    /// Total number of deallocations
    pub deallocation_count: usize,
    /// Number of allocations physically moved by defragmentation
    pub relocation_count: usize,
    /// Number of failed allocations
    pub failed_allocations: usize,
    /// Total bytes ever allocated (cumulative)
    pub total_bytes_allocated: usize,
    /// Total bytes ever deallocated (cumulative)
    pub total_bytes_deallocated: usize,
}

impl AllocatorStats {
    /// Creates a new empty stats object
    pub const fn new() -> Self {
        Self {
            allocated_bytes: 0,
            peak_allocated_bytes: 0,
            allocation_count: 0,
            deallocation_count: 0,
            relocation_count: 0,
            failed_allocations: 0,
            total_bytes_allocated: 0,
            total_bytes_deallocated: 0,
        }
    }

    /// Calculate the average allocation size
    pub fn average_allocation_size(&self) -> Option<f64> {
        if self.allocation_count > 0 {
            Some(self.total_bytes_allocated as f64 / self.allocation_count as f64)
        } else {
            None
        }
    }

    /// Fraction of allocation attempts that succeeded (0.0 to 1.0)
    pub fn allocation_efficiency(&self) -> f64 {
        let attempts = self.allocation_count + self.failed_allocations;
        if attempts > 0 {
            self.allocation_count as f64 / attempts as f64
        } else {
            1.0
        }
    }
}

/// Cell-based statistics recorder
///
/// Recording is skipped entirely when disabled through the allocator
/// configuration; `snapshot` then returns `None`.
#[derive(Debug)]
pub(crate) struct CellStats {
    enabled: bool,
    inner: Cell<AllocatorStats>,
}

impl CellStats {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            inner: Cell::new(AllocatorStats::new()),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn record_allocation(&self, bytes: usize) {
        if !self.enabled {
            return;
        }
        let mut stats = self.inner.get();
        stats.allocation_count += 1;
        stats.allocated_bytes += bytes;
        stats.total_bytes_allocated += bytes;
        stats.peak_allocated_bytes = stats.peak_allocated_bytes.max(stats.allocated_bytes);
        self.inner.set(stats);
    }

    pub(crate) fn record_deallocation(&self, bytes: usize) {
        if !self.enabled {
            return;
        }
        let mut stats = self.inner.get();
        stats.deallocation_count += 1;
        stats.allocated_bytes = stats.allocated_bytes.saturating_sub(bytes);
        stats.total_bytes_deallocated += bytes;
        self.inner.set(stats);
    }

    pub(crate) fn record_relocation(&self) {
        if !self.enabled {
            return;
        }
        let mut stats = self.inner.get();
        stats.relocation_count += 1;
        self.inner.set(stats);
    }

    pub(crate) fn record_failure(&self) {
        if !self.enabled {
            return;
        }
        let mut stats = self.inner.get();
        stats.failed_allocations += 1;
        self.inner.set(stats);
    }

    pub(crate) fn snapshot(&self) -> Option<AllocatorStats> {
        self.enabled.then(|| self.inner.get())
    }

    pub(crate) fn reset(&self) {
        self.inner.set(AllocatorStats::new());
    }
}

/// Statistics access for allocators
pub trait StatisticsProvider {
    /// Returns a snapshot of the current statistics
    ///
    /// Returns zeroed statistics when tracking is disabled by configuration.
    fn statistics(&self) -> AllocatorStats;

    /// Resets statistics to zero
    fn reset_statistics(&self);

    /// Whether statistics are being tracked
    fn statistics_enabled(&self) -> bool {
        true
    }
}
