//! Linear (bump) allocator
//!
//! The simplest member of the family: a monotonically increasing head
//! pointer over a fixed region. There is no per-object deallocation and no
//! destructor bookkeeping; callers that need destructors on rewind use the
//! stack allocator instead. Memory is reclaimed by rewinding to a
//! previously observed mark or by clearing the whole region.
//!
//! ## Invariants
//!
//! - the head only moves forward between marks
//! - `rewind` only moves the head backward; a mark ahead of the current
//!   head is ignored
//! - all returned pointers lie within `[start, start + capacity)`

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::allocator::stats::CellStats;
use crate::allocator::traits::validate_layout;
use crate::allocator::{Allocator, AllocatorStats, MemoryUsage, Resettable, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::region::Backing;
use crate::utils::align_up;

/// Configuration for the linear allocator
#[derive(Debug, Clone)]
pub struct LinearConfig {
    /// Enable statistics tracking
    pub track_stats: bool,
    /// Fill freshly allocated memory with this byte
    pub alloc_pattern: Option<u8>,
    /// Fill rewound memory with this byte
    pub dealloc_pattern: Option<u8>,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) { Some(0xCC) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
        }
    }
}

impl LinearConfig {
    /// Production configuration - no tracking, no fill patterns
    pub fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - full tracking and fill patterns
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
        }
    }
}

/// A position in the linear allocator, captured by [`LinearAllocator::mark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearMark {
    pub(crate) offset: usize,
}

/// Linear allocator over a fixed memory region
///
/// # Memory layout
/// ```text
/// [start]----[alloc1]--[alloc2]--[head]----------[end]
///            <----- allocated ----->  <- available ->
/// ```
pub struct LinearAllocator {
    backing: Backing,
    start: usize,
    end: usize,
    head: Cell<usize>,
    num_allocations: Cell<usize>,
    config: LinearConfig,
    stats: CellStats,
}

impl LinearAllocator {
    /// Creates a new linear allocator with custom configuration
    pub fn with_config(capacity: usize, config: LinearConfig) -> MemoryResult<Self> {
        let backing = Backing::owned(capacity)?;
        Ok(Self::init(backing, config))
    }

    /// Creates a new linear allocator with default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, LinearConfig::default())
    }

    /// Creates a linear allocator over a caller-supplied region
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of `size` bytes for the
    ///   allocator's lifetime
    /// - nothing else may access the region while the allocator is live
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        size: usize,
        config: LinearConfig,
    ) -> MemoryResult<Self> {
        if size == 0 {
            return Err(MemoryError::invalid_config("region capacity cannot be zero"));
        }
        // SAFETY: forwarded caller contract.
        let backing = unsafe { Backing::from_raw_parts(ptr, size) };
        Ok(Self::init(backing, config))
    }

    fn init(backing: Backing, config: LinearConfig) -> Self {
        let start = backing.base() as usize;
        let end = start + backing.len();
        let track_stats = config.track_stats;
        Self {
            backing,
            start,
            end,
            head: Cell::new(start),
            num_allocations: Cell::new(0),
            config,
            stats: CellStats::new(track_stats),
        }
    }

    /// Total capacity of the region
    #[inline]
    pub fn size(&self) -> usize {
        self.backing.len()
    }

    /// Bytes currently allocated
    #[inline]
    pub fn used(&self) -> usize {
        self.head.get() - self.start
    }

    /// Bytes still available
    #[inline]
    pub fn available(&self) -> usize {
        self.end - self.head.get()
    }

    /// Number of allocations made since construction or the last clear
    ///
    /// Rewinding does not decrement this: the allocator cannot know how
    /// many allocations a mark bypasses.
    #[inline]
    pub fn num_allocations(&self) -> usize {
        self.num_allocations.get()
    }

    /// Allocates `layout.size()` bytes aligned to `layout.align()`
    ///
    /// Fails with [`MemoryError::AllocationFailed`] when the region would
    /// overflow; no state is mutated on failure.
    pub fn allocate(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        validate_layout(layout)?;

        let aligned = align_up(self.head.get(), layout.align());
        let new_head = aligned
            .checked_add(layout.size())
            .ok_or_else(|| MemoryError::size_overflow("linear allocation"))?;

        if new_head > self.end {
            self.stats.record_failure();
            return Err(MemoryError::allocation_failed_with_layout(layout));
        }

        self.head.set(new_head);
        self.num_allocations.set(self.num_allocations.get() + 1);
        self.stats.record_allocation(new_head - aligned);

        let ptr = aligned as *mut u8;
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: [aligned, new_head) was just reserved and lies within
            // the region.
            unsafe { core::ptr::write_bytes(ptr, pattern, layout.size()) };
        }

        // SAFETY: aligned >= start > 0.
        Ok(unsafe { NonNull::new_unchecked(ptr) })
    }

    /// Captures the current head position
    #[must_use = "a mark is only useful for a later rewind"]
    pub fn mark(&self) -> LinearMark {
        LinearMark {
            offset: self.head.get() - self.start,
        }
    }

    /// Moves the head back to a previously captured mark
    ///
    /// Rewinding forward is rejected as a no-op: a mark at or ahead of the
    /// current head leaves the allocator untouched.
    ///
    /// # Safety
    /// All pointers handed out after the mark was taken become invalid.
    pub unsafe fn rewind(&self, mark: LinearMark) {
        let target = self.start + mark.offset.min(self.size());
        let head = self.head.get();
        if target >= head {
            return;
        }

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: [target, head) was previously allocated and is being
            // released; it lies within the region.
            unsafe { core::ptr::write_bytes(target as *mut u8, pattern, head - target) };
        }

        self.head.set(target);
        self.stats.record_deallocation(head - target);
    }

    /// Resets the head to the region base
    ///
    /// # Safety
    /// All outstanding pointers become invalid.
    pub unsafe fn clear(&self) {
        // SAFETY: forwarded caller contract.
        unsafe { self.rewind(LinearMark { offset: 0 }) };
        self.num_allocations.set(0);
    }
}

impl Drop for LinearAllocator {
    fn drop(&mut self) {
        // Dropping with live allocations is a fatal usage error; rewind or
        // clear first.
        assert!(
            self.head.get() == self.start,
            "linear allocator dropped with {} bytes still allocated",
            self.used()
        );
    }
}

// SAFETY: allocate returns valid, aligned, disjoint pointers from the
// region; deallocate is a documented no-op (rewind/clear reclaim memory).
unsafe impl Allocator for LinearAllocator {
    unsafe fn allocate(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        LinearAllocator::allocate(self, layout)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        // Linear allocators reclaim memory through rewind() and clear() only.
    }
}

impl MemoryUsage for LinearAllocator {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl Resettable for LinearAllocator {
    unsafe fn reset(&self) {
        // SAFETY: forwarded caller contract.
        unsafe { self.clear() };
    }
}

impl StatisticsProvider for LinearAllocator {
    fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot().unwrap_or_default()
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.stats.enabled()
    }
}
