//! Main stack allocator implementation
//!
//! A bump pointer over a fixed region plus an ordered log of type-erased
//! finalizers. Typed allocations of types with a destructor append an entry
//! to the log; rewinding to a marker runs every finalizer logged after the
//! marker in strict LIFO order before lowering the head. Trivially
//! destructible types are never logged.
//!
//! ## Invariants
//!
//! - the head lies within `[start, end]` and only moves forward between
//!   rewinds
//! - finalizer log order matches allocation order
//! - dropping the allocator requires the head to be back at the base (all
//!   scopes closed); a leaked scope is a fatal usage error

use core::alloc::Layout;
use core::cell::{Cell, RefCell};
use core::ptr::NonNull;

use super::{StackConfig, StackMarker};
use crate::allocator::stats::CellStats;
use crate::allocator::traits::validate_layout;
use crate::allocator::{Allocator, AllocatorStats, MemoryUsage, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::region::Backing;
use crate::utils::align_up;

/// Type-erased destructor entry for one allocation (value or array).
struct Finalizer {
    addr: *mut u8,
    count: usize,
    drop_fn: unsafe fn(*mut u8, usize),
}

/// Drops `count` elements of `T` starting at `addr`, last element first.
unsafe fn drop_elements<T>(addr: *mut u8, count: usize) {
    let ptr = addr.cast::<T>();
    for i in (0..count).rev() {
        // SAFETY: the caller guarantees `addr` points at `count` initialized
        // elements of T that have not been dropped yet.
        unsafe { core::ptr::drop_in_place(ptr.add(i)) };
    }
}

/// Stack allocator over a fixed memory region
///
/// # Memory layout
/// ```text
/// [start]----[X]----[Y]----[Z]----[head]--------[end]
///            <--- allocated --->   <- available ->
/// ```
///
/// Memory is reclaimed by rewinding to markers; partial rewinds still run
/// the finalizers of everything they bypass.
pub struct StackAllocator {
    backing: Backing,
    start: usize,
    end: usize,
    head: Cell<usize>,
    num_allocations: Cell<usize>,
    finalizers: RefCell<Vec<Finalizer>>,
    config: StackConfig,
    stats: CellStats,
}

impl StackAllocator {
    /// Creates a new stack allocator with custom configuration
    pub fn with_config(capacity: usize, config: StackConfig) -> MemoryResult<Self> {
        let backing = Backing::owned(capacity)?;
        Ok(Self::init(backing, config))
    }

    /// Creates a new stack allocator with default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::default())
    }

    /// Creates a stack allocator over a caller-supplied region
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of `size` bytes for the
    ///   allocator's lifetime
    /// - nothing else may access the region while the allocator is live
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        size: usize,
        config: StackConfig,
    ) -> MemoryResult<Self> {
        if size == 0 {
            return Err(MemoryError::invalid_config("region capacity cannot be zero"));
        }
        // SAFETY: forwarded caller contract.
        let backing = unsafe { Backing::from_raw_parts(ptr, size) };
        Ok(Self::init(backing, config))
    }

    fn init(backing: Backing, config: StackConfig) -> Self {
        let start = backing.base() as usize;
        let end = start + backing.len();
        let track_stats = config.track_stats;
        Self {
            backing,
            start,
            end,
            head: Cell::new(start),
            num_allocations: Cell::new(0),
            finalizers: RefCell::new(Vec::new()),
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

    /// Number of allocations made since construction or the last full
    /// release
    ///
    /// Partial rewinds do not decrement this: the allocator cannot know
    /// how many allocations a marker bypasses.
    #[inline]
    pub fn num_allocations(&self) -> usize {
        self.num_allocations.get()
    }

    /// Number of pending finalizers
    pub fn pending_finalizers(&self) -> usize {
        self.finalizers.borrow().len()
    }

    /// Allocates raw bytes; no finalizer is logged
    ///
    /// Fails with [`MemoryError::AllocationFailed`] on overflow without
    /// mutating any state.
    pub fn allocate(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        validate_layout(layout)?;

        let aligned = align_up(self.head.get(), layout.align());
        let new_head = aligned
            .checked_add(layout.size())
            .ok_or_else(|| MemoryError::size_overflow("stack allocation"))?;

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

    /// Allocates and constructs a single value
    ///
    /// If `T` has a destructor, it is logged and will run when the
    /// allocation is rewound past.
    ///
    /// The returned pointer is valid until a rewind passes it; reading
    /// through it is the caller's unsafe responsibility.
    pub fn alloc_value<T>(&self, value: T) -> MemoryResult<NonNull<T>> {
        let ptr = self.allocate(Layout::new::<T>())?.cast::<T>();
        // SAFETY: ptr is freshly allocated, aligned and exclusive.
        unsafe { ptr.as_ptr().write(value) };
        self.log_finalizer::<T>(ptr.as_ptr().cast(), 1);
        Ok(ptr)
    }

    /// Allocates and constructs `count` values produced by `f(index)`
    ///
    /// A single finalizer covering the whole array is logged when `T` has a
    /// destructor; elements are dropped last-to-first on rewind.
    pub fn alloc_array_with<T>(
        &self,
        count: usize,
        mut f: impl FnMut(usize) -> T,
    ) -> MemoryResult<NonNull<T>> {
        let layout = Layout::array::<T>(count)
            .map_err(|_| MemoryError::size_overflow("stack array layout"))?;
        let ptr = self.allocate(layout)?.cast::<T>();
        for i in 0..count {
            // SAFETY: i < count, within the allocation just made.
            unsafe { ptr.as_ptr().add(i).write(f(i)) };
        }
        self.log_finalizer::<T>(ptr.as_ptr().cast(), count);
        Ok(ptr)
    }

    /// Allocates `count` clones of `value`
    pub fn alloc_array<T: Clone>(&self, count: usize, value: T) -> MemoryResult<NonNull<T>> {
        self.alloc_array_with(count, |_| value.clone())
    }

    fn log_finalizer<T>(&self, addr: *mut u8, count: usize) {
        if core::mem::needs_drop::<T>() {
            self.finalizers.borrow_mut().push(Finalizer {
                addr,
                count,
                drop_fn: drop_elements::<T>,
            });
        }
    }

    /// Captures the current stack position and finalizer log length
    #[must_use = "a marker is only useful for a later release"]
    pub fn marker(&self) -> StackMarker {
        StackMarker {
            offset: self.head.get() - self.start,
            finalizers: self.finalizers.borrow().len(),
        }
    }

    /// Releases everything allocated after `marker` was taken
    ///
    /// Finalizers logged after the marker run in strict LIFO order, then
    /// the head is lowered. A marker ahead of the current head (or with a
    /// finalizer count ahead of the log) is a contract violation and yields
    /// [`MemoryError::Misuse`] without touching any state.
    pub fn release_to_marker(&self, marker: StackMarker) -> MemoryResult<()> {
        let target = self.start + marker.offset;
        let head = self.head.get();
        if target > head || marker.finalizers > self.finalizers.borrow().len() {
            return Err(MemoryError::misuse("marker is ahead of the current stack state"));
        }

        loop {
            // Pop before running so the log stays consistent even if a
            // finalizer panics.
            let finalizer = {
                let mut log = self.finalizers.borrow_mut();
                if log.len() <= marker.finalizers {
                    break;
                }
                log.pop().expect("log length checked above")
            };
            // SAFETY: the entry was logged for a live allocation above the
            // marker; its elements are initialized and not yet dropped.
            unsafe { (finalizer.drop_fn)(finalizer.addr, finalizer.count) };
        }

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: [target, head) was previously allocated and is being
            // released.
            unsafe { core::ptr::write_bytes(target as *mut u8, pattern, head - target) };
        }

        self.head.set(target);
        self.stats.record_deallocation(head - target);
        Ok(())
    }

    /// Releases every allocation, running all pending finalizers
    pub fn release_all(&self) {
        self.release_to_marker(StackMarker {
            offset: 0,
            finalizers: 0,
        })
        .expect("the base marker is always valid");
        self.num_allocations.set(0);
    }
}

impl Drop for StackAllocator {
    fn drop(&mut self) {
        // Dropping with open scopes is a fatal usage error, not a leak.
        assert!(
            self.head.get() == self.start,
            "stack allocator dropped with {} bytes still allocated; \
             release all scopes first",
            self.used()
        );
    }
}

// SAFETY: allocate returns valid, aligned, disjoint pointers; deallocate is
// a documented no-op because reclamation happens through markers.
unsafe impl Allocator for StackAllocator {
    unsafe fn allocate(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        StackAllocator::allocate(self, layout)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        // Stack allocators reclaim memory through markers only.
    }
}

impl MemoryUsage for StackAllocator {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl StatisticsProvider for StackAllocator {
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
