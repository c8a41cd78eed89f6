//! Main pool allocator implementation
//!
//! A fixed number of fixed-size slots sized for one payload type. Free
//! slots form an intrusive singly-linked list threaded through the slot
//! storage itself: a slot is either live payload or a free-list link,
//! never both, which is exactly what the slot union expresses.
//!
//! ## Invariants
//!
//! - the free list only contains slots inside the slab
//! - `live` equals the number of slots not on the free list
//! - dropping the pool requires zero outstanding allocations

use core::cell::Cell;
use core::mem::{size_of, ManuallyDrop};
use core::ptr::NonNull;

use super::{PoolBox, PoolConfig};
use crate::allocator::stats::CellStats;
use crate::allocator::{AllocatorStats, MemoryUsage, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::region::RegionCell;

/// One slot of the slab: live payload or a link to the next free slot.
///
/// `repr(C)` keeps both interpretations at offset zero, so a payload
/// pointer and its slot pointer are interchangeable.
#[repr(C)]
pub(crate) union Slot<T> {
    next: Option<NonNull<Slot<T>>>,
    value: ManuallyDrop<T>,
}

/// Pool allocator for values of a single type
///
/// # Memory layout
/// ```text
/// [Slot0][Slot1][Slot2][Slot3]...[SlotN]
///    |      |      |      |
/// [free] -> [free]  [live] [free] -> None
/// ```
pub struct PoolAllocator<T> {
    slots: Box<[RegionCell<Slot<T>>]>,
    head: Cell<Option<NonNull<Slot<T>>>>,
    live: Cell<usize>,
    capacity: usize,
    config: PoolConfig,
    stats: CellStats,
}

impl<T> PoolAllocator<T> {
    /// Creates a pool with `capacity` slots and custom configuration
    pub fn with_config(capacity: usize, config: PoolConfig) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_config("pool capacity cannot be zero"));
        }

        let slots: Box<[RegionCell<Slot<T>>]> = (0..capacity)
            .map(|_| RegionCell::new(Slot { next: None }))
            .collect();

        // Thread the free list through the slots, front to back.
        for i in 0..capacity {
            let next = if i + 1 < capacity {
                // SAFETY: slots[i + 1] is a live cell; its pointer is
                // non-null.
                Some(unsafe { NonNull::new_unchecked(slots[i + 1].get()) })
            } else {
                None
            };
            // SAFETY: exclusive setup access; writing the link
            // interpretation of a free slot.
            unsafe { (*slots[i].get()).next = next };
        }

        let head = Cell::new(Some(
            // SAFETY: capacity > 0, slots[0] exists.
            unsafe { NonNull::new_unchecked(slots[0].get()) },
        ));

        let track_stats = config.track_stats;
        Ok(Self {
            slots,
            head,
            live: Cell::new(0),
            capacity,
            config,
            stats: CellStats::new(track_stats),
        })
    }

    /// Creates a pool with `capacity` slots and default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, PoolConfig::default())
    }

    /// Number of slots in the pool
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live allocations
    #[inline]
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Number of free slots
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity - self.live.get()
    }

    /// Allocates a slot and constructs `value` in place
    ///
    /// Returns a [`PoolBox`] that releases the slot when dropped. Fails
    /// with [`MemoryError::PoolExhausted`] when the free list is empty.
    pub fn allocate(&self, value: T) -> MemoryResult<PoolBox<'_, T>> {
        // SAFETY: pop_free hands out an exclusive, in-slab slot.
        let ptr = unsafe { self.allocate_raw(value)? };
        Ok(PoolBox::from_parts(ptr, self))
    }

    /// Allocates a slot and constructs `value` in place, returning the raw
    /// payload pointer
    ///
    /// # Safety
    /// The caller owns the slot and must release it with exactly one call
    /// to [`deallocate_raw`](Self::deallocate_raw) before the pool is
    /// dropped.
    pub unsafe fn allocate_raw(&self, value: T) -> MemoryResult<NonNull<T>> {
        let Some(slot) = self.head.get() else {
            self.stats.record_failure();
            return Err(MemoryError::pool_exhausted(self.capacity));
        };

        // SAFETY: slot is on the free list, so its link interpretation is
        // active and nothing aliases it.
        let next = unsafe { (*slot.as_ptr()).next };
        self.head.set(next);

        let payload = slot.as_ptr().cast::<T>();
        // SAFETY: the slot is now exclusively ours; writing switches it to
        // the payload interpretation.
        unsafe { payload.write(value) };

        self.live.set(self.live.get() + 1);
        self.stats.record_allocation(size_of::<Slot<T>>());

        // SAFETY: payload comes from a NonNull slot pointer.
        Ok(unsafe { NonNull::new_unchecked(payload) })
    }

    /// Destroys the payload and pushes the slot back on the free list
    ///
    /// # Safety
    /// - `ptr` must come from [`allocate_raw`](Self::allocate_raw) on this
    ///   pool and must not have been deallocated already
    /// - `ptr` must not be used after this call
    pub unsafe fn deallocate_raw(&self, ptr: NonNull<T>) {
        // SAFETY: ptr points at a live payload per the caller contract.
        unsafe { core::ptr::drop_in_place(ptr.as_ptr()) };
        // SAFETY: payload destroyed; caller guarantees single release.
        unsafe { self.release_slot(ptr) };
    }

    /// Returns a slot whose payload has already been destroyed or moved out.
    pub(crate) unsafe fn release_slot(&self, ptr: NonNull<T>) {
        debug_assert!(
            self.owns(ptr),
            "pointer does not belong to this pool's slab"
        );

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: the payload is dead; the slot bytes are ours until the
            // link is written below.
            unsafe {
                core::ptr::write_bytes(ptr.as_ptr().cast::<u8>(), pattern, size_of::<Slot<T>>())
            };
        }

        let slot = ptr.cast::<Slot<T>>();
        // SAFETY: the slot is dead payload storage; writing the link
        // interpretation re-frees it.
        unsafe { (*slot.as_ptr()).next = self.head.get() };
        self.head.set(Some(slot));

        self.live.set(self.live.get() - 1);
        self.stats.record_deallocation(size_of::<Slot<T>>());
    }

    /// Whether `ptr` points at a slot boundary inside this pool's slab.
    fn owns(&self, ptr: NonNull<T>) -> bool {
        let base = self.slots.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        let slot_size = size_of::<RegionCell<Slot<T>>>();
        addr >= base
            && addr < base + self.capacity * slot_size
            && (addr - base) % slot_size == 0
    }
}

impl<T> Drop for PoolAllocator<T> {
    fn drop(&mut self) {
        // Dropping with live allocations is a fatal usage error.
        assert!(
            self.live.get() == 0,
            "pool allocator dropped with {} outstanding allocations",
            self.live.get()
        );
    }
}

impl<T> MemoryUsage for PoolAllocator<T> {
    fn used_memory(&self) -> usize {
        self.live.get() * size_of::<Slot<T>>()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available() * size_of::<Slot<T>>())
    }
}

impl<T> StatisticsProvider for PoolAllocator<T> {
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
