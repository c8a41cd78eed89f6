//! Main free-list allocator implementation
//!
//! ## Invariants
//!
//! - free blocks are disjoint, address-ordered, and together with the live
//!   allocations tile the region exactly
//! - every block boundary is usize-aligned (payload spans are padded, so
//!   an in-place `FreeBlock` node can always be written at a boundary)
//! - a handle index is owned by exactly one live allocation; the table
//!   entry is the only authoritative address for it
//! - allocation records stay sorted by current payload address
//!
//! Mutating operations take `&mut self`; reads borrow `&self`. Holding a
//! resolved reference across `defragment()` is therefore a compile error,
//! which is the point of the handle indirection: memory may move, handles
//! never dangle.

use core::alloc::Layout;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

use super::block::{AllocationHeader, FreeBlock, HEADER_SIZE};
use super::config::FreeListConfig;
use super::handle::{Handle, HandleTable};
use super::relocate::{relocate_array, AllocationRecord, RelocateFn};
use crate::allocator::stats::CellStats;
use crate::allocator::traits::MAX_SUPPORTED_ALIGN;
use crate::allocator::{AllocatorStats, MemoryUsage, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::region::Backing;
use crate::utils::{align_forward_adjustment_with_header, align_up, is_aligned};

#[cfg(feature = "logging")]
use tracing::trace;

/// Best-fit search result: the chosen block, its predecessor in the list,
/// and the adjustment that placing a header-prefixed payload in it needs.
#[derive(Clone, Copy)]
struct BestFit {
    prev: Option<NonNull<FreeBlock>>,
    block: NonNull<FreeBlock>,
    size: usize,
    adjustment: usize,
}

/// General-purpose allocator with handle-stable pointers and compaction
///
/// # Memory layout
/// ```text
/// [free]--[hdr|A]--[hdr|B]--[free]--[hdr|C]--[free]
///    |                        ^
///    +------------------------+   address-ordered free list
/// ```
///
/// Clients hold [`Handle`]s, never raw addresses; [`defragment`]
/// relocates allocations downward and rewrites the handle table, so
/// handles stay valid while raw addresses change.
///
/// [`defragment`]: FreeListAllocator::defragment
pub struct FreeListAllocator {
    backing: Backing,
    start: usize,
    size: usize,
    used_memory: usize,
    free_head: Option<NonNull<FreeBlock>>,
    table: HandleTable,
    records: Vec<AllocationRecord>,
    config: FreeListConfig,
    stats: CellStats,
}

impl FreeListAllocator {
    /// Creates an allocator over an owned region with custom configuration
    pub fn with_config(
        capacity: usize,
        handle_capacity: usize,
        config: FreeListConfig,
    ) -> MemoryResult<Self> {
        let backing = Backing::owned(capacity)?;
        Self::init(backing, handle_capacity, config)
    }

    /// Creates an allocator over an owned region
    pub fn new(capacity: usize, handle_capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, handle_capacity, FreeListConfig::default())
    }

    /// Creates an allocator over a caller-supplied region
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of `size` bytes for the
    ///   allocator's lifetime
    /// - nothing else may access the region while the allocator is live
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        size: usize,
        handle_capacity: usize,
        config: FreeListConfig,
    ) -> MemoryResult<Self> {
        if !is_aligned(ptr.as_ptr() as usize, align_of::<FreeBlock>()) {
            return Err(MemoryError::invalid_alignment(ptr.as_ptr() as usize));
        }
        // SAFETY: forwarded caller contract.
        let backing = unsafe { Backing::from_raw_parts(ptr, size) };
        Self::init(backing, handle_capacity, config)
    }

    fn init(
        backing: Backing,
        handle_capacity: usize,
        config: FreeListConfig,
    ) -> MemoryResult<Self> {
        let size = backing.len();
        if size <= HEADER_SIZE {
            return Err(MemoryError::invalid_config(
                "region too small for a single allocation",
            ));
        }
        if handle_capacity == 0 {
            return Err(MemoryError::invalid_config("handle capacity cannot be zero"));
        }

        let start = backing.base() as usize;
        // SAFETY: the region is exclusively ours and large enough; one
        // block spanning the whole region.
        let free_head = Some(unsafe { FreeBlock::write(start as *mut u8, size, None) });

        let track_stats = config.track_stats;
        Ok(Self {
            backing,
            start,
            size,
            used_memory: 0,
            free_head,
            table: HandleTable::with_capacity(handle_capacity),
            records: Vec::new(),
            config,
            stats: CellStats::new(track_stats),
        })
    }

    // --- Introspection -----------------------------------------------------

    /// Total capacity of the region in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.backing.len()
    }

    /// Bytes currently allocated, including headers and alignment
    #[inline]
    pub fn used_memory(&self) -> usize {
        self.used_memory
    }

    /// Number of live allocations
    #[inline]
    pub fn num_allocations(&self) -> usize {
        self.records.len()
    }

    /// Capacity of the handle table
    #[inline]
    pub fn handle_capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Handles still available
    #[inline]
    pub fn available_handles(&self) -> usize {
        self.table.available()
    }

    /// Number of blocks on the free list
    pub fn free_block_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.free_head;
        while let Some(block) = cursor {
            count += 1;
            // SAFETY: the free list only holds live nodes.
            cursor = unsafe { block.as_ref().next };
        }
        count
    }

    /// Total free bytes across all blocks
    pub fn total_free(&self) -> usize {
        self.size - self.used_memory
    }

    /// Checks the allocator's internal invariants
    ///
    /// Intended for tests and debug builds: verifies that the free list is
    /// address-ordered, in bounds, never contains touching neighbors, and
    /// that free and used bytes tile the region exactly.
    pub fn validate(&self) -> Result<(), &'static str> {
        let mut free_bytes = 0;
        let mut previous_end = 0;
        let mut cursor = self.free_head;
        while let Some(block) = cursor {
            let addr = FreeBlock::addr(block);
            // SAFETY: the free list only holds live nodes.
            let size = unsafe { block.as_ref().size };
            if addr < self.start || addr + size > self.start + self.size {
                return Err("free block out of bounds");
            }
            if !is_aligned(addr, align_of::<FreeBlock>()) {
                return Err("free block start misaligned");
            }
            if addr < previous_end {
                return Err("free list out of address order or overlapping");
            }
            if addr == previous_end && previous_end != 0 {
                return Err("touching free blocks were not coalesced");
            }
            free_bytes += size;
            previous_end = addr + size;
            cursor = unsafe { block.as_ref().next };
        }
        if free_bytes + self.used_memory != self.size {
            return Err("free and used bytes do not tile the region");
        }
        if self.records.len() != self.table.capacity() - self.table.available() {
            return Err("record list out of sync with handle table");
        }
        Ok(())
    }

    /// Size of the largest free block
    pub fn largest_free_block(&self) -> usize {
        let mut largest = 0;
        let mut cursor = self.free_head;
        while let Some(block) = cursor {
            // SAFETY: the free list only holds live nodes.
            let size = unsafe { block.as_ref().size };
            largest = largest.max(size);
            cursor = unsafe { block.as_ref().next };
        }
        largest
    }

    // --- Allocation --------------------------------------------------------

    /// Allocates and stores a single value, returning a handle to it
    pub fn insert<T>(&mut self, value: T) -> MemoryResult<Handle<T>> {
        let handle = self.allocate_block::<T>(size_of::<T>(), align_of::<T>(), 1)?;
        // SAFETY: the block was just carved for one T; aligned and
        // exclusive.
        unsafe { self.table.addr_of(handle.index()).cast::<T>().as_ptr().write(value) };
        Ok(handle)
    }

    /// Allocates an array of `count` values produced by `f(index)`
    pub fn insert_array_with<T>(
        &mut self,
        count: usize,
        mut f: impl FnMut(usize) -> T,
    ) -> MemoryResult<Handle<T>> {
        let bytes = size_of::<T>()
            .checked_mul(count)
            .ok_or_else(|| MemoryError::size_overflow("array size"))?;
        let handle = self.allocate_block::<T>(bytes, align_of::<T>(), count)?;
        let base = self.table.addr_of(handle.index()).cast::<T>().as_ptr();
        for i in 0..count {
            // SAFETY: i < count, within the freshly carved block.
            unsafe { base.add(i).write(f(i)) };
        }
        Ok(handle)
    }

    /// Allocates an array of `count` clones of `value`
    pub fn insert_array<T: Clone>(&mut self, count: usize, value: T) -> MemoryResult<Handle<T>> {
        self.insert_array_with(count, |_| value.clone())
    }

    /// Allocates raw bytes with an explicit layout
    ///
    /// The payload is filled with the configured allocation pattern (zero
    /// by default) and is addressed as a byte slice through the handle.
    pub fn allocate(&mut self, layout: Layout) -> MemoryResult<Handle<u8>> {
        let handle = self.allocate_block::<u8>(layout.size(), layout.align(), layout.size())?;
        let base = self.table.addr_of(handle.index()).as_ptr();
        let fill = self.config.alloc_pattern.unwrap_or(0);
        // SAFETY: the block was just carved for layout.size() bytes.
        unsafe { core::ptr::write_bytes(base, fill, layout.size()) };
        Ok(handle)
    }

    /// Carves a block, binds a handle, and records the relocation hook.
    fn allocate_block<T>(
        &mut self,
        size: usize,
        align: usize,
        count: usize,
    ) -> MemoryResult<Handle<T>> {
        if size == 0 {
            return Err(MemoryError::invalid_layout(
                "zero-sized allocations are not supported",
            ));
        }
        if !align.is_power_of_two() || align > MAX_SUPPORTED_ALIGN {
            return Err(MemoryError::invalid_alignment(align));
        }
        // Handle exhaustion fails regardless of free memory, before any
        // free-list mutation.
        if self.table.available() == 0 {
            self.stats.record_failure();
            return Err(MemoryError::handles_exhausted(self.table.capacity()));
        }

        let align = align.max(align_of::<AllocationHeader>());
        // Padding keeps every block boundary usize-aligned.
        let size = align_up(size, align_of::<FreeBlock>());

        let (mut fit, total_free) = self.find_best_fit(size, align);

        if fit.is_none() {
            // Memory is fragmented; if the free bytes would cover the
            // worst case, compact and retry the search exactly once.
            let worst_case = size
                .checked_add(HEADER_SIZE + align)
                .ok_or_else(|| MemoryError::size_overflow("allocation size"))?;
            if total_free >= worst_case {
                #[cfg(feature = "logging")]
                trace!(size, align, total_free, "fragmented; compacting before retry");
                self.defragment_fully();
                fit = self.find_best_fit(size, align).0;
            }
        }

        let Some(fit) = fit else {
            self.stats.record_failure();
            return Err(MemoryError::allocation_failed(size, align));
        };

        let (aligned, total_size) = self.carve(fit, size);
        self.used_memory += total_size;
        self.stats.record_allocation(total_size);

        let (index, generation) = self
            .table
            .bind(aligned, count)
            .expect("handle availability checked above");

        let record = AllocationRecord {
            handle: index,
            align,
            relocate: relocate_array::<T> as RelocateFn,
        };
        let position = self.record_position(aligned.as_ptr() as usize);
        self.records.insert(position, record);

        Ok(Handle::new(index, generation))
    }

    /// Walks the free list accumulating total free space and tracking the
    /// smallest adequate block; stops at the first exact fit.
    fn find_best_fit(&self, size: usize, align: usize) -> (Option<BestFit>, usize) {
        let mut prev: Option<NonNull<FreeBlock>> = None;
        let mut cursor = self.free_head;
        let mut best: Option<BestFit> = None;
        let mut total_free = 0;

        while let Some(block) = cursor {
            // SAFETY: the free list only holds live nodes.
            let block_size = unsafe { block.as_ref().size };
            total_free += block_size;

            let adjustment =
                align_forward_adjustment_with_header(FreeBlock::addr(block), align, HEADER_SIZE);
            let total = size + adjustment;

            if block_size == total {
                // First exact match wins. The walk can stop early: the
                // partial total_free is only consumed on search failure.
                best = Some(BestFit {
                    prev,
                    block,
                    size: block_size,
                    adjustment,
                });
                break;
            }
            if block_size > total && best.is_none_or(|b| block_size < b.size) {
                best = Some(BestFit {
                    prev,
                    block,
                    size: block_size,
                    adjustment,
                });
            }

            prev = Some(block);
            cursor = unsafe { block.as_ref().next };
        }

        (best, total_free)
    }

    /// Removes the chosen span from the free list and writes the header.
    fn carve(&mut self, fit: BestFit, size: usize) -> (NonNull<u8>, usize) {
        let block_addr = FreeBlock::addr(fit.block);
        // SAFETY: fit.block is a live node.
        let next = unsafe { fit.block.as_ref().next };
        let mut total_size = size + fit.adjustment;

        if fit.size - total_size <= HEADER_SIZE {
            // The leftover could never hold another allocation; absorb it
            // instead of leaving an unusable sliver.
            total_size = fit.size;
            self.relink(fit.prev, next);
        } else {
            let remainder_addr = (block_addr + total_size) as *mut u8;
            // SAFETY: the remainder span is unused, exceeds a node, and
            // starts usize-aligned (all spans are padded).
            let remainder =
                unsafe { FreeBlock::write(remainder_addr, fit.size - total_size, next) };
            self.relink(fit.prev, Some(remainder));
        }

        let aligned = (block_addr + fit.adjustment) as *mut u8;
        debug_assert!(fit.adjustment <= u8::MAX as usize);
        // SAFETY: the adjustment reserves header space below the payload.
        unsafe { AllocationHeader::write(aligned, total_size, fit.adjustment as u8) };

        // SAFETY: aligned points into the region, never null.
        (unsafe { NonNull::new_unchecked(aligned) }, total_size)
    }

    /// Points `prev` (or the list head) at `to`.
    fn relink(&mut self, prev: Option<NonNull<FreeBlock>>, to: Option<NonNull<FreeBlock>>) {
        match prev {
            // SAFETY: prev is a live node owned by this allocator.
            Some(mut prev) => unsafe { prev.as_mut().next = to },
            None => self.free_head = to,
        }
    }

    /// Position in the sorted record list for an allocation at `addr`.
    fn record_position(&self, addr: usize) -> usize {
        self.records
            .partition_point(|record| (self.table.addr_of(record.handle).as_ptr() as usize) < addr)
    }

    // --- Deallocation ------------------------------------------------------

    /// Destroys the payload behind `handle` and frees its memory
    ///
    /// The freed range is reinserted into the free list in address order
    /// and coalesced with touching neighbors (at most one merge per side).
    /// A stale, reused, or foreign handle yields [`MemoryError::Misuse`]
    /// and mutates nothing.
    pub fn remove<T>(&mut self, handle: Handle<T>) -> MemoryResult<()> {
        let (addr, count) = self
            .table
            .resolve(handle.index(), handle.generation())
            .ok_or_else(|| MemoryError::misuse("deallocate of a dead or foreign handle"))?;

        let base = addr.cast::<T>().as_ptr();
        for i in (0..count).rev() {
            // SAFETY: the handle owns `count` initialized elements.
            unsafe { core::ptr::drop_in_place(base.add(i)) };
        }

        self.release_block(handle.index(), addr);
        Ok(())
    }

    /// Whether `handle` still refers to a live allocation
    pub fn contains<T>(&self, handle: Handle<T>) -> bool {
        self.table.resolve(handle.index(), handle.generation()).is_some()
    }

    /// Frees the block behind a validated handle index.
    fn release_block(&mut self, index: u32, addr: NonNull<u8>) {
        // SAFETY: a header sits below every live payload.
        let header = unsafe { AllocationHeader::read(addr.as_ptr()) };
        let block_start = addr.as_ptr() as usize - header.adjustment as usize;
        let block_size = header.size;

        let position = self.record_position(addr.as_ptr() as usize);
        debug_assert!(
            self.records.get(position).is_some_and(|r| r.handle == index),
            "record list out of sync with handle table"
        );
        self.records.remove(position);
        self.table.release(index);

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: the whole span belongs to the dead allocation.
            unsafe { core::ptr::write_bytes(block_start as *mut u8, pattern, block_size) };
        }

        self.insert_free_block(block_start, block_size);
        self.used_memory -= block_size;
        self.stats.record_deallocation(block_size);
    }

    /// Reinserts `[start, start + size)` as a free block, address-ordered,
    /// merging with a touching neighbor on each side.
    fn insert_free_block(&mut self, start: usize, size: usize) {
        let end = start + size;

        // Find the neighbors: prev is the last block below start, next the
        // first above.
        let mut prev: Option<NonNull<FreeBlock>> = None;
        let mut cursor = self.free_head;
        while let Some(block) = cursor {
            if FreeBlock::addr(block) > start {
                break;
            }
            prev = Some(block);
            // SAFETY: live node.
            cursor = unsafe { block.as_ref().next };
        }
        let next = cursor;

        // SAFETY: prev is a live node; touching means its end is our start.
        let touches_prev = prev.is_some_and(|p| unsafe { FreeBlock::end(p) } == start);

        if let Some(mut prev) = prev.filter(|_| touches_prev) {
            // SAFETY: merging the freed span into the lower neighbor.
            unsafe { prev.as_mut().size += size };
            if let Some(next) = next {
                // SAFETY: both nodes are live; merge if now touching.
                if unsafe { FreeBlock::end(prev) } == FreeBlock::addr(next) {
                    unsafe {
                        prev.as_mut().size += next.as_ref().size;
                        prev.as_mut().next = next.as_ref().next;
                    }
                }
            }
        } else {
            // SAFETY: the span is dead memory with a usize-aligned start.
            let mut block = unsafe { FreeBlock::write(start as *mut u8, size, next) };
            self.relink(prev, Some(block));
            if let Some(next) = next {
                if end == FreeBlock::addr(next) {
                    // SAFETY: absorbing the upper neighbor.
                    unsafe {
                        block.as_mut().size += next.as_ref().size;
                        block.as_mut().next = next.as_ref().next;
                    }
                }
            }
        }
    }

    // --- Access ------------------------------------------------------------

    /// Resolves a handle to a reference
    ///
    /// Returns `None` for stale or foreign handles.
    pub fn get<T>(&self, handle: Handle<T>) -> Option<&T> {
        let (addr, _) = self.table.resolve(handle.index(), handle.generation())?;
        // SAFETY: the handle was created for a T at this address; &self
        // prevents concurrent relocation or removal.
        Some(unsafe { addr.cast::<T>().as_ref() })
    }

    /// Resolves a handle to a mutable reference
    pub fn get_mut<T>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let (addr, _) = self.table.resolve(handle.index(), handle.generation())?;
        // SAFETY: as in get(); &mut self gives exclusivity.
        Some(unsafe { addr.cast::<T>().as_mut() })
    }

    /// Resolves an array handle to a slice of all its elements
    pub fn get_slice<T>(&self, handle: Handle<T>) -> Option<&[T]> {
        let (addr, count) = self.table.resolve(handle.index(), handle.generation())?;
        // SAFETY: the handle owns `count` initialized elements.
        Some(unsafe { core::slice::from_raw_parts(addr.cast::<T>().as_ptr(), count) })
    }

    /// Resolves an array handle to a mutable slice
    pub fn get_slice_mut<T>(&mut self, handle: Handle<T>) -> Option<&mut [T]> {
        let (addr, count) = self.table.resolve(handle.index(), handle.generation())?;
        // SAFETY: as in get_slice(); &mut self gives exclusivity.
        Some(unsafe { core::slice::from_raw_parts_mut(addr.cast::<T>().as_ptr(), count) })
    }

    // --- Defragmentation ---------------------------------------------------

    /// Whether compaction could consolidate free space
    ///
    /// False when the free list is empty or holds exactly one block that
    /// ends at the region's end (all free space is already one trailing
    /// run).
    pub fn needs_defragmentation(&self) -> bool {
        match self.free_head {
            None => false,
            Some(block) => {
                // SAFETY: live node.
                let trailing = unsafe {
                    block.as_ref().next.is_none() && FreeBlock::end(block) == self.start + self.size
                };
                !trailing
            }
        }
    }

    /// Performs one compaction step
    ///
    /// Relocates the allocation immediately above the lowest free block
    /// down into it, absorbs any alignment slack, and merges the moved gap
    /// with the next free block when they touch. Returns whether any work
    /// was done; callers wanting full compaction repeat until
    /// [`needs_defragmentation`](Self::needs_defragmentation) is false.
    pub fn defragment(&mut self) -> bool {
        if !self.needs_defragmentation() {
            return false;
        }

        let gap = self.free_head.expect("needs_defragmentation implies a block");
        let gap_addr = FreeBlock::addr(gap);
        // SAFETY: live node.
        let gap_size = unsafe { gap.as_ref().size };
        let gap_next = unsafe { gap.as_ref().next };

        // The allocation immediately above the gap: first record past the
        // gap's start address.
        let position = self
            .records
            .partition_point(|r| (self.table.addr_of(r.handle).as_ptr() as usize) <= gap_addr);
        let Some(record) = self.records.get(position) else {
            debug_assert!(false, "free block not at region end but no allocation above it");
            return false;
        };
        let (handle, align, relocate) = (record.handle, record.align, record.relocate);

        let src = self.table.addr_of(handle);
        // SAFETY: a header sits below every live payload.
        let old_header = unsafe { AllocationHeader::read(src.as_ptr()) };
        debug_assert_eq!(
            src.as_ptr() as usize - old_header.adjustment as usize,
            gap_addr + gap_size,
            "allocation above a gap must touch it"
        );

        let count = self.table.count_of(handle);
        // SAFETY: src holds `count` live elements; the gap plus the old
        // span is large enough for the relocated allocation.
        let relocated = unsafe { relocate(gap_addr as *mut u8, src, count, align) };

        self.table.relocate(handle, relocated.aligned);
        self.stats.record_relocation();
        self.used_memory -= old_header.size;
        self.used_memory += relocated.total_size;

        // The gap moves above the relocated allocation; alignment slack
        // freed (or absorbed) by the move changes its size.
        let mut new_size = gap_size + old_header.size - relocated.total_size;
        let mut new_total = relocated.total_size;
        if new_size > 0 && new_size < size_of::<FreeBlock>() {
            // Too small for an in-place node; absorb the sliver into the
            // moved allocation, mirroring the carve-time sliver rule.
            new_total += new_size;
            // SAFETY: extending the span the allocation already borders.
            unsafe {
                AllocationHeader::write(relocated.aligned.as_ptr(), new_total, relocated.adjustment)
            };
            self.used_memory += new_size;
            new_size = 0;
        }

        if new_size == 0 {
            self.free_head = gap_next;
        } else {
            let new_addr = gap_addr + new_total;
            // SAFETY: the span just vacated by the move; usize-aligned.
            let mut block = unsafe { FreeBlock::write(new_addr as *mut u8, new_size, gap_next) };
            self.free_head = Some(block);
            if let Some(next) = gap_next {
                if new_addr + new_size == FreeBlock::addr(next) {
                    // SAFETY: merging with the touching upper neighbor.
                    unsafe {
                        block.as_mut().size += next.as_ref().size;
                        block.as_mut().next = next.as_ref().next;
                    }
                }
            }
        }

        #[cfg(feature = "logging")]
        trace!(
            from = src.as_ptr() as usize - self.start,
            to = relocated.aligned.as_ptr() as usize - self.start,
            elements = count,
            "relocated allocation during compaction"
        );

        true
    }

    /// Repeats [`defragment`](Self::defragment) until no work remains
    ///
    /// Returns the number of compaction steps performed. Each step strictly
    /// raises the address of the first free block, so the loop terminates.
    pub fn defragment_fully(&mut self) -> usize {
        let mut steps = 0;
        let mut last_first_addr = 0;
        while self.needs_defragmentation() {
            let first_addr = self.free_head.map_or(usize::MAX, FreeBlock::addr);
            debug_assert!(
                first_addr > last_first_addr || steps == 0,
                "compaction must make forward progress"
            );
            last_first_addr = first_addr;

            if !self.defragment() {
                break;
            }
            steps += 1;
        }
        steps
    }
}

impl Drop for FreeListAllocator {
    fn drop(&mut self) {
        // Outstanding allocations at destruction are a fatal contract
        // breach, not a silent leak.
        assert!(
            self.records.is_empty() && self.used_memory == 0,
            "free-list allocator dropped with {} outstanding allocations ({} bytes)",
            self.records.len(),
            self.used_memory
        );
    }
}

impl MemoryUsage for FreeListAllocator {
    fn used_memory(&self) -> usize {
        self.used_memory
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.total_free())
    }
}

impl StatisticsProvider for FreeListAllocator {
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
