//! Type-erased relocation bound per payload type
//!
//! Compaction must move allocations whose concrete type the allocator no
//! longer knows. Each allocation therefore carries a relocation function,
//! monomorphised for its payload type when the allocation is made. Rust
//! moves are untyped byte moves, so the move itself is a single
//! overlap-safe copy; the per-type hook exists to recompute the alignment
//! adjustment (and thus the header) at the destination. Nothing here
//! allocates, so relocation is safe to run mid-compaction.

use core::mem::{align_of, size_of};
use core::ptr::NonNull;

use super::block::{AllocationHeader, FreeBlock, HEADER_SIZE};
use crate::utils::{align_forward_adjustment_with_header, align_up};

/// Result of relocating one allocation to a lower address.
pub(crate) struct Relocated {
    /// New aligned payload address.
    pub(crate) aligned: NonNull<u8>,
    /// New total span including the (possibly different) adjustment.
    pub(crate) total_size: usize,
    /// New alignment adjustment written to the header.
    pub(crate) adjustment: u8,
}

/// Moves `count` elements into the block starting at `block_start` and
/// rewrites the allocation header. Bound to the concrete payload type at
/// allocation time; `align` is the allocation's effective alignment (the
/// requested alignment, at least header-aligned), which may exceed the
/// element type's own.
pub(crate) type RelocateFn =
    unsafe fn(block_start: *mut u8, src: NonNull<u8>, count: usize, align: usize) -> Relocated;

/// The single generic implementation behind every [`RelocateFn`].
///
/// # Safety
/// - `src` must point at `count` initialized elements of `T`
/// - `block_start` must be the start of a span large enough for the new
///   adjustment plus the padded payload, with `block_start < src`
///   (compaction only moves downward)
/// - `block_start` must be usize-aligned
pub(crate) unsafe fn relocate_array<T>(
    block_start: *mut u8,
    src: NonNull<u8>,
    count: usize,
    align: usize,
) -> Relocated {
    let adjustment =
        align_forward_adjustment_with_header(block_start as usize, align, HEADER_SIZE);
    let payload_bytes = count * size_of::<T>();
    // Spans are padded so every block boundary stays usize-aligned; the
    // padding matches what the allocation was carved with.
    let padded_bytes = align_up(payload_bytes, align_of::<FreeBlock>());

    // SAFETY: adjustment + padded payload fit the span per the caller
    // contract.
    let aligned = unsafe { block_start.add(adjustment) };

    // Payload first: the header slot at the destination may overlap source
    // bytes, so it must not be written until they have been copied out.
    // copy() handles the overlapping ranges.
    unsafe { core::ptr::copy(src.as_ptr(), aligned, payload_bytes) };

    let total_size = adjustment + padded_bytes;
    debug_assert!(adjustment <= u8::MAX as usize);
    // SAFETY: aligned has HEADER_SIZE writable bytes below it by
    // construction of the adjustment.
    unsafe { AllocationHeader::write(aligned, total_size, adjustment as u8) };

    Relocated {
        // SAFETY: aligned points into a live region.
        aligned: unsafe { NonNull::new_unchecked(aligned) },
        total_size,
        adjustment: adjustment as u8,
    }
}

/// Per-allocation record linking a handle to its relocation capability.
///
/// Records are kept sorted by the allocation's current payload address so
/// compaction can find the allocation just above a gap with a binary
/// search. Relocation only moves allocations downward into an adjacent
/// gap, which preserves the order.
pub(crate) struct AllocationRecord {
    pub(crate) handle: u32,
    /// Effective alignment the allocation was made with.
    pub(crate) align: usize,
    pub(crate) relocate: RelocateFn,
}
