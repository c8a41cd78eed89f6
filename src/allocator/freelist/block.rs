//! In-place free block nodes and allocation headers
//!
//! A free block's own first bytes encode `{size, next}`; a freed
//! allocation's bytes are reinterpreted as a `FreeBlock` in place, which is
//! why every allocation header must be at least as large as a block node.

use core::mem::size_of;
use core::ptr::NonNull;

/// Metadata written immediately below every live allocation's aligned
/// payload address.
///
/// `size` is the total span of the allocation including the alignment
/// adjustment; `adjustment` is the distance from the block start to the
/// aligned payload (always >= the header size).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct AllocationHeader {
    pub(crate) size: usize,
    pub(crate) adjustment: u8,
}

/// Node describing one unused address range, stored at the range's start.
#[repr(C)]
pub(crate) struct FreeBlock {
    pub(crate) size: usize,
    pub(crate) next: Option<NonNull<FreeBlock>>,
}

// A freed allocation's bytes must be able to hold a block node in place.
const _: () = assert!(size_of::<AllocationHeader>() >= size_of::<FreeBlock>());

/// Header size; the minimum adjustment of any allocation.
pub(crate) const HEADER_SIZE: usize = size_of::<AllocationHeader>();

impl AllocationHeader {
    /// Writes a header just below `aligned`.
    ///
    /// # Safety
    /// `aligned - HEADER_SIZE .. aligned` must be writable and inside the
    /// allocation's block span, and `aligned` must be at least
    /// usize-aligned.
    pub(crate) unsafe fn write(aligned: *mut u8, size: usize, adjustment: u8) {
        // SAFETY: the adjustment reserves HEADER_SIZE bytes below the
        // payload; the caller guarantees the span.
        unsafe {
            aligned
                .sub(HEADER_SIZE)
                .cast::<AllocationHeader>()
                .write(AllocationHeader { size, adjustment });
        }
    }

    /// Reads the header below `aligned`.
    ///
    /// # Safety
    /// `aligned` must be the payload address of a live allocation made by
    /// this crate's free-list allocator.
    pub(crate) unsafe fn read(aligned: *const u8) -> AllocationHeader {
        // SAFETY: a header was written below every payload at allocation
        // time.
        unsafe { aligned.sub(HEADER_SIZE).cast::<AllocationHeader>().read() }
    }
}

impl FreeBlock {
    /// Writes a block node at `addr` and returns a pointer to it.
    ///
    /// # Safety
    /// `addr .. addr + size_of::<FreeBlock>()` must be writable, unused
    /// memory, and `addr` must be usize-aligned.
    pub(crate) unsafe fn write(
        addr: *mut u8,
        size: usize,
        next: Option<NonNull<FreeBlock>>,
    ) -> NonNull<FreeBlock> {
        let block = addr.cast::<FreeBlock>();
        // SAFETY: forwarded caller contract.
        unsafe { block.write(FreeBlock { size, next }) };
        // SAFETY: addr points into a live region, never null.
        unsafe { NonNull::new_unchecked(block) }
    }

    /// Address of a block node.
    #[inline]
    pub(crate) fn addr(block: NonNull<FreeBlock>) -> usize {
        block.as_ptr() as usize
    }

    /// One-past-the-end address of a block.
    ///
    /// # Safety
    /// `block` must point at a live block node.
    #[inline]
    pub(crate) unsafe fn end(block: NonNull<FreeBlock>) -> usize {
        // SAFETY: forwarded caller contract.
        Self::addr(block) + unsafe { block.as_ref().size }
    }
}
