//! Backing memory regions for allocators
//!
//! Every allocator in this crate operates on one contiguous byte region that
//! it owns exclusively for its lifetime. The region is either obtained from
//! the system allocator at construction time, or supplied by the caller
//! (e.g. an allocator instance living inside another allocator's buffer).
//!
//! None of the types here are `Sync`: the allocators are single-threaded by
//! contract and carry no internal synchronization.

use core::cell::UnsafeCell;
use core::ptr::NonNull;
use std::alloc::Layout;

use crate::error::{MemoryError, MemoryResult};

/// Alignment of owned regions. Generous enough that the free-list
/// allocator's in-place block nodes and headers start aligned.
pub(crate) const REGION_ALIGN: usize = 16;

/// A contiguous byte region, either owned or caller-supplied.
///
/// All access goes through the raw base pointer; the allocators never form
/// references to the buffer as a whole, so interior pointers handed out to
/// clients keep valid provenance.
pub(crate) enum Backing {
    Owned { ptr: NonNull<u8>, layout: Layout },
    Raw { ptr: NonNull<u8>, len: usize },
}

impl Backing {
    /// Allocates an owned, zero-initialized region from the system allocator.
    pub(crate) fn owned(capacity: usize) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_config("region capacity cannot be zero"));
        }
        let layout = Layout::from_size_align(capacity, REGION_ALIGN)
            .map_err(|_| MemoryError::size_overflow("region layout"))?;
        // SAFETY: layout has non-zero size (checked above).
        let raw = unsafe { std::alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw)
            .ok_or_else(|| MemoryError::allocation_failed(capacity, REGION_ALIGN))?;
        Ok(Backing::Owned { ptr, layout })
    }

    /// Wraps a caller-supplied region.
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of `len` bytes for the
    ///   lifetime of the returned value
    /// - the region must not be accessed by anything else while the
    ///   allocator built on top of it is live
    pub(crate) unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        Backing::Raw { ptr, len }
    }

    /// Base address of the region.
    #[inline]
    pub(crate) fn base(&self) -> *mut u8 {
        match self {
            Backing::Owned { ptr, .. } => ptr.as_ptr(),
            Backing::Raw { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Region length in bytes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Backing::Owned { layout, .. } => layout.size(),
            Backing::Raw { len, .. } => *len,
        }
    }
}

impl Drop for Backing {
    fn drop(&mut self) {
        if let Backing::Owned { ptr, layout } = self {
            // SAFETY: ptr was allocated with exactly this layout in owned().
            unsafe { std::alloc::dealloc(ptr.as_ptr(), *layout) };
        }
    }
}

/// Interior-mutability cell for slab storage (pool allocator slots).
///
/// Like `UnsafeCell`, but kept local so the missing `Sync` impl is an
/// explicit statement: slot storage is mutated through shared references on
/// a single thread only.
#[repr(transparent)]
pub(crate) struct RegionCell<T: ?Sized>(UnsafeCell<T>);

impl<T> RegionCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }
}

impl<T: ?Sized> RegionCell<T> {
    #[inline]
    pub(crate) fn get(&self) -> *mut T {
        self.0.get()
    }
}
