//! Allocator traits shared across the allocator family
//!
//! The raw [`Allocator`] trait is implemented by the address-stable
//! allocators (linear, stack, pool): whatever pointer they hand out stays
//! valid until it is explicitly released. The free-list allocator does not
//! implement it: its allocations may be relocated by defragmentation, so
//! its contract is handle-based and lives on the type itself.
//!
//! # Safety
//!
//! Implementors of `Allocator` must ensure that:
//! - returned pointers are valid, properly aligned, and mutually disjoint
//! - deallocation only accepts pointers previously returned by the same
//!   instance, with the layout they were allocated with

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::{MemoryError, MemoryResult};

/// Maximum supported payload alignment.
///
/// The free-list allocator stores its alignment adjustment in a single
/// header byte, which bounds the alignment it can represent; the limit is
/// applied uniformly across the family.
pub const MAX_SUPPORTED_ALIGN: usize = 128;

/// Validation of layout parameters
///
/// Catches common errors early: zero sizes, non-power-of-two or oversized
/// alignments, and sizes that would overflow when padded.
#[inline]
pub(crate) fn validate_layout(layout: Layout) -> MemoryResult<()> {
    if !layout.align().is_power_of_two() || layout.align() > MAX_SUPPORTED_ALIGN {
        return Err(MemoryError::invalid_alignment(layout.align()));
    }
    if layout.size() == 0 {
        return Err(MemoryError::invalid_layout(
            "zero-sized allocations are not supported",
        ));
    }
    if layout.size() > isize::MAX as usize - (layout.align() - 1) {
        return Err(MemoryError::size_overflow("layout size"));
    }
    Ok(())
}

/// Raw allocation over a fixed memory region
///
/// Failure is always communicated through the result value; no operation
/// here blocks or unwinds.
pub unsafe trait Allocator {
    /// Allocates memory with the given layout
    ///
    /// # Safety
    /// - the returned pointer must not be used after the allocator is
    ///   dropped, rewound past the allocation, or reset
    /// - memory content is uninitialized unless the allocator's
    ///   configuration says otherwise
    unsafe fn allocate(&self, layout: Layout) -> MemoryResult<NonNull<u8>>;

    /// Releases memory at the given pointer
    ///
    /// Allocators without per-pointer deallocation (linear, stack) treat
    /// this as a no-op; their memory is reclaimed through marks or reset.
    ///
    /// # Safety
    /// - `ptr` must have been allocated by this allocator
    /// - `layout` must match the original allocation layout exactly
    /// - `ptr` must not be used after this call
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

// Forwarding impl so `&A` can be used where an allocator value is expected.
unsafe impl<T: Allocator + ?Sized> Allocator for &T {
    unsafe fn allocate(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        // SAFETY: same contract as T::allocate, forwarded unchanged.
        unsafe { (**self).allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: same contract as T::deallocate, forwarded unchanged.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// Memory usage tracking trait
///
/// Read-only introspection with no side effects, available on every
/// allocator variant.
pub trait MemoryUsage {
    /// Get currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Get available memory in bytes (if known)
    fn available_memory(&self) -> Option<usize>;

    /// Get total memory capacity in bytes (if known)
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| self.used_memory() + available)
    }

    /// Returns memory usage as a percentage (0.0 to 100.0)
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }

    /// Returns detailed memory usage information
    fn memory_usage(&self) -> BasicMemoryUsage {
        BasicMemoryUsage {
            used: self.used_memory(),
            available: self.available_memory(),
            total: self.total_memory(),
            usage_percent: self.memory_usage_percent(),
        }
    }
}

/// Basic memory usage information
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMemoryUsage {
    /// Currently used memory in bytes
    pub used: usize,
    /// Available memory in bytes (None if unknown)
    pub available: Option<usize>,
    /// Total memory capacity in bytes (None if unknown)
    pub total: Option<usize>,
    /// Memory usage as percentage (None if it cannot be calculated)
    pub usage_percent: Option<f32>,
}

impl core::fmt::Display for BasicMemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "used: {} bytes", self.used)?;
        if let Some(total) = self.total {
            write!(f, ", total: {total} bytes")?;
        }
        if let Some(percent) = self.usage_percent {
            write!(f, " ({percent:.1}%)")?;
        }
        Ok(())
    }
}

/// Resettable memory manager
///
/// Resetting invalidates all previous allocations at once.
pub trait Resettable {
    /// Reset allocator to initial state
    ///
    /// # Safety
    /// - all pointers allocated before the reset become invalid immediately
    /// - caller must ensure no live references into the region exist
    unsafe fn reset(&self);

    /// Check if this allocator can currently be reset
    fn can_reset(&self) -> bool {
        true
    }

    /// Resets the allocator only if it is safe to do so
    ///
    /// Returns `true` if the reset was performed.
    ///
    /// # Safety
    /// Same requirements as [`Resettable::reset`] when it actually runs.
    unsafe fn try_reset(&self) -> bool {
        if self.can_reset() {
            // SAFETY: caller upholds the reset contract.
            unsafe { self.reset() };
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_validation() {
        assert!(validate_layout(Layout::from_size_align(64, 8).unwrap()).is_ok());
        assert!(matches!(
            validate_layout(Layout::from_size_align(0, 8).unwrap()),
            Err(MemoryError::InvalidLayout { .. })
        ));
        assert!(matches!(
            validate_layout(Layout::from_size_align(8, 256).unwrap()),
            Err(MemoryError::InvalidAlignment { .. })
        ));
    }
}
