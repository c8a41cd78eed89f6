//! Smart pointer for pool-allocated objects

use core::ptr::{self, NonNull};

use super::PoolAllocator;

/// RAII smart pointer for pool-allocated values
///
/// Automatically destroys the payload and returns the slot to the pool when
/// dropped. The borrow of the pool keeps the pool alive (and un-droppable)
/// while any box is outstanding.
pub struct PoolBox<'a, T> {
    ptr: NonNull<T>,
    pool: &'a PoolAllocator<T>,
}

impl<'a, T> PoolBox<'a, T> {
    pub(crate) fn from_parts(ptr: NonNull<T>, pool: &'a PoolAllocator<T>) -> Self {
        Self { ptr, pool }
    }

    /// Consumes the box and returns the contained value
    ///
    /// The slot goes back on the free list without running the destructor
    /// (ownership of the value moves to the caller).
    #[must_use]
    pub fn into_inner(self) -> T {
        // SAFETY: ptr points at an initialized T owned by this box; read
        // moves it out bitwise and mem::forget below prevents double drop.
        let value = unsafe { ptr::read(self.ptr.as_ptr()) };
        // SAFETY: the payload has been moved out, the slot is dead storage.
        unsafe { self.pool.release_slot(self.ptr) };
        core::mem::forget(self);
        value
    }

    /// Raw payload pointer, valid while the box is alive
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<T> core::ops::Deref for PoolBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr points at an initialized T exclusively owned by this
        // box; the lifetime ties it to the pool.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> core::ops::DerefMut for PoolBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, and &mut self guarantees exclusivity.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for PoolBox<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        (**self).fmt(f)
    }
}

impl<T> Drop for PoolBox<'_, T> {
    fn drop(&mut self) {
        // SAFETY: ptr came from this pool's allocate_raw and is dropped
        // exactly once.
        unsafe { self.pool.deallocate_raw(self.ptr) };
    }
}
