//! RAII-based stack frame for automatic release

use super::{StackAllocator, StackMarker};

/// RAII helper for stack-based scoped allocation
///
/// Captures a marker on creation and releases back to it when dropped, so a
/// scope cannot leak allocations past its end.
pub struct StackFrame<'a> {
    allocator: &'a StackAllocator,
    marker: StackMarker,
}

impl<'a> StackFrame<'a> {
    /// Creates a frame that will release to the current position on drop
    pub fn new(allocator: &'a StackAllocator) -> Self {
        let marker = allocator.marker();
        Self { allocator, marker }
    }

    /// Gets the underlying allocator
    pub fn allocator(&self) -> &'a StackAllocator {
        self.allocator
    }

    /// Manually release and consume this frame
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        // The marker came from this allocator, so release cannot fail.
        let _ = self.allocator.release_to_marker(self.marker);
    }
}
