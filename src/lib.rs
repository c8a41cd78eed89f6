//! Handle-based defragmenting allocators for real-time workloads
//!
//! This crate replaces general-purpose heap allocation in long-running,
//! performance-sensitive code where allocation patterns are predictable
//! and fragmentation, latency, and locality must be controlled explicitly:
//!
//! - [`allocator::FreeListAllocator`] - best-fit free-list allocator whose
//!   clients hold indirect [`allocator::Handle`]s, so live allocations can
//!   be physically relocated to compact memory without invalidating them
//! - [`allocator::StackAllocator`] - scoped bump allocation with destructor
//!   unwinding on rewind
//! - [`allocator::PoolAllocator`] - fixed-slab pool for one payload type
//! - [`allocator::LinearAllocator`] - plain bump allocation with
//!   rewind-to-mark and clear
//!
//! All allocators operate on a caller-supplied or owned memory region and
//! are single-threaded by design: no internal synchronization exists and
//! none of the types are `Sync`.
//!
//! # Example
//!
//! ```
//! use ember_memory::allocator::FreeListAllocator;
//!
//! fn main() -> ember_memory::MemoryResult<()> {
//!     let mut alloc = FreeListAllocator::new(4096, 64)?;
//!
//!     let a = alloc.insert(1u64)?;
//!     let b = alloc.insert([0u8; 100])?;
//!     let c = alloc.insert(3u64)?;
//!
//!     // Free the middle allocation, then compact the gap away. The
//!     // handles stay valid while raw addresses change.
//!     alloc.remove(b)?;
//!     while alloc.defragment() {}
//!
//!     assert_eq!(*alloc.get(a).unwrap(), 1);
//!     assert_eq!(*alloc.get(c).unwrap(), 3);
//!
//!     alloc.remove(a)?;
//!     alloc.remove(c)?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `logging` (default): structured logging through `tracing`

pub mod allocator;
pub mod error;
pub mod utils;

pub(crate) mod region;

// Re-export common types for convenience
pub use error::{MemoryError, MemoryResult};

/// Commonly used types
pub mod prelude {
    pub use crate::allocator::{
        Allocator, AllocatorStats, FreeListAllocator, FreeListConfig, Handle, LinearAllocator,
        LinearConfig, LinearMark, MemoryUsage, PoolAllocator, PoolBox, PoolConfig, Resettable,
        StackAllocator, StackConfig, StackFrame, StackMarker, StatisticsProvider,
    };
    pub use crate::error::{MemoryError, MemoryResult};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
