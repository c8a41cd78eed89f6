//! Scoped stack allocator with destructor unwinding
//!
//! ## Modules
//! - `allocator` - Main `StackAllocator` implementation
//! - `config` - Configuration variants (production, debug)
//! - `frame` - RAII helper for automatic scope release
//! - `marker` - Position markers for scoped deallocation

pub mod allocator;
pub mod config;
pub mod frame;
pub mod marker;

pub use allocator::StackAllocator;
pub use config::StackConfig;
pub use frame::StackFrame;
pub use marker::StackMarker;
