//! Error types for ember-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use core::alloc::Layout;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation errors ---
    #[error("memory allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    #[error("invalid memory layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    #[error("invalid alignment: {alignment}")]
    InvalidAlignment { alignment: usize },

    // --- Capacity errors ---
    #[error("memory pool exhausted (capacity: {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("handle table exhausted (capacity: {capacity})")]
    HandlesExhausted { capacity: usize },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- Contract violations ---
    #[error("allocator misuse: {reason}")]
    Misuse { reason: String },
}

impl MemoryError {
    /// Check if the error is retryable.
    ///
    /// Capacity exhaustion is retryable: the caller can free other
    /// allocations (or, for the free-list allocator, defragment) and try
    /// again. Misuse and parameter errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailed { .. }
                | Self::PoolExhausted { .. }
                | Self::HandlesExhausted { .. }
        )
    }

    /// Check if this is a usage-contract violation.
    ///
    /// Misuse errors are observable in tests but non-recoverable by policy;
    /// callers must not paper over them.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::Misuse { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "MEM:ALLOC:FAILED",
            Self::InvalidLayout { .. } => "MEM:ALLOC:LAYOUT",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::PoolExhausted { .. } => "MEM:POOL:EXHAUSTED",
            Self::HandlesExhausted { .. } => "MEM:HANDLE:EXHAUSTED",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::Misuse { .. } => "MEM:CONTRACT:MISUSE",
        }
    }

    // --- Convenience constructors ---

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "memory allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create allocation failed error from layout
    #[must_use]
    pub fn allocation_failed_with_layout(layout: Layout) -> Self {
        Self::allocation_failed(layout.size(), layout.align())
    }

    /// Create invalid layout error
    pub fn invalid_layout(reason: &str) -> Self {
        Self::InvalidLayout {
            reason: reason.to_string(),
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create invalid alignment error
    #[must_use]
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, "memory pool exhausted");

        Self::PoolExhausted { capacity }
    }

    /// Create handle table exhausted error
    pub fn handles_exhausted(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, "handle table exhausted");

        Self::HandlesExhausted { capacity }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create a usage-contract violation error
    pub fn misuse(reason: &str) -> Self {
        #[cfg(feature = "logging")]
        error!(reason, "allocator contract violated");

        Self::Misuse {
            reason: reason.to_string(),
        }
    }
}

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;
