//! Free-list allocator configuration

/// Configuration for the free-list allocator
#[derive(Debug, Clone)]
pub struct FreeListConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill raw (untyped) allocations with this byte instead of zero
    pub alloc_pattern: Option<u8>,
    /// Fill freed blocks with this byte
    pub dealloc_pattern: Option<u8>,
}

impl Default for FreeListConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: None,
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
        }
    }
}

impl FreeListConfig {
    /// Production configuration - optimized for performance
    pub fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
        }
    }
}
