//! Pool allocator configuration

/// Configuration for the pool allocator
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill released slots with this byte
    pub dealloc_pattern: Option<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
        }
    }
}

impl PoolConfig {
    /// Production configuration - optimized for performance
    pub fn production() -> Self {
        Self {
            track_stats: false,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            dealloc_pattern: Some(0xDD),
        }
    }
}
