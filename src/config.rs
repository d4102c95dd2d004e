//! Engine configuration
//!
//! Per-context resource limits handed to the engine when a context is
//! created.

use crate::error::{Error, Result};

/// Smallest memory limit a context can start with
pub const MIN_MEMORY_LIMIT: usize = 64 * 1024;

/// Default memory limit (64MB)
pub const DEFAULT_MEMORY_LIMIT: usize = 64 * 1024 * 1024;

/// Default native stack budget for script execution (1MB)
pub const DEFAULT_MAX_STACK_SIZE: usize = 1024 * 1024;

/// Resource limits for one engine context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Total memory the context may allocate, in bytes
    pub memory_limit: usize,
    /// Native stack the engine may use while evaluating, in bytes
    pub max_stack_size: usize,
    /// Allocation volume that triggers a GC cycle; engine default when `None`
    pub gc_threshold: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            memory_limit: DEFAULT_MEMORY_LIMIT,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            gc_threshold: None,
        }
    }
}

impl EngineConfig {
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }

    pub fn with_max_stack_size(mut self, bytes: usize) -> Self {
        self.max_stack_size = bytes;
        self
    }

    pub fn with_gc_threshold(mut self, bytes: usize) -> Self {
        self.gc_threshold = Some(bytes);
        self
    }

    /// Check the limits before they reach the engine
    pub fn validate(&self) -> Result<()> {
        if self.memory_limit < MIN_MEMORY_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "memory limit must be at least {} bytes, got {}",
                MIN_MEMORY_LIMIT, self.memory_limit
            )));
        }
        if self.max_stack_size == 0 {
            return Err(Error::InvalidConfig("max stack size must be non-zero".into()));
        }
        if self.gc_threshold == Some(0) {
            return Err(Error::InvalidConfig("gc threshold must be non-zero".into()));
        }
        Ok(())
    }
}
