//! Working-memory availability probe.
//!
//! Summarization builds a context that duplicates the transcript text
//! several times; the worker checks headroom before committing to a call.

use std::sync::Mutex;

/// Trait for querying available working memory.
pub trait ResourceProbe: Send + Sync {
    /// Bytes of memory currently available to this process.
    fn available_memory(&self) -> u64;
}

/// Probe backed by sysinfo's system memory accounting.
pub struct SystemResources {
    system: Mutex<sysinfo::System>,
}

impl SystemResources {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(sysinfo::System::new()),
        }
    }
}

impl Default for SystemResources {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SystemResources {
    fn available_memory(&self) -> u64 {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_memory();
        system.available_memory()
    }
}

/// Mock probe reporting a fixed amount of memory.
#[derive(Debug, Clone, Copy)]
pub struct MockResources {
    bytes: u64,
}

impl MockResources {
    /// Create a probe reporting `bytes` available.
    pub fn with_available(bytes: u64) -> Self {
        Self { bytes }
    }

    /// Create a probe reporting ample memory.
    pub fn ample() -> Self {
        Self::with_available(u64::MAX)
    }
}

impl ResourceProbe for MockResources {
    fn available_memory(&self) -> u64 {
        self.bytes
    }
}
