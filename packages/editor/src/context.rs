//! Per-application dependencies shared by editors, persistence and hosts.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::EditorConfig;
use crate::storage::{KeyValueStore, MemoryStore, StorageKeys};

/// Explicit replacement for process-wide globals: configuration, the
/// key-value store and the clock.
///
/// Cheap to clone; clones share the store and clock.
#[derive(Clone)]
pub struct EditorContext {
    pub config: EditorConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

impl EditorContext {
    pub fn new(config: EditorConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Default config over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(EditorConfig::default(), Arc::new(MemoryStore::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn keys(&self) -> StorageKeys {
        StorageKeys::new(self.config.storage_prefix.clone())
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }
}

impl std::fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
