//! Process-wide access to the job watcher.
//!
//! Most applications run exactly one watcher. Installing it here lets
//! adapters deep in the call stack reach it without threading a handle
//! through every layer.

use std::sync::{LazyLock, RwLock};

use crate::watcher::JobWatcher;

/// Holds the installed watcher, if any.
pub struct WatcherRegistry {
    watcher: RwLock<Option<JobWatcher>>,
}

impl WatcherRegistry {
    pub fn new() -> Self {
        Self {
            watcher: RwLock::new(None),
        }
    }

    /// Install `watcher`, returning the one it replaced.
    pub fn install(&self, watcher: JobWatcher) -> Option<JobWatcher> {
        let mut slot = self.watcher.write().unwrap_or_else(|e| e.into_inner());
        slot.replace(watcher)
    }

    /// The installed watcher.
    pub fn get(&self) -> Option<JobWatcher> {
        self.watcher
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Remove the installed watcher without stopping it.
    pub fn clear(&self) -> Option<JobWatcher> {
        self.watcher
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl Default for WatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: LazyLock<WatcherRegistry> = LazyLock::new(WatcherRegistry::new);

/// Get the global watcher registry.
pub fn global_registry() -> &'static WatcherRegistry {
    &REGISTRY
}

/// Install `watcher` as the process-wide watcher.
pub fn install_global(watcher: JobWatcher) -> Option<JobWatcher> {
    REGISTRY.install(watcher)
}

/// The process-wide watcher, if one has been installed.
pub fn global_watcher() -> Option<JobWatcher> {
    REGISTRY.get()
}
