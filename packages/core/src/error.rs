use thiserror::Error;

/// Errors surfaced by the watcher's handle and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    #[error("watch key must not be empty")]
    EmptyKey,

    #[error("invalid watcher config: {0}")]
    InvalidConfig(String),

    #[error("watcher is not running")]
    Unavailable,

    #[error("failed to start watcher: {0}")]
    Spawn(String),
}
