//! Identifiers for watched jobs.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::WatchError;

/// Dedup key for a watched job, e.g. `summary:<project id>` or `export:<id>`.
///
/// Keys are opaque to the watcher; the only rule is that they are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WatchKey(String);

impl WatchKey {
    /// Parse a key, rejecting empty or whitespace-only input.
    pub fn parse(s: impl Into<String>) -> Result<Self, WatchError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(WatchError::EmptyKey);
        }
        Ok(Self(s))
    }

    /// Build a `<namespace>:<id>` key.
    pub fn scoped(namespace: &str, id: impl std::fmt::Display) -> Result<Self, WatchError> {
        Self::parse(format!("{}:{}", namespace, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WatchKey {
    type Error = WatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for WatchKey {
    type Error = WatchError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<WatchKey> for String {
    fn from(key: WatchKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for WatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one accepted registration.
///
/// Two jobs watched one after the other under the same key get different ids,
/// which lets the watcher discard poll results that belong to the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(pub Ulid);

impl WatchId {
    /// Create a new unique watch ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a watch ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
