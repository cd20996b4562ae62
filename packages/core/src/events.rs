//! Event types for watch state changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Progress, WatchId, WatchKey};

/// Events emitted by the job watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    /// A new watch was accepted.
    Registered {
        key: WatchKey,
        watch_id: WatchId,
        timestamp: DateTime<Utc>,
    },
    /// A pending job reported progress.
    Progress {
        key: WatchKey,
        watch_id: WatchId,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },
    /// A job finished with a result.
    Completed {
        key: WatchKey,
        watch_id: WatchId,
        result: serde_json::Value,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A job failed.
    Failed {
        key: WatchKey,
        watch_id: WatchId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// A job produced no terminal answer within its timeout.
    TimedOut {
        key: WatchKey,
        watch_id: WatchId,
        timeout_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A watch was removed by `unregister` before finishing.
    Cancelled {
        key: WatchKey,
        watch_id: WatchId,
        timestamp: DateTime<Utc>,
    },
}

impl WatchEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            WatchEvent::Registered { timestamp, .. } => *timestamp,
            WatchEvent::Progress { timestamp, .. } => *timestamp,
            WatchEvent::Completed { timestamp, .. } => *timestamp,
            WatchEvent::Failed { timestamp, .. } => *timestamp,
            WatchEvent::TimedOut { timestamp, .. } => *timestamp,
            WatchEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    /// Get the key of the job this event belongs to.
    pub fn key(&self) -> &WatchKey {
        match self {
            WatchEvent::Registered { key, .. } => key,
            WatchEvent::Progress { key, .. } => key,
            WatchEvent::Completed { key, .. } => key,
            WatchEvent::Failed { key, .. } => key,
            WatchEvent::TimedOut { key, .. } => key,
            WatchEvent::Cancelled { key, .. } => key,
        }
    }

    /// Get the registration this event belongs to.
    pub fn watch_id(&self) -> WatchId {
        match self {
            WatchEvent::Registered { watch_id, .. } => *watch_id,
            WatchEvent::Progress { watch_id, .. } => *watch_id,
            WatchEvent::Completed { watch_id, .. } => *watch_id,
            WatchEvent::Failed { watch_id, .. } => *watch_id,
            WatchEvent::TimedOut { watch_id, .. } => *watch_id,
            WatchEvent::Cancelled { watch_id, .. } => *watch_id,
        }
    }

    /// Whether this is the last event for its job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WatchEvent::Completed { .. }
                | WatchEvent::Failed { .. }
                | WatchEvent::TimedOut { .. }
                | WatchEvent::Cancelled { .. }
        )
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            WatchEvent::Registered { key, .. } => format!("Watching {}", key),
            WatchEvent::Progress { key, progress, .. } => format!(
                "{} at step {}/{}: {}",
                key, progress.step, progress.total, progress.label
            ),
            WatchEvent::Completed {
                key, duration_ms, ..
            } => format!("{} completed in {}ms", key, duration_ms),
            WatchEvent::Failed { key, error, .. } => format!("{} failed: {}", key, error),
            WatchEvent::TimedOut {
                key, timeout_ms, ..
            } => format!("{} timed out after {}ms", key, timeout_ms),
            WatchEvent::Cancelled { key, .. } => format!("{} no longer watched", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = WatchEvent::TimedOut {
            key: WatchKey::parse("p2").unwrap(),
            watch_id: WatchId::new(),
            timeout_ms: 50,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "timed_out");
        assert_eq!(json["key"], "p2");

        let back: WatchEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn progress_is_not_terminal() {
        let event = WatchEvent::Progress {
            key: WatchKey::parse("export:9").unwrap(),
            watch_id: WatchId::new(),
            progress: Progress::new(2, 5, "Rendering charts"),
            timestamp: Utc::now(),
        };
        assert!(!event.is_terminal());
        assert_eq!(
            event.description(),
            "export:9 at step 2/5: Rendering charts"
        );
    }
}
