//! Message types for the watcher actor.

use std::fmt;
use std::sync::Arc;

use ractor::RpcReplyPort;
use watch_core::{PollResult, StatusPoller, WatchId, WatchKey, WatchOptions, WatchedJob};

use crate::subscription::{JobHandlers, SubscriberId};

/// Messages for the WatcherActor.
pub enum WatcherMessage {
    /// Start watching a job, unless its key is already watched.
    Register {
        key: WatchKey,
        poller: Arc<dyn StatusPoller>,
        options: WatchOptions,
        handlers: Option<Box<dyn JobHandlers>>,
    },

    /// Stop watching a job without a terminal event.
    Unregister { key: WatchKey },

    /// Attach callbacks to a key.
    Subscribe {
        key: WatchKey,
        subscriber: SubscriberId,
        handlers: Box<dyn JobHandlers>,
    },

    /// Detach one subscriber.
    Unsubscribe {
        key: WatchKey,
        subscriber: SubscriberId,
    },

    /// Check whether a key has an active job.
    IsWatching {
        key: WatchKey,
        reply: RpcReplyPort<bool>,
    },

    /// Get a snapshot of one active job.
    GetJob {
        key: WatchKey,
        reply: RpcReplyPort<Option<WatchedJob>>,
    },

    /// Get snapshots of all active jobs.
    ListJobs { reply: RpcReplyPort<Vec<WatchedJob>> },

    /// Get watcher stats.
    GetStats { reply: RpcReplyPort<WatcherStats> },

    /// Poll tick from the timer of the given generation.
    Tick { epoch: u64 },

    /// A status check finished.
    PollFinished {
        key: WatchKey,
        watch_id: WatchId,
        result: PollResult,
    },

    /// Stop the watcher.
    Shutdown,
}

impl fmt::Debug for WatcherMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherMessage::Register { key, options, .. } => f
                .debug_struct("Register")
                .field("key", key)
                .field("options", options)
                .finish_non_exhaustive(),
            WatcherMessage::Unregister { key } => {
                f.debug_struct("Unregister").field("key", key).finish()
            }
            WatcherMessage::Subscribe {
                key, subscriber, ..
            } => f
                .debug_struct("Subscribe")
                .field("key", key)
                .field("subscriber", subscriber)
                .finish_non_exhaustive(),
            WatcherMessage::Unsubscribe { key, subscriber } => f
                .debug_struct("Unsubscribe")
                .field("key", key)
                .field("subscriber", subscriber)
                .finish(),
            WatcherMessage::IsWatching { key, .. } => {
                f.debug_struct("IsWatching").field("key", key).finish_non_exhaustive()
            }
            WatcherMessage::GetJob { key, .. } => {
                f.debug_struct("GetJob").field("key", key).finish_non_exhaustive()
            }
            WatcherMessage::ListJobs { .. } => f.write_str("ListJobs"),
            WatcherMessage::GetStats { .. } => f.write_str("GetStats"),
            WatcherMessage::Tick { epoch } => f.debug_struct("Tick").field("epoch", epoch).finish(),
            WatcherMessage::PollFinished {
                key,
                watch_id,
                result,
            } => f
                .debug_struct("PollFinished")
                .field("key", key)
                .field("watch_id", watch_id)
                .field("result", result)
                .finish(),
            WatcherMessage::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Point-in-time counters for the watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherStats {
    /// Jobs currently pending.
    pub active: usize,
    /// Whether the tick timer is running.
    pub polling: bool,
    /// Subscribers attached across all keys.
    pub subscribers: usize,
    /// Status checks currently in flight.
    pub in_flight: usize,
}
