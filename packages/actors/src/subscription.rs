//! Subscriber callbacks and subscription handles.

use std::time::Duration;

use ractor::ActorRef;
use ulid::Ulid;
use watch_core::{Progress, WatchKey};

use crate::messages::WatcherMessage;

/// Callbacks for one job's state changes.
///
/// All methods default to no-ops. For a given job, `on_progress` may fire any
/// number of times, followed by exactly one of the terminal callbacks.
/// Callbacks run on the watcher's own task, so they should return quickly.
pub trait JobHandlers: Send + 'static {
    fn on_progress(&mut self, _key: &WatchKey, _progress: &Progress) {}

    fn on_completed(&mut self, _key: &WatchKey, _result: &serde_json::Value) {}

    fn on_failed(&mut self, _key: &WatchKey, _message: &str) {}

    fn on_timeout(&mut self, _key: &WatchKey, _elapsed: Duration) {}
}

type ProgressFn = Box<dyn FnMut(&WatchKey, &Progress) + Send>;
type CompletedFn = Box<dyn FnMut(&WatchKey, &serde_json::Value) + Send>;
type FailedFn = Box<dyn FnMut(&WatchKey, &str) + Send>;
type TimeoutFn = Box<dyn FnMut(&WatchKey, Duration) + Send>;

/// Closure-based [`JobHandlers`]; unset callbacks are skipped.
#[derive(Default)]
pub struct Handlers {
    progress: Option<ProgressFn>,
    completed: Option<CompletedFn>,
    failed: Option<FailedFn>,
    timeout: Option<TimeoutFn>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl FnMut(&WatchKey, &Progress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn on_completed(
        mut self,
        f: impl FnMut(&WatchKey, &serde_json::Value) + Send + 'static,
    ) -> Self {
        self.completed = Some(Box::new(f));
        self
    }

    pub fn on_failed(mut self, f: impl FnMut(&WatchKey, &str) + Send + 'static) -> Self {
        self.failed = Some(Box::new(f));
        self
    }

    pub fn on_timeout(mut self, f: impl FnMut(&WatchKey, Duration) + Send + 'static) -> Self {
        self.timeout = Some(Box::new(f));
        self
    }
}

impl JobHandlers for Handlers {
    fn on_progress(&mut self, key: &WatchKey, progress: &Progress) {
        if let Some(f) = self.progress.as_mut() {
            f(key, progress);
        }
    }

    fn on_completed(&mut self, key: &WatchKey, result: &serde_json::Value) {
        if let Some(f) = self.completed.as_mut() {
            f(key, result);
        }
    }

    fn on_failed(&mut self, key: &WatchKey, message: &str) {
        if let Some(f) = self.failed.as_mut() {
            f(key, message);
        }
    }

    fn on_timeout(&mut self, key: &WatchKey, elapsed: Duration) {
        if let Some(f) = self.timeout.as_mut() {
            f(key, elapsed);
        }
    }
}

/// Identifier of one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Ulid);

impl SubscriberId {
    pub(crate) fn new() -> Self {
        Self(Ulid::new())
    }
}

/// Handle returned by `JobWatcher::subscribe`.
///
/// Delivery lasts while the handle is held. Dropping it (or calling
/// [`Subscription::unsubscribe`]) removes the subscriber; use
/// [`Subscription::detach`] to keep it until the job's terminal event.
pub struct Subscription {
    key: WatchKey,
    id: SubscriberId,
    watcher: Option<ActorRef<WatcherMessage>>,
}

impl Subscription {
    pub(crate) fn new(key: WatchKey, id: SubscriberId, watcher: ActorRef<WatcherMessage>) -> Self {
        Self {
            key,
            id,
            watcher: Some(watcher),
        }
    }

    pub fn key(&self) -> &WatchKey {
        &self.key
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Stop delivery to this subscriber. Other subscribers and the job are unaffected.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Let the subscriber outlive this handle.
    ///
    /// It is removed by the job's terminal event or by `unregister`. A key
    /// that is never registered keeps it until the watcher stops.
    pub fn detach(mut self) {
        self.watcher = None;
    }

    fn release(&mut self) {
        let Some(watcher) = self.watcher.take() else {
            return;
        };
        let message = WatcherMessage::Unsubscribe {
            key: self.key.clone(),
            subscriber: self.id,
        };
        if let Err(e) = watcher.send_message(message) {
            tracing::debug!("Watcher gone before unsubscribing from {}: {}", self.key, e);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("attached", &self.watcher.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn handlers_skip_unset_callbacks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut handlers = Handlers::new().on_failed(move |key, message| {
            sink.lock().unwrap().push(format!("{}: {}", key, message));
        });

        let key = WatchKey::parse("cluster:3").unwrap();
        JobHandlers::on_progress(&mut handlers, &key, &Progress::new(1, 2, "k-means"));
        JobHandlers::on_completed(&mut handlers, &key, &serde_json::json!({}));
        JobHandlers::on_failed(&mut handlers, &key, "too few cases");

        assert_eq!(*seen.lock().unwrap(), vec!["cluster:3: too few cases"]);
    }
}
