//! Cloneable handle to a running watcher actor.

use std::sync::Arc;

use ractor::{Actor, ActorRef, RpcReplyPort};
use tokio::sync::broadcast;
use watch_core::{
    StatusPoller, WatchError, WatchEvent, WatchKey, WatchOptions, WatchedJob, WatcherConfig,
};

use crate::messages::{WatcherMessage, WatcherStats};
use crate::subscription::{JobHandlers, SubscriberId, Subscription};
use crate::watcher_actor::{WatcherActor, WatcherActorState};

/// Handle to the job watcher.
///
/// Registration, cancellation and subscription are fire-and-forget: they never
/// fail at the call site, and every outcome is delivered through handlers or
/// the event stream. Clones share the same watcher.
#[derive(Clone)]
pub struct JobWatcher {
    actor: ActorRef<WatcherMessage>,
    events: broadcast::Sender<WatchEvent>,
    default_options: WatchOptions,
}

impl JobWatcher {
    /// Start a watcher with the given configuration.
    pub async fn start(
        config: WatcherConfig,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), WatchError> {
        config.validate()?;

        let (events, _) = broadcast::channel(config.event_capacity);
        let default_options = config.default_options();
        let name = config.name.clone();
        let state = WatcherActorState::new(config, events.clone());

        let (actor, handle) = Actor::spawn(name, WatcherActor, state)
            .await
            .map_err(|e| WatchError::Spawn(e.to_string()))?;

        Ok((
            Self {
                actor,
                events,
                default_options,
            },
            handle,
        ))
    }

    /// Options carrying the configured default timeout.
    pub fn default_options(&self) -> WatchOptions {
        self.default_options
    }

    /// Start watching `key`. Ignored if `key` is already being watched.
    pub fn register(&self, key: WatchKey, poller: impl StatusPoller, options: WatchOptions) {
        self.send_register(key, Arc::new(poller), options, None);
    }

    /// Start watching `key` with callbacks bound to this registration.
    ///
    /// If `key` is already being watched the registration is ignored and the
    /// handlers are dropped with it; use [`JobWatcher::subscribe`] to follow
    /// an existing watch.
    pub fn register_with(
        &self,
        key: WatchKey,
        poller: impl StatusPoller,
        options: WatchOptions,
        handlers: impl JobHandlers,
    ) {
        self.send_register(key, Arc::new(poller), options, Some(Box::new(handlers)));
    }

    /// Start watching `key` with a poller shared with other call sites.
    pub fn register_shared(
        &self,
        key: WatchKey,
        poller: Arc<dyn StatusPoller>,
        options: WatchOptions,
    ) {
        self.send_register(key, poller, options, None);
    }

    fn send_register(
        &self,
        key: WatchKey,
        poller: Arc<dyn StatusPoller>,
        options: WatchOptions,
        handlers: Option<Box<dyn JobHandlers>>,
    ) {
        let message = WatcherMessage::Register {
            key: key.clone(),
            poller,
            options,
            handlers,
        };
        if self.actor.send_message(message).is_err() {
            tracing::warn!("Job watcher is not running; dropped registration for {}", key);
        }
    }

    /// Stop watching `key`. A no-op when `key` is not watched.
    ///
    /// No handler fires for `key` after this is processed, including when it
    /// is called from inside one of that job's handlers.
    pub fn unregister(&self, key: &WatchKey) {
        let message = WatcherMessage::Unregister { key: key.clone() };
        if self.actor.send_message(message).is_err() {
            tracing::warn!("Job watcher is not running; dropped unregister for {}", key);
        }
    }

    /// Attach callbacks to `key`.
    ///
    /// The subscription covers the job currently (or next) watched under
    /// `key` and ends when that job reaches a terminal state or the returned
    /// handle is dropped.
    pub fn subscribe(&self, key: WatchKey, handlers: impl JobHandlers) -> Subscription {
        let subscriber = SubscriberId::new();
        let message = WatcherMessage::Subscribe {
            key: key.clone(),
            subscriber,
            handlers: Box::new(handlers),
        };
        if self.actor.send_message(message).is_err() {
            tracing::warn!("Job watcher is not running; dropped subscription to {}", key);
        }
        Subscription::new(key, subscriber, self.actor.clone())
    }

    /// Whether `key` has an active job. A stopped watcher watches nothing.
    pub async fn is_watching(&self, key: &WatchKey) -> bool {
        self.call(|reply| WatcherMessage::IsWatching {
            key: key.clone(),
            reply,
        })
        .await
        .unwrap_or(false)
    }

    /// Snapshot of the active job under `key`.
    pub async fn job(&self, key: &WatchKey) -> Result<Option<WatchedJob>, WatchError> {
        self.call(|reply| WatcherMessage::GetJob {
            key: key.clone(),
            reply,
        })
        .await
    }

    /// Snapshots of all active jobs.
    pub async fn jobs(&self) -> Result<Vec<WatchedJob>, WatchError> {
        self.call(|reply| WatcherMessage::ListJobs { reply }).await
    }

    /// Current watcher counters.
    pub async fn stats(&self) -> Result<WatcherStats, WatchError> {
        self.call(|reply| WatcherMessage::GetStats { reply }).await
    }

    /// Subscribe to every event the watcher emits.
    pub fn events(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }

    /// Stop the watcher. Pending jobs are dropped without terminal events.
    pub fn shutdown(&self) {
        let _ = self.actor.send_message(WatcherMessage::Shutdown);
    }

    async fn call<T: Send + 'static>(
        &self,
        message: impl FnOnce(RpcReplyPort<T>) -> WatcherMessage,
    ) -> Result<T, WatchError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(message(tx.into()))
            .map_err(|_| WatchError::Unavailable)?;
        rx.await.map_err(|_| WatchError::Unavailable)
    }
}
