//! Watcher actor owning the active job set and the shared polling loop.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures_util::FutureExt;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use watch_core::{
    PollError, PollResult, PollStatus, Progress, StatusPoller, WatchEvent, WatchId, WatchKey,
    WatchedJob, WatcherConfig,
};

use crate::messages::{WatcherMessage, WatcherStats};
use crate::subscription::{JobHandlers, SubscriberId};

/// A job in the active set.
struct ActiveJob {
    job: WatchedJob,
    /// Monotonic registration time used for timeout checks.
    started: Instant,
    poller: Arc<dyn StatusPoller>,
    /// A status check has been dispatched and not yet reported back.
    in_flight: bool,
    /// Callbacks passed at registration time.
    handlers: Option<Box<dyn JobHandlers>>,
}

/// How a job left the active set.
enum Outcome {
    Completed(serde_json::Value),
    Failed(String),
    TimedOut,
}

/// State for the watcher actor.
pub struct WatcherActorState {
    config: WatcherConfig,
    /// Pending jobs by key.
    jobs: HashMap<WatchKey, ActiveJob>,
    /// Subscribers by key.
    subscribers: HashMap<WatchKey, Vec<(SubscriberId, Box<dyn JobHandlers>)>>,
    /// Event broadcaster.
    event_tx: broadcast::Sender<WatchEvent>,
    /// Tick timer, present only while `jobs` is non-empty.
    timer: Option<JoinHandle<()>>,
    /// Generation of the current timer; ticks from older timers are ignored.
    epoch: u64,
}

impl WatcherActorState {
    /// Create a new watcher actor state.
    pub fn new(config: WatcherConfig, event_tx: broadcast::Sender<WatchEvent>) -> Self {
        Self {
            config,
            jobs: HashMap::new(),
            subscribers: HashMap::new(),
            event_tx,
            timer: None,
            epoch: 0,
        }
    }

    /// Broadcast an event.
    fn broadcast(&self, event: WatchEvent) {
        tracing::debug!("{}", event.description());
        // No receivers is fine.
        let _ = self.event_tx.send(event);
    }

    fn stats(&self) -> WatcherStats {
        WatcherStats {
            active: self.jobs.len(),
            polling: self.timer.is_some(),
            subscribers: self.subscribers.values().map(Vec::len).sum(),
            in_flight: self.jobs.values().filter(|j| j.in_flight).count(),
        }
    }

    fn ensure_timer(&mut self, myself: &ActorRef<WatcherMessage>) {
        if self.timer.is_some() {
            return;
        }

        self.epoch += 1;
        let epoch = self.epoch;
        let period = self.config.interval;
        let watcher = myself.clone();

        self.timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if watcher.send_message(WatcherMessage::Tick { epoch }).is_err() {
                    break;
                }
            }
        }));

        tracing::debug!("Polling loop started (epoch {})", epoch);
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::debug!("Polling loop stopped (epoch {})", self.epoch);
        }
    }

    fn stop_timer_if_idle(&mut self) {
        if self.jobs.is_empty() {
            self.stop_timer();
        }
    }

    /// One poll tick: expire overdue jobs, then dispatch a status check for
    /// every job that has none outstanding.
    fn tick(&mut self, myself: &ActorRef<WatcherMessage>) {
        let now = Instant::now();

        let expired: Vec<WatchKey> = self
            .jobs
            .iter()
            .filter(|(_, active)| now.duration_since(active.started) > active.job.timeout)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.finish(&key, Outcome::TimedOut);
        }

        for (key, active) in self.jobs.iter_mut() {
            if active.in_flight {
                continue;
            }
            active.in_flight = true;
            active.job.polls = active.job.polls.saturating_add(1);
            spawn_poll(
                myself.clone(),
                key.clone(),
                active.job.watch_id,
                active.poller.clone(),
            );
        }
    }

    fn poll_finished(&mut self, key: WatchKey, watch_id: WatchId, result: PollResult) {
        let Some(active) = self.jobs.get_mut(&key) else {
            tracing::debug!("Dropping poll result for {}: no longer watched", key);
            return;
        };
        if active.job.watch_id != watch_id {
            tracing::debug!("Dropping stale poll result for {} ({})", key, watch_id);
            return;
        }
        active.in_flight = false;

        if active.started.elapsed() > active.job.timeout {
            self.finish(&key, Outcome::TimedOut);
            return;
        }

        match result {
            Ok(PollStatus::NotReady) => {}
            Err(e) if e.is_not_yet_available() => {}
            Ok(PollStatus::Progress(progress)) => {
                if active.job.update_progress(progress.clone()) {
                    self.emit_progress(&key, progress);
                }
            }
            Ok(PollStatus::Completed(result)) => self.finish(&key, Outcome::Completed(result)),
            Err(e) => self.finish(&key, Outcome::Failed(e.to_string())),
        }
    }

    fn emit_progress(&mut self, key: &WatchKey, progress: Progress) {
        let Some(active) = self.jobs.get_mut(key) else {
            return;
        };
        let watch_id = active.job.watch_id;

        if let Some(handlers) = active.handlers.as_mut() {
            invoke(key, &mut **handlers, |h| h.on_progress(key, &progress));
        }
        if let Some(subscribers) = self.subscribers.get_mut(key) {
            for (_, handlers) in subscribers.iter_mut() {
                invoke(key, &mut **handlers, |h| h.on_progress(key, &progress));
            }
        }

        self.broadcast(WatchEvent::Progress {
            key: key.clone(),
            watch_id,
            progress,
            timestamp: Utc::now(),
        });
    }

    /// Move a job to its terminal state, remove it, and notify everyone once.
    fn finish(&mut self, key: &WatchKey, outcome: Outcome) {
        let Some(mut active) = self.jobs.remove(key) else {
            return;
        };
        let elapsed = active.started.elapsed();
        let watch_id = active.job.watch_id;
        let timestamp = Utc::now();

        let event = match &outcome {
            Outcome::Completed(result) => {
                active.job.complete(result.clone());
                tracing::info!("Job {} completed after {} polls", key, active.job.polls);
                WatchEvent::Completed {
                    key: key.clone(),
                    watch_id,
                    result: result.clone(),
                    duration_ms: elapsed.as_millis() as u64,
                    timestamp,
                }
            }
            Outcome::Failed(error) => {
                active.job.fail(error.clone());
                tracing::warn!("Job {} failed: {}", key, error);
                WatchEvent::Failed {
                    key: key.clone(),
                    watch_id,
                    error: error.clone(),
                    timestamp,
                }
            }
            Outcome::TimedOut => {
                active.job.time_out();
                tracing::warn!(
                    "Job {} timed out after {}ms",
                    key,
                    active.job.timeout.as_millis()
                );
                WatchEvent::TimedOut {
                    key: key.clone(),
                    watch_id,
                    timeout_ms: active.job.timeout.as_millis() as u64,
                    timestamp,
                }
            }
        };

        let mut subscribers = self.subscribers.remove(key).unwrap_or_default();
        let targets = active
            .handlers
            .iter_mut()
            .chain(subscribers.iter_mut().map(|(_, handlers)| handlers));
        for handlers in targets {
            invoke(key, &mut **handlers, |h| match &outcome {
                Outcome::Completed(result) => h.on_completed(key, result),
                Outcome::Failed(error) => h.on_failed(key, error),
                Outcome::TimedOut => h.on_timeout(key, elapsed),
            });
        }

        self.broadcast(event);
        self.stop_timer_if_idle();
    }
}

/// Run a subscriber callback, containing any panic to that subscriber.
fn invoke(key: &WatchKey, handlers: &mut dyn JobHandlers, f: impl FnOnce(&mut dyn JobHandlers)) {
    if std::panic::catch_unwind(AssertUnwindSafe(|| f(handlers))).is_err() {
        tracing::warn!("Handler for {} panicked", key);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one status check on its own task and report the result back.
fn spawn_poll(
    watcher: ActorRef<WatcherMessage>,
    key: WatchKey,
    watch_id: WatchId,
    poller: Arc<dyn StatusPoller>,
) {
    tokio::spawn(async move {
        let result = match std::panic::catch_unwind(AssertUnwindSafe(|| poller.poll())) {
            Ok(fut) => AssertUnwindSafe(fut)
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(PollError::Panicked(panic_message(&*panic)))),
            Err(panic) => Err(PollError::Panicked(panic_message(&*panic))),
        };

        let finished = WatcherMessage::PollFinished {
            key,
            watch_id,
            result,
        };
        if watcher.send_message(finished).is_err() {
            tracing::debug!("Watcher stopped before a poll result arrived");
        }
    });
}

/// Watcher actor that tracks background jobs until they finish.
pub struct WatcherActor;

impl Actor for WatcherActor {
    type Msg = WatcherMessage;
    type State = WatcherActorState;
    type Arguments = WatcherActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting job watcher (interval {}ms)",
            args.config.interval.as_millis()
        );
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WatcherMessage::Register {
                key,
                poller,
                options,
                handlers,
            } => {
                if state.jobs.contains_key(&key) {
                    tracing::debug!("Already watching {}, ignoring registration", key);
                    return Ok(());
                }

                let job = WatchedJob::new(key.clone(), options.timeout);
                let watch_id = job.watch_id;
                state.jobs.insert(
                    key.clone(),
                    ActiveJob {
                        job,
                        started: Instant::now(),
                        poller,
                        in_flight: false,
                        handlers,
                    },
                );

                state.broadcast(WatchEvent::Registered {
                    key,
                    watch_id,
                    timestamp: Utc::now(),
                });
                state.ensure_timer(&myself);
            }

            WatcherMessage::Unregister { key } => {
                state.subscribers.remove(&key);
                if let Some(active) = state.jobs.remove(&key) {
                    state.broadcast(WatchEvent::Cancelled {
                        key,
                        watch_id: active.job.watch_id,
                        timestamp: Utc::now(),
                    });
                }
                state.stop_timer_if_idle();
            }

            WatcherMessage::Subscribe {
                key,
                subscriber,
                handlers,
            } => {
                state
                    .subscribers
                    .entry(key)
                    .or_default()
                    .push((subscriber, handlers));
            }

            WatcherMessage::Unsubscribe { key, subscriber } => {
                if let Some(subscribers) = state.subscribers.get_mut(&key) {
                    subscribers.retain(|(id, _)| *id != subscriber);
                    if subscribers.is_empty() {
                        state.subscribers.remove(&key);
                    }
                }
            }

            WatcherMessage::IsWatching { key, reply } => {
                let _ = reply.send(state.jobs.contains_key(&key));
            }

            WatcherMessage::GetJob { key, reply } => {
                let _ = reply.send(state.jobs.get(&key).map(|active| active.job.clone()));
            }

            WatcherMessage::ListJobs { reply } => {
                let jobs = state
                    .jobs
                    .values()
                    .map(|active| active.job.clone())
                    .collect();
                let _ = reply.send(jobs);
            }

            WatcherMessage::GetStats { reply } => {
                let _ = reply.send(state.stats());
            }

            WatcherMessage::Tick { epoch } => {
                if epoch == state.epoch && state.timer.is_some() {
                    state.tick(&myself);
                }
            }

            WatcherMessage::PollFinished {
                key,
                watch_id,
                result,
            } => {
                state.poll_finished(key, watch_id, result);
            }

            WatcherMessage::Shutdown => {
                tracing::info!("Shutting down job watcher");
                state.stop_timer();
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.stop_timer();
        if !state.jobs.is_empty() {
            tracing::info!("Job watcher stopped with {} jobs pending", state.jobs.len());
        }
        Ok(())
    }
}
