//! Progress readout for report exports.

use std::sync::Arc;
use std::time::Duration;

use actors::{JobHandlers, JobWatcher, Subscription};
use tokio::sync::watch;
use watch_core::{Progress, StatusPoller, WatchKey, WatchOptions};

use crate::error::AdapterError;
use crate::toast::{Notification, Notifier};

const EXPORT_NAMESPACE: &str = "export";

/// What a progress bar shows for one export.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExportState {
    /// Submitted, no progress reported yet.
    #[default]
    Idle,
    Running(Progress),
    Completed(serde_json::Value),
    Failed(String),
    TimedOut,
}

impl ExportState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ExportState::Completed(_) | ExportState::Failed(_) | ExportState::TimedOut
        )
    }

    /// Bar fill between 0 and 1, if known.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            ExportState::Idle => Some(0.0),
            ExportState::Running(progress) => Some(progress.fraction()),
            ExportState::Completed(_) => Some(1.0),
            ExportState::Failed(_) | ExportState::TimedOut => None,
        }
    }

    /// Text shown next to the bar.
    pub fn label(&self) -> String {
        match self {
            ExportState::Idle => "Preparing export...".to_string(),
            ExportState::Running(progress) if progress.label.is_empty() => {
                format!("Step {} of {}", progress.step, progress.total)
            }
            ExportState::Running(progress) => format!(
                "{} ({} of {})",
                progress.label, progress.step, progress.total
            ),
            ExportState::Completed(_) => "Export ready".to_string(),
            ExportState::Failed(message) => message.clone(),
            ExportState::TimedOut => "Export timed out".to_string(),
        }
    }
}

/// Tracks report exports and surfaces their failures as error toasts.
#[derive(Clone)]
pub struct ExportProgress {
    watcher: JobWatcher,
    notifier: Arc<dyn Notifier>,
    options: WatchOptions,
}

impl ExportProgress {
    pub fn new(watcher: JobWatcher, notifier: impl Notifier) -> Self {
        let options = watcher.default_options();
        Self {
            watcher,
            notifier: Arc::new(notifier),
            options,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    /// Start tracking export `export_id`.
    ///
    /// Tracking the same export twice shares the running watch; each tracker
    /// follows it independently.
    pub fn track(
        &self,
        export_id: &str,
        poller: impl StatusPoller,
    ) -> Result<ExportTracker, AdapterError> {
        let key = WatchKey::scoped(EXPORT_NAMESPACE, export_id)?;
        let (tx, rx) = watch::channel(ExportState::Idle);

        // Subscribe first so the very first progress report is not missed.
        let subscription = self.watcher.subscribe(
            key.clone(),
            ExportHandlers {
                state: tx,
                notifier: self.notifier.clone(),
            },
        );
        self.watcher.register(key, poller, self.options);

        Ok(ExportTracker {
            state: rx,
            subscription: Arc::new(subscription),
        })
    }

    /// Abandon an export. Its trackers stop updating.
    pub fn cancel(&self, tracker: &ExportTracker) {
        self.watcher.unregister(tracker.key());
    }
}

/// Read side of one tracked export.
///
/// Clones share one subscription. Once every clone is dropped the export
/// stops reporting to it, though the watch itself keeps running.
#[derive(Debug, Clone)]
pub struct ExportTracker {
    state: watch::Receiver<ExportState>,
    subscription: Arc<Subscription>,
}

impl ExportTracker {
    pub fn key(&self) -> &WatchKey {
        self.subscription.key()
    }

    /// Current state.
    pub fn state(&self) -> ExportState {
        self.state.borrow().clone()
    }

    /// Receiver for binding to a progress bar.
    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.clone()
    }

    /// Wait for a terminal state.
    ///
    /// Returns the last known state if the export is cancelled first.
    pub async fn finished(&mut self) -> ExportState {
        loop {
            let state = self.state.borrow_and_update().clone();
            if state.is_finished() {
                return state;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }
}

struct ExportHandlers {
    state: watch::Sender<ExportState>,
    notifier: Arc<dyn Notifier>,
}

impl JobHandlers for ExportHandlers {
    fn on_progress(&mut self, _key: &WatchKey, progress: &Progress) {
        self.state.send_replace(ExportState::Running(progress.clone()));
    }

    fn on_completed(&mut self, key: &WatchKey, result: &serde_json::Value) {
        tracing::info!("Export {} is ready", key);
        self.state.send_replace(ExportState::Completed(result.clone()));
    }

    fn on_failed(&mut self, _key: &WatchKey, message: &str) {
        self.notifier
            .notify(Notification::error("Export failed", message));
        self.state.send_replace(ExportState::Failed(message.to_string()));
    }

    fn on_timeout(&mut self, _key: &WatchKey, _elapsed: Duration) {
        self.notifier.notify(Notification::error(
            "Export timed out",
            "The export took too long. Please try again.",
        ));
        self.state.send_replace(ExportState::TimedOut);
    }
}
