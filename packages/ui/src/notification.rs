//! Completion toasts for long-running result jobs.

use std::sync::Arc;
use std::time::Duration;

use actors::{JobHandlers, JobWatcher};
use api::{EndpointConfig, StatusEndpoint};
use serde::{Deserialize, Serialize};
use watch_core::{StatusPoller, WatchKey, WatchOptions};

use crate::error::AdapterError;
use crate::toast::{Notification, Notifier};

/// Kinds of result a user waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTemplate {
    Summary,
    WaveComparison,
    Clustering,
}

impl ResultTemplate {
    /// Key namespace for jobs of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultTemplate::Summary => "summary",
            ResultTemplate::WaveComparison => "wave_comparison",
            ResultTemplate::Clustering => "clustering",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ResultTemplate::Summary => "Summary ready",
            ResultTemplate::WaveComparison => "Wave comparison ready",
            ResultTemplate::Clustering => "Clustering ready",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ResultTemplate::Summary => "Your AI summary has finished generating.",
            ResultTemplate::WaveComparison => "Your wave comparison has finished.",
            ResultTemplate::Clustering => "Your clustering analysis has finished.",
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            ResultTemplate::Summary => "View summary",
            ResultTemplate::WaveComparison => "View comparison",
            ResultTemplate::Clustering => "View clusters",
        }
    }

    /// Route of the result page for `subject`.
    pub fn route(&self, subject: &str) -> String {
        match self {
            ResultTemplate::Summary => format!("/surveys/{}/summary", subject),
            ResultTemplate::WaveComparison => format!("/surveys/{}/waves/compare", subject),
            ResultTemplate::Clustering => format!("/surveys/{}/clusters", subject),
        }
    }

    /// Watch key for this kind of result on `subject`.
    pub fn key(&self, subject: &str) -> Result<WatchKey, AdapterError> {
        Ok(WatchKey::scoped(self.as_str(), subject)?)
    }
}

/// Raises a persistent toast with a link when a pending result is ready.
///
/// Timeouts are dropped silently and failures only logged, since the user can
/// always regenerate the result from its page.
#[derive(Clone)]
pub struct CompletionNotifier {
    watcher: JobWatcher,
    notifier: Arc<dyn Notifier>,
    options: WatchOptions,
}

impl CompletionNotifier {
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

    /// Watch a submitted result job. A job already watched under the same
    /// template and subject keeps its original toast.
    pub fn watch(
        &self,
        template: ResultTemplate,
        subject: &str,
        poller: impl StatusPoller,
    ) -> Result<WatchKey, AdapterError> {
        let key = template.key(subject)?;
        let handlers = CompletionHandlers {
            template,
            subject: subject.to_string(),
            notifier: self.notifier.clone(),
        };
        self.watcher
            .register_with(key.clone(), poller, self.options, handlers);
        Ok(key)
    }

    /// Watch a result job through its HTTP status URL.
    pub fn watch_url(
        &self,
        template: ResultTemplate,
        subject: &str,
        url: &str,
        config: EndpointConfig,
    ) -> Result<WatchKey, AdapterError> {
        let endpoint = StatusEndpoint::new(url, config)?;
        self.watch(template, subject, endpoint)
    }

    /// Stop waiting on a result, e.g. when the user leaves the survey.
    pub fn cancel(&self, template: ResultTemplate, subject: &str) -> Result<(), AdapterError> {
        self.watcher.unregister(&template.key(subject)?);
        Ok(())
    }
}

struct CompletionHandlers {
    template: ResultTemplate,
    subject: String,
    notifier: Arc<dyn Notifier>,
}

impl JobHandlers for CompletionHandlers {
    fn on_completed(&mut self, _key: &WatchKey, _result: &serde_json::Value) {
        let notification = Notification::success(self.template.title(), self.template.message())
            .persistent()
            .with_action(
                self.template.action_label(),
                self.template.route(&self.subject),
            );
        self.notifier.notify(notification);
    }

    fn on_failed(&mut self, key: &WatchKey, message: &str) {
        tracing::warn!("Result job {} failed: {}", key, message);
    }

    fn on_timeout(&mut self, key: &WatchKey, elapsed: Duration) {
        tracing::debug!(
            "Gave up on result job {} after {}ms",
            key,
            elapsed.as_millis()
        );
    }
}
