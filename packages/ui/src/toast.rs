//! Notifications and the in-memory toast queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    /// CSS class for the toast container.
    pub fn class(&self) -> &'static str {
        match self {
            ToastLevel::Info => "toast-info",
            ToastLevel::Success => "toast-success",
            ToastLevel::Warning => "toast-warning",
            ToastLevel::Error => "toast-error",
        }
    }
}

/// A link the user can follow from a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationAction {
    pub label: String,
    pub route: String,
}

/// A message for the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Ulid,
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    /// Persistent notifications stay until dismissed.
    pub persistent: bool,
    pub action: Option<NavigationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: ToastLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            level,
            title: title.into(),
            message: message.into(),
            persistent: false,
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, title, message)
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn with_action(mut self, label: impl Into<String>, route: impl Into<String>) -> Self {
        self.action = Some(NavigationAction {
            label: label.into(),
            route: route.into(),
        });
        self
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

/// Cloneable in-memory notification queue the UI drains on render.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Arc<Mutex<VecDeque<Notification>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.lock().drain(..).collect()
    }

    /// Copy of the queued notifications without removing them.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    /// Remove one notification, e.g. when the user dismisses it.
    pub fn dismiss(&self, id: Ulid) -> bool {
        let mut toasts = self.lock();
        let before = toasts.len();
        toasts.retain(|n| n.id != id);
        toasts.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notification: Notification) {
        tracing::debug!("Queued {:?} toast: {}", notification.level, notification.title);
        self.lock().push_back(notification);
    }
}
