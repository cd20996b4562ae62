//! Feature adapters that present watched jobs to the user.
//!
//! The adapters observe the job watcher and translate its outcomes into UI
//! terms; they hold no polling state of their own.
//! - `CompletionNotifier` raises a toast with a link when a result is ready
//! - `ExportProgress` drives a progress bar for report exports
//! - `ToastQueue` is the in-memory notification sink the UI drains

mod error;
mod notification;
mod progress;
mod toast;

pub use error::AdapterError;
pub use notification::{CompletionNotifier, ResultTemplate};
pub use progress::{ExportProgress, ExportState, ExportTracker};
pub use toast::{NavigationAction, Notification, Notifier, ToastLevel, ToastQueue};
