//! Watched job records and their lifecycle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{WatchId, WatchKey};

/// Lifecycle status of a watched job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    /// Still waiting for the backend to finish.
    #[default]
    Pending,
    /// The backend returned a result.
    Completed,
    /// The backend reported a failure or the status check failed.
    Failed,
    /// No terminal answer arrived within the job's timeout.
    TimedOut,
}

impl WatchStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WatchStatus::Pending)
    }

    /// Get a simple status string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Pending => "pending",
            WatchStatus::Completed => "completed",
            WatchStatus::Failed => "failed",
            WatchStatus::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step-indexed progress reported by a status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub step: u32,
    pub total: u32,
    #[serde(default)]
    pub label: String,
}

impl Progress {
    pub fn new(step: u32, total: u32, label: impl Into<String>) -> Self {
        Self {
            step,
            total,
            label: label.into(),
        }
    }

    /// Completed fraction in `0.0..=1.0`; zero when the total is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (f64::from(self.step) / f64::from(self.total)).min(1.0)
    }
}

/// Snapshot of one in-flight (or just finished) background computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedJob {
    pub key: WatchKey,
    pub watch_id: WatchId,
    /// When the watch was registered.
    pub started_at: DateTime<Utc>,
    /// Maximum time to wait for a terminal answer.
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    pub status: WatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// Present only when completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Present only when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Number of status checks issued so far.
    #[serde(default)]
    pub polls: u32,
}

impl WatchedJob {
    /// Create a new pending job.
    pub fn new(key: WatchKey, timeout: Duration) -> Self {
        Self {
            key,
            watch_id: WatchId::new(),
            started_at: Utc::now(),
            timeout,
            status: WatchStatus::Pending,
            progress: None,
            result: None,
            error_message: None,
            polls: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WatchStatus::Pending
    }

    /// Record a progress report.
    ///
    /// Returns `true` when the stored progress changed. Reports that move
    /// `step` backwards, repeat the current value, or arrive after a terminal
    /// transition are ignored.
    pub fn update_progress(&mut self, progress: Progress) -> bool {
        if !self.is_pending() {
            return false;
        }
        match &self.progress {
            Some(current) if progress.step < current.step || *current == progress => false,
            _ => {
                self.progress = Some(progress);
                true
            }
        }
    }

    /// Mark the job completed. Returns `false` if it was already terminal.
    pub fn complete(&mut self, result: serde_json::Value) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = WatchStatus::Completed;
        self.result = Some(result);
        true
    }

    /// Mark the job failed. Returns `false` if it was already terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = WatchStatus::Failed;
        self.error_message = Some(message.into());
        true
    }

    /// Mark the job timed out. Returns `false` if it was already terminal.
    pub fn time_out(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = WatchStatus::TimedOut;
        true
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
