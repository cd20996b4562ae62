//! Core domain types for the job watch system.
//!
//! This crate contains shared types used across all packages:
//! - WatchKey and WatchId for identifying watched jobs
//! - WatchedJob, WatchStatus and Progress for job snapshots
//! - PollStatus, PollError and StatusPoller for status checks
//! - WatchEvent for state change notifications

mod config;
mod error;
mod events;
mod job;
mod key;
mod poll;

pub use config::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT, WatchOptions, WatcherConfig};
pub use error::WatchError;
pub use events::WatchEvent;
pub use job::{Progress, WatchStatus, WatchedJob};
pub use key::{WatchId, WatchKey};
pub use poll::{FnPoller, PollError, PollFuture, PollResult, PollStatus, StatusPoller};
