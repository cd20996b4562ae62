//! HTTP status checks for watched jobs.
//!
//! This crate turns a backend status URL into a [`watch_core::StatusPoller`]:
//! - `StatusEndpoint` performs the GET request
//! - `classify` maps status codes and JSON bodies to poll outcomes
//! - `EndpointConfig` carries the request timeout and 404 policy

mod classify;
mod config;
mod endpoint;
mod error;

pub use classify::classify;
pub use config::{DEFAULT_REQUEST_TIMEOUT, EndpointConfig, NotFoundPolicy};
pub use endpoint::StatusEndpoint;
pub use error::EndpointError;

// Re-export core types for convenience
pub use watch_core::{PollError, PollResult, PollStatus, Progress, StatusPoller};
