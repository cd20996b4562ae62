//! Configuration for HTTP status endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a single status request may take.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How a 404 from a status URL is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// The result resource does not exist yet; keep polling.
    #[default]
    Pending,
    /// The job is unknown to the backend; fail the watch.
    Absent,
}

/// Settings for a [`crate::StatusEndpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub request_timeout: Duration,
    pub not_found: NotFoundPolicy,
    /// Sent as a bearer token when set.
    pub bearer_token: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            not_found: NotFoundPolicy::default(),
            bearer_token: None,
        }
    }
}

impl EndpointConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_not_found(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found = policy;
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}
