//! HTTP status checks.

use std::sync::Arc;

use reqwest::{Client, Url};
use watch_core::{PollError, PollFuture, PollResult, StatusPoller};

use crate::classify::classify;
use crate::config::EndpointConfig;
use crate::error::EndpointError;

/// A [`StatusPoller`] that issues a GET to a job's status URL.
///
/// Each check is a single idempotent request; retrying is left to the
/// watcher's next tick.
#[derive(Debug, Clone)]
pub struct StatusEndpoint {
    client: Client,
    url: Url,
    config: Arc<EndpointConfig>,
}

impl StatusEndpoint {
    /// Create an endpoint with its own HTTP client.
    pub fn new(url: impl AsRef<str>, config: EndpointConfig) -> Result<Self, EndpointError> {
        let client = Client::builder().build()?;
        Self::with_client(client, url, config)
    }

    /// Create an endpoint sharing an existing HTTP client.
    pub fn with_client(
        client: Client,
        url: impl AsRef<str>,
        config: EndpointConfig,
    ) -> Result<Self, EndpointError> {
        let raw = url.as_ref();
        let url = Url::parse(raw).map_err(|e| EndpointError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            url,
            config: Arc::new(config),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Perform one status check.
    pub async fn check(&self) -> PollResult {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.config.request_timeout);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PollError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PollError::Transport(e.to_string()))?;

        tracing::debug!("GET {} -> {}", self.url, status);
        classify(status, &body, self.config.not_found)
    }
}

impl StatusPoller for StatusEndpoint {
    fn poll(&self) -> PollFuture {
        let endpoint = self.clone();
        Box::pin(async move { endpoint.check().await })
    }
}
