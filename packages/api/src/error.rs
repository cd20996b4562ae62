/// Errors building a status endpoint.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid status url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
