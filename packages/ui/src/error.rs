use api::EndpointError;
use watch_core::WatchError;

/// Errors starting a watch from an adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}
