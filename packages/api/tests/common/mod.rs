#![allow(dead_code)]

use std::time::Duration;

use api::{EndpointConfig, EndpointError, StatusEndpoint};

/// Endpoint for `path` on a mock server.
pub fn endpoint(server: &mockito::Server, path: &str) -> Result<StatusEndpoint, EndpointError> {
    StatusEndpoint::new(format!("{}{}", server.url(), path), EndpointConfig::default())
}

/// Wait up to two seconds for `check` to hold.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
