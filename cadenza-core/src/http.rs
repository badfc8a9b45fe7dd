//! Shared HTTP client construction for the service providers.

use crate::config::NetworkConfig;
use crate::error::CoreError;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;

/// User agent sent to every service
pub const USER_AGENT: &str = concat!("Cadenza/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a client with the configured timeout. Transient failures are retried
/// with exponential backoff only when `max_retries` is non-zero.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn build_client(network: &NetworkConfig) -> Result<ClientWithMiddleware, CoreError> {
    let base_client = reqwest::Client::builder()
        .timeout(network.timeout())
        .connect_timeout(CONNECT_TIMEOUT.min(network.timeout()))
        .user_agent(USER_AGENT)
        .build()?;

    let builder = ClientBuilder::new(base_client);
    let client = if network.max_retries > 0 {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(network.max_retries);
        builder
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    } else {
        builder.build()
    };

    Ok(client)
}
