//! Shared HTTP client
//!
//! One `reqwest::Client` is shared by every executor so connections are pooled
//! across requests. Its timeouts are the only cancellation mechanism a
//! request has.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

use crate::{ComtradeError, Result};

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for the entire request
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Global HTTP client, built on first use
static GLOBAL_HTTP_CLIENT: Lazy<std::result::Result<Client, String>> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}. Check system TLS configuration."))
});

/// Get the global HTTP client
///
/// `reqwest::Client` is reference counted internally, so the clone is cheap and
/// shares the connection pool.
pub fn global_http_client() -> Result<Client> {
    GLOBAL_HTTP_CLIENT
        .as_ref()
        .cloned()
        .map_err(|e| ComtradeError::Configuration(e.clone()))
}
