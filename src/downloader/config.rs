//! API limits and client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoint of the Comtrade data API
pub const DEFAULT_BASE_URL: &str = "http://comtrade.un.org/api/get";

/// Maximum number of HS codes in one request.
pub const MAX_COMMODITY_CODES: usize = 20;

/// Maximum number of time periods in one request.
pub const MAX_TIME_PERIODS: usize = 5;

/// Requests one client instance may issue before it refuses further requests.
/// Matches the API's hourly allowance for anonymous users.
pub const MAX_REQUESTS_PER_CLIENT: u32 = 100;

/// Maximum number of sub-requests a batch may plan.
pub const MAX_BATCH_REQUESTS: usize = 100;

/// Minimum spacing between two requests of one client (1 request per second).
pub const MIN_REQUEST_INTERVAL_MS: u64 = 1000;

/// Pause between batch sub-requests, slightly above the API's one-second limit.
pub const BATCH_PACING_INTERVAL_MS: u64 = 1050;

/// Body text the API returns instead of data for empty or overly complex queries
pub const NO_DATA_SENTINEL: &str = "No data matches your query";

/// Runtime settings of a request executor
///
/// Defaults mirror the constants above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Minimum spacing between requests, in milliseconds
    pub min_request_interval_ms: u64,
    /// Per-instance request quota
    pub max_requests: u32,
    /// Pause between batch sub-requests, in milliseconds
    pub batch_pacing_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_request_interval_ms: MIN_REQUEST_INTERVAL_MS,
            max_requests: MAX_REQUESTS_PER_CLIENT,
            batch_pacing_ms: BATCH_PACING_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// Minimum spacing between requests
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// Pause between batch sub-requests
    pub fn batch_pacing(&self) -> Duration {
        Duration::from_millis(self.batch_pacing_ms)
    }
}
