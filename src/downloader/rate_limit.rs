//! Client-side request pacing and quota
//!
//! Each executor owns one [`RequestPacer`]. It spaces consecutive requests by a
//! minimum interval and refuses to issue more than a fixed number of requests.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::config::ClientConfig;
use crate::{ComtradeError, Result};

/// Per-instance pacing and request quota
#[derive(Debug, Clone)]
pub struct RequestPacer {
    min_interval: Duration,
    max_requests: u32,
    issued: u32,
    last_request: Option<Instant>,
}

impl RequestPacer {
    /// Create a pacer
    ///
    /// # Arguments
    /// * `min_interval` - Minimum time between the end of one request and the next
    /// * `max_requests` - Requests this pacer allows in total
    pub fn new(min_interval: Duration, max_requests: u32) -> Self {
        Self {
            min_interval,
            max_requests,
            issued: 0,
            last_request: None,
        }
    }

    /// Create a pacer from client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.min_request_interval(), config.max_requests)
    }

    /// Reserve the next request slot
    ///
    /// Fails with [`ComtradeError::Quota`] once the quota is used up, without
    /// waiting. Otherwise waits until the minimum interval since the previous
    /// request has elapsed and counts the request as issued.
    pub async fn acquire(&mut self) -> Result<()> {
        if self.issued >= self.max_requests {
            return Err(ComtradeError::Quota {
                issued: self.issued,
                limit: self.max_requests,
            });
        }

        let wait = self.delay_needed();
        if !wait.is_zero() {
            debug!("Pacing: waiting {:?} before next request", wait);
            sleep(wait).await;
        }

        self.issued += 1;
        Ok(())
    }

    /// Mark the current request as finished; pacing counts from here
    pub fn record_completion(&mut self) {
        self.last_request = Some(Instant::now());
    }

    /// Time still to wait before the next request may start
    pub fn delay_needed(&self) -> Duration {
        match self.last_request {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Requests issued so far
    pub fn issued(&self) -> u32 {
        self.issued
    }

    /// Requests left before the quota is reached
    pub fn remaining(&self) -> u32 {
        self.max_requests.saturating_sub(self.issued)
    }

    /// Configured quota
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
