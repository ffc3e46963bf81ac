//! Single request executor
//!
//! Issues one GET per query, enforcing the pacing and quota of its
//! [`RequestPacer`], and turns the response body into a [`Table`].

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::config::{ClientConfig, NO_DATA_SENTINEL};
use super::http::global_http_client;
use super::rate_limit::RequestPacer;
use crate::query::ComtradeQuery;
use crate::table::Table;
use crate::{ComtradeError, OutputFormat, Result};

/// Executes queries one at a time against the API
pub struct RequestExecutor {
    client: Client,
    pacer: RequestPacer,
    config: ClientConfig,
}

impl RequestExecutor {
    /// Executor with the shared HTTP client and default limits
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Executor with the shared HTTP client and custom limits
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_client(global_http_client()?, config))
    }

    /// Executor with an explicit HTTP client
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self {
            client,
            pacer: RequestPacer::from_config(&config),
            config,
        }
    }

    /// Pacing and quota state
    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    /// Configured limits
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Requests issued by this executor so far
    pub fn requests_made(&self) -> u32 {
        self.pacer.issued()
    }

    /// Fetch and parse the data for one query, dropping empty columns
    ///
    /// # Errors
    /// - `Quota` if this executor already issued its maximum number of requests
    ///   (nothing is sent)
    /// - `NotFound` if the service answers with its "no data" message
    /// - `RateLimit` on HTTP 429 or when the body cannot be parsed in the
    ///   requested format, whatever the status
    /// - `Network` on transport failures, and on non-success statuses whose
    ///   body still parses
    pub async fn fetch(&mut self, query: &ComtradeQuery) -> Result<Table> {
        let mut table = self.fetch_unpruned(query).await?;
        table.drop_empty_columns();
        debug!("Parsed table with shape {:?}", table.shape());
        Ok(table)
    }

    /// Fetch and parse the data for one query, keeping every response column
    ///
    /// Batches use this so that columns are pruned once over the combined rows.
    pub async fn fetch_unpruned(&mut self, query: &ComtradeQuery) -> Result<Table> {
        self.pacer.acquire().await?;

        let url = query.url();
        info!(
            url = %url,
            request = self.pacer.issued(),
            limit = self.pacer.max_requests(),
            "Requesting Comtrade data"
        );

        let response = self.get_text(url).await;
        self.pacer.record_completion();
        let (status, body) = response?;

        debug!("Response status {} with {} bytes", status, body.len());

        if body.contains(NO_DATA_SENTINEL) {
            warn!("No data matches query: {}", url);
            return Err(ComtradeError::NotFound);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limit response (429) for {}", url);
            return Err(ComtradeError::RateLimit(format!("HTTP {status}")));
        }

        let table = parse_table(&body, query.fmt()).map_err(|e| match e {
            ComtradeError::RateLimit(msg) if !status.is_success() => {
                ComtradeError::RateLimit(format!("HTTP {status}: {msg}"))
            }
            other => other,
        })?;
        if !status.is_success() {
            return Err(ComtradeError::Network(format!("HTTP {status} for {url}")));
        }
        Ok(table)
    }

    async fn get_text(&self, url: &str) -> Result<(StatusCode, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ComtradeError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ComtradeError::Network(format!("Failed to read response body: {e}")))?;
        Ok((status, body))
    }
}

/// Turn a response body into a table with empty columns removed
///
/// A body that does not parse is reported as [`ComtradeError::RateLimit`]:
/// throttled requests are answered with a usage notice instead of data. The
/// parser message is kept, since server errors and malformed requests look the
/// same from here.
pub fn parse_body(body: &str, format: OutputFormat) -> Result<Table> {
    let mut table = parse_table(body, format)?;
    table.drop_empty_columns();
    debug!("Parsed table with shape {:?}", table.shape());
    Ok(table)
}

/// Like [`parse_body`], but keeps columns that are empty in every row
pub fn parse_table(body: &str, format: OutputFormat) -> Result<Table> {
    if body.contains(NO_DATA_SENTINEL) {
        return Err(ComtradeError::NotFound);
    }

    Table::parse(body, format).map_err(|e| {
        warn!("Unparseable {} response, assuming usage limit: {}", format, e);
        ComtradeError::RateLimit(e.to_string())
    })
}
