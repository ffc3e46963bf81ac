//! Request execution, pacing and batching
//!
//! # Overview
//!
//! 1. **Single requests**: [`ComtradeRequest`] pairs a query with a [`RequestExecutor`]
//! 2. **Pacing**: every executor owns a [`RequestPacer`] that keeps at least one
//!    second between requests and stops after 100 of them
//! 3. **Batching**: [`MultiRequest`] splits oversized code and period lists into
//!    valid sub-requests and concatenates their rows
//!
//! # Quick Start
//!
//! ```no_run
//! use comtrade_downloader::downloader::MultiRequest;
//! use comtrade_downloader::query::QueryParams;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let params = QueryParams::from_json(
//!     r#"{"partner_area": 36, "reporting_area": "all",
//!         "time_period": [2010, 2011, 2012, 2013, 2014, 2015, 2016],
//!         "hs": "44", "freq": "A", "trade_type": "C"}"#,
//! )?;
//! let mut batch = MultiRequest::from_params(&params)?;
//! assert_eq!(batch.len(), 2);
//!
//! let saved = batch.pull_data_to("./wood_imports.csv").await?;
//! println!("saved to {}", saved.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`request`] - One query and its executor
//! - [`batch`] - Batch planning and sequential execution
//! - [`executor`] - HTTP fetch and response classification
//! - [`rate_limit`] - Pacing and per-client quota
//! - [`config`] - Limits and tunables
//! - [`http`] - Shared HTTP client
//!
//! # Error Handling
//!
//! Nothing here is retried. Errors surface as [`crate::ComtradeError`]:
//! - `Quota` once an executor has issued its maximum number of requests
//! - `LimitExceeded` when a batch would need more than 100 sub-requests
//! - `NotFound` when the service reports that no data matches
//! - `RateLimit` on HTTP 429 or an unparseable body, whatever the status
//! - `Network` for transport failures and error statuses with a table body

pub mod batch;
pub mod config;
pub mod executor;
pub mod http;
pub mod rate_limit;
pub mod request;

pub use batch::MultiRequest;
pub use config::ClientConfig;
pub use executor::RequestExecutor;
pub use rate_limit::RequestPacer;
pub use request::ComtradeRequest;
