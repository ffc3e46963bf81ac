//! Single Comtrade request

use std::fmt;
use std::path::{Path, PathBuf};

use super::executor::RequestExecutor;
use crate::output::save_table;
use crate::query::{ComtradeQuery, QueryParams};
use crate::table::Table;
use crate::Result;

/// One query together with the executor that pulls it
///
/// The executor's quota and pacing apply across every [`pull_data`] call on
/// the same request, including after the query has been changed.
///
/// [`pull_data`]: ComtradeRequest::pull_data
pub struct ComtradeRequest {
    query: ComtradeQuery,
    executor: RequestExecutor,
}

impl ComtradeRequest {
    /// Request using the shared HTTP client and default limits
    pub fn new(query: ComtradeQuery) -> Result<Self> {
        Ok(Self::with_executor(query, RequestExecutor::new()?))
    }

    /// Request using a specific executor
    pub fn with_executor(query: ComtradeQuery, executor: RequestExecutor) -> Self {
        Self { query, executor }
    }

    /// Request built from named parameters
    pub fn from_params(params: &QueryParams) -> Result<Self> {
        Self::new(ComtradeQuery::from_params(params)?)
    }

    /// Request built from a JSON request file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ComtradeQuery::from_file(path)?)
    }

    /// Request rebuilt from a full request URL
    pub fn from_url(url: &str) -> Result<Self> {
        Self::new(ComtradeQuery::from_url(url)?)
    }

    /// Current query
    pub fn query(&self) -> &ComtradeQuery {
        &self.query
    }

    /// Current query, for changing parameters between pulls
    pub fn query_mut(&mut self) -> &mut ComtradeQuery {
        &mut self.query
    }

    /// Request URL
    pub fn url(&self) -> &str {
        self.query.url()
    }

    /// Requests issued by this instance so far
    pub fn requests_made(&self) -> u32 {
        self.executor.requests_made()
    }

    /// Executor shared by every pull of this request
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Pull the data into memory
    pub async fn pull_data(&mut self) -> Result<Table> {
        self.executor.fetch(&self.query).await
    }

    /// Pull the data and save it in the query's format instead of returning it
    ///
    /// An existing file is never overwritten; the path actually written is returned.
    pub async fn pull_data_to<P: AsRef<Path>>(&mut self, path: P) -> Result<PathBuf> {
        let table = self.pull_data().await?;
        Ok(save_table(&table, path, self.query.fmt())?)
    }
}

impl fmt::Display for ComtradeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)
    }
}
