//! Batch request planner
//!
//! Splits commodity-code and time-period lists that exceed the per-request
//! limits into chunks, plans one sub-request per (codes, periods) pair and
//! pulls them one after another through a single executor.

use std::fmt;
use std::path::{Path, PathBuf};
use tokio::time::sleep;
use tracing::{info, Instrument};

use super::config::{MAX_BATCH_REQUESTS, MAX_COMMODITY_CODES, MAX_TIME_PERIODS};
use super::executor::RequestExecutor;
use crate::output::save_table;
use crate::query::{ComtradeQuery, QueryParams};
use crate::table::Table;
use crate::{ComtradeError, Result};

/// Split `values` into consecutive chunks of at most `max_len`
///
/// An empty list yields a single empty chunk, meaning "keep the template value".
pub fn partition<T: Clone>(values: &[T], max_len: usize) -> Vec<Vec<T>> {
    if values.is_empty() {
        return vec![Vec::new()];
    }
    values.chunks(max_len.max(1)).map(<[T]>::to_vec).collect()
}

/// Plan the sub-requests for the given codes and periods
///
/// Every sub-request starts as a copy of `template`. Fails with
/// [`ComtradeError::LimitExceeded`] before building anything if the cross
/// product exceeds [`MAX_BATCH_REQUESTS`].
pub fn plan(
    template: &ComtradeQuery,
    commodity_codes: &[String],
    time_periods: &[u32],
) -> Result<Vec<ComtradeQuery>> {
    let code_chunks = partition(commodity_codes, MAX_COMMODITY_CODES);
    let period_chunks = partition(time_periods, MAX_TIME_PERIODS);

    let planned = code_chunks.len() * period_chunks.len();
    if planned > MAX_BATCH_REQUESTS {
        return Err(ComtradeError::LimitExceeded {
            planned,
            limit: MAX_BATCH_REQUESTS,
        });
    }

    let mut queries = Vec::with_capacity(planned);
    for codes in &code_chunks {
        for periods in &period_chunks {
            let mut query = template.clone();
            if !codes.is_empty() {
                query.set_commodity_codes(codes)?;
            }
            if !periods.is_empty() {
                query.set_time_periods(periods.iter().copied())?;
            }
            queries.push(query);
        }
    }
    Ok(queries)
}

/// A batch of sub-requests sharing one executor
pub struct MultiRequest {
    queries: Vec<ComtradeQuery>,
    executor: RequestExecutor,
}

impl MultiRequest {
    /// Plan a batch from named parameters
    ///
    /// `hs` and `time_period` may hold any number of values; every other
    /// parameter is shared by all sub-requests.
    pub fn from_params(params: &QueryParams) -> Result<Self> {
        let shared = QueryParams {
            hs: None,
            time_period: None,
            ..params.clone()
        };
        let template = ComtradeQuery::from_params(&shared)?;

        let codes = params.hs.as_ref().map(|v| v.items()).unwrap_or_default();
        let periods = params
            .time_period
            .as_ref()
            .map(|v| v.items())
            .unwrap_or_default()
            .iter()
            .map(|p| {
                p.parse::<u32>()
                    .map_err(|_| ComtradeError::Validation(format!("Invalid time period: '{p}'")))
            })
            .collect::<Result<Vec<u32>>>()?;

        Self::from_template(template, &codes, &periods)
    }

    /// Plan a batch from a JSON request file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_params(&QueryParams::from_file(path)?)
    }

    /// Plan a batch from a template query and the lists to split
    pub fn from_template(
        template: ComtradeQuery,
        commodity_codes: &[String],
        time_periods: &[u32],
    ) -> Result<Self> {
        let queries = plan(&template, commodity_codes, time_periods)?;
        Ok(Self {
            queries,
            executor: RequestExecutor::new()?,
        })
    }

    /// Use a specific executor for the pulls
    pub fn with_executor(mut self, executor: RequestExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Planned sub-requests, in execution order
    pub fn queries(&self) -> &[ComtradeQuery] {
        &self.queries
    }

    /// Number of planned sub-requests
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// True if nothing is planned
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Requests issued by the shared executor so far
    pub fn requests_made(&self) -> u32 {
        self.executor.requests_made()
    }

    /// Pull every sub-request in order and concatenate the rows
    ///
    /// Sub-requests are sent one at a time with the configured pause between
    /// them. The first failure aborts the batch. Sub-request tables must share
    /// the response columns; columns empty across the combined rows are dropped.
    pub async fn pull_data(&mut self) -> Result<Table> {
        let total = self.queries.len();
        let pacing = self.executor.config().batch_pacing();
        let span = tracing::info_span!("batch_pull", requests = total);

        let queries = &self.queries;
        let executor = &mut self.executor;
        async move {
            let mut combined = Table::default();
            for (idx, query) in queries.iter().enumerate() {
                if idx > 0 {
                    sleep(pacing).await;
                }
                info!("Pulling request {}/{}: {}", idx + 1, total, query.url());

                let table = executor.fetch_unpruned(query).await?;
                combined
                    .append(table)
                    .map_err(|e| ComtradeError::Schema(e.to_string()))?;
            }
            combined.drop_empty_columns();
            info!("Batch complete: {} rows", combined.num_rows());
            Ok(combined)
        }
        .instrument(span)
        .await
    }

    /// Pull the whole batch and save it in the queries' format
    ///
    /// An existing file is never overwritten; the path actually written is returned.
    pub async fn pull_data_to<P: AsRef<Path>>(&mut self, path: P) -> Result<PathBuf> {
        let table = self.pull_data().await?;
        let format = self
            .queries
            .first()
            .map(ComtradeQuery::fmt)
            .unwrap_or_default();
        Ok(save_table(&table, path, format)?)
    }
}

impl fmt::Display for MultiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Currently storing {} Comtrade Requests with URLs:",
            self.queries.len()
        )?;
        for query in &self.queries {
            write!(f, "\n{}", query.url())?;
        }
        Ok(())
    }
}
