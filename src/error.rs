//! Error taxonomy shared by the query builder, executor and batch planner

use crate::output::OutputError;
use crate::registry::RegistryError;

/// Errors raised by Comtrade queries and downloads
#[derive(Debug, thiserror::Error)]
pub enum ComtradeError {
    /// Unknown or out-of-range parameter value, or a per-request size limit violation
    #[error("validation error: {0}")]
    Validation(String),

    /// The per-instance request quota has been used up
    #[error("too many requests have been made ({issued} of {limit}); take a break")]
    Quota {
        /// Requests already issued by this instance
        issued: u32,
        /// Configured quota
        limit: u32,
    },

    /// A batch plan needs more sub-requests than allowed
    #[error("{planned} requests generated, limit is {limit}; shorten your inputs")]
    LimitExceeded {
        /// Number of planned sub-requests
        planned: usize,
        /// Maximum number of sub-requests per batch
        limit: usize,
    },

    /// The service reported that no data matches the query
    #[error("no data matches your query or your query is too complex")]
    NotFound,

    /// Usage limit exceeded (HTTP 429, or inferred from an unparseable body)
    #[error("data usage limit exceeded, try again in an hour: {0}")]
    RateLimit(String),

    /// Reference data or request file missing or malformed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport failure or non-success HTTP status
    #[error("network error: {0}")]
    Network(String),

    /// Tables from different sub-requests do not share the same columns
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// Persisting a result failed
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl From<RegistryError> for ComtradeError {
    fn from(err: RegistryError) -> Self {
        ComtradeError::Configuration(err.to_string())
    }
}

/// Result type for Comtrade operations
pub type Result<T> = std::result::Result<T, ComtradeError>;
