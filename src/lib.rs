//! # Comtrade Downloader Library
//!
//! A client for the UN Comtrade trade statistics API. It builds validated query
//! URLs, issues rate-limited requests and parses the returned payload into an
//! in-memory [`table::Table`].
//!
//! ## Features
//!
//! - **Validated Queries**: every parameter is checked against the bundled
//!   reporter/partner area code lists or a fixed enumeration
//! - **Request Pacing**: at most one request per second and 100 requests per client
//! - **Batching**: oversized commodity/period lists are split into valid sub-requests
//! - **CSV and JSON**: both response formats are parsed into the same table type
//! - **Safe Saving**: results are never written over an existing file
//!
//! ## Quick Start
//!
//! ```no_run
//! use comtrade_downloader::downloader::ComtradeRequest;
//! use comtrade_downloader::query::ComtradeQuery;
//! use comtrade_downloader::{Frequency, TradeType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut query = ComtradeQuery::new()?;
//! query.set_partner_area("Australia")?;
//! query.set_reporting_area("all")?;
//! query.set_time_period(2016)?;
//! query.set_commodity_codes(["4401"])?;
//! query.set_freq(Frequency::Annual);
//! query.set_trade_type(TradeType::Commodities);
//!
//! let mut request = ComtradeRequest::new(query)?;
//! let table = request.pull_data().await?;
//! println!("{:?}", table.shape());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`registry`] - Reference area codes (reporting and partner areas)
//! - [`query`] - Query parameter builder and URL serialization
//! - [`downloader`] - Single request executor, pacing and batch planner
//! - [`table`] - Response table parsing and column pruning
//! - [`output`] - Persisting tables to versioned files

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Download orchestration: executor, pacing and batching
pub mod downloader;

/// Error taxonomy
pub mod error;

/// Table writers and output paths
pub mod output;

/// Query parameter builder
pub mod query;

/// Reference area code tables
pub mod registry;

/// Response tables
pub mod table;

pub use error::{ComtradeError, Result};

/// Reporting interval of the requested data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// Annual data
    #[serde(rename = "A")]
    Annual,
    /// Monthly data
    #[serde(rename = "M")]
    Monthly,
}

impl Frequency {
    /// Query string code
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Annual => "A",
            Frequency::Monthly => "M",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" | "ANNUAL" => Ok(Frequency::Annual),
            "M" | "MONTHLY" => Ok(Frequency::Monthly),
            _ => Err(format!(
                "Invalid frequency: {s}. Allowable frequency values are 'A' and 'M'"
            )),
        }
    }
}

/// Kind of traded goods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    /// Commodities
    #[serde(rename = "C")]
    Commodities,
    /// Services
    #[serde(rename = "S")]
    Services,
}

impl TradeType {
    /// Query string code
    pub fn code(&self) -> &'static str {
        match self {
            TradeType::Commodities => "C",
            TradeType::Services => "S",
        }
    }
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "C" | "COMMODITIES" => Ok(TradeType::Commodities),
            "S" | "SERVICES" => Ok(TradeType::Services),
            _ => Err(format!(
                "Invalid trade type: {s}. Allowable values for trade type are 'C' and 'S'"
            )),
        }
    }
}

/// Direction of the trade flow (`rg` parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeFlow {
    /// Imports (code 1)
    Import,
    /// Exports (code 2)
    Export,
    /// Re-imports (code 4)
    ReImport,
    /// Re-exports (code 3)
    ReExport,
    /// Every trade flow
    All,
}

impl TradeFlow {
    /// Query string code
    pub fn code(&self) -> &'static str {
        match self {
            TradeFlow::Import => "1",
            TradeFlow::Export => "2",
            TradeFlow::ReExport => "3",
            TradeFlow::ReImport => "4",
            TradeFlow::All => "all",
        }
    }

    /// Canonical display name
    pub fn name(&self) -> &'static str {
        match self {
            TradeFlow::Import => "Import",
            TradeFlow::Export => "Export",
            TradeFlow::ReImport => "Re-import",
            TradeFlow::ReExport => "Re-export",
            TradeFlow::All => "all",
        }
    }

    /// Parse a query string code back into a trade flow
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(TradeFlow::Import),
            "2" => Some(TradeFlow::Export),
            "3" => Some(TradeFlow::ReExport),
            "4" => Some(TradeFlow::ReImport),
            "all" | "ALL" => Some(TradeFlow::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TradeFlow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "import" => Ok(TradeFlow::Import),
            "export" => Ok(TradeFlow::Export),
            "re-import" => Ok(TradeFlow::ReImport),
            "re-export" => Ok(TradeFlow::ReExport),
            "all" => Ok(TradeFlow::All),
            _ => Err(format!(
                "Invalid trade flow: {s}. Valid options: Import, Export, Re-import, Re-export, all"
            )),
        }
    }
}

/// Response payload format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma separated values
    #[default]
    Csv,
    /// JSON records
    Json,
}

impl OutputFormat {
    /// Query string value, also used as the file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid format: {s}. Allowable values for format are 'csv' and 'json'"
            )),
        }
    }
}
