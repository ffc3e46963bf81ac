//! Typed query parameter values and request files

use crate::registry::AreaCode;
use crate::{ComtradeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Query string keys understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `p` - partner area
    PartnerArea,
    /// `r` - reporting area
    ReportingArea,
    /// `ps` - time period(s)
    TimePeriod,
    /// `px` - classification scheme (always `HS`)
    Classification,
    /// `cc` - classification code(s)
    CommodityCode,
    /// `freq` - frequency
    Frequency,
    /// `type` - trade type
    TradeType,
    /// `rg` - trade flow
    TradeFlow,
    /// `fmt` - output format
    Format,
}

impl QueryKey {
    /// Key as written in the query string
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKey::PartnerArea => "p",
            QueryKey::ReportingArea => "r",
            QueryKey::TimePeriod => "ps",
            QueryKey::Classification => "px",
            QueryKey::CommodityCode => "cc",
            QueryKey::Frequency => "freq",
            QueryKey::TradeType => "type",
            QueryKey::TradeFlow => "rg",
            QueryKey::Format => "fmt",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "p" => Ok(QueryKey::PartnerArea),
            "r" => Ok(QueryKey::ReportingArea),
            "ps" => Ok(QueryKey::TimePeriod),
            "px" => Ok(QueryKey::Classification),
            "cc" => Ok(QueryKey::CommodityCode),
            "freq" => Ok(QueryKey::Frequency),
            "type" => Ok(QueryKey::TradeType),
            "rg" => Ok(QueryKey::TradeFlow),
            "fmt" => Ok(QueryKey::Format),
            _ => Err(format!("Unknown query key: {s}")),
        }
    }
}

/// Area argument before it is resolved against the reference tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaArg {
    /// The `all` literal
    All,
    /// A numeric area code
    Code(u32),
    /// An area name, matched case-insensitively
    Name(String),
}

impl From<u32> for AreaArg {
    fn from(code: u32) -> Self {
        AreaArg::Code(code)
    }
}

impl From<&str> for AreaArg {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            AreaArg::All
        } else if let Ok(code) = s.parse::<u32>() {
            AreaArg::Code(code)
        } else {
            AreaArg::Name(s.to_string())
        }
    }
}

impl From<String> for AreaArg {
    fn from(s: String) -> Self {
        AreaArg::from(s.as_str())
    }
}

impl From<AreaCode> for AreaArg {
    fn from(code: AreaCode) -> Self {
        match code {
            AreaCode::All => AreaArg::All,
            AreaCode::Code(code) => AreaArg::Code(code),
        }
    }
}

/// Resolved value of an area parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AreaSelection {
    /// Every area
    All,
    /// One or more numeric area codes
    Codes(Vec<u32>),
}

impl AreaSelection {
    /// Selection holding a single area code
    pub fn single(code: u32) -> Self {
        AreaSelection::Codes(vec![code])
    }
}

impl fmt::Display for AreaSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaSelection::All => write!(f, "all"),
            AreaSelection::Codes(codes) => write!(f, "{}", join(codes)),
        }
    }
}

/// Comma-join values the way the API expects list parameters
pub(crate) fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Scalar parameter value in a request file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Numeric value (area code, period, commodity code)
    Int(u64),
    /// Text value (area name, `all`, comma list, letter code)
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Parameter value given either as one scalar or as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A single value
    One(Scalar),
    /// A literal list of values
    Many(Vec<Scalar>),
}

impl ParamValue {
    /// Flatten into individual items, splitting comma-joined text
    pub fn items(&self) -> Vec<String> {
        let scalars: Vec<&Scalar> = match self {
            ParamValue::One(s) => vec![s],
            ParamValue::Many(list) => list.iter().collect(),
        };
        scalars
            .into_iter()
            .flat_map(|s| match s {
                Scalar::Int(n) => vec![n.to_string()],
                Scalar::Text(t) => t.split(',').map(|p| p.trim().to_string()).collect(),
            })
            .collect()
    }
}

impl From<u64> for ParamValue {
    fn from(n: u64) -> Self {
        ParamValue::One(Scalar::Int(n))
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::One(Scalar::Text(s.to_string()))
    }
}

impl From<Vec<u64>> for ParamValue {
    fn from(list: Vec<u64>) -> Self {
        ParamValue::Many(list.into_iter().map(Scalar::Int).collect())
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(list: Vec<&str>) -> Self {
        ParamValue::Many(list.into_iter().map(|s| Scalar::Text(s.to_string())).collect())
    }
}

/// Named query parameters, as accepted by constructors and request files
///
/// Keys mirror the request file format:
///
/// ```json
/// {"partner_area": 36, "reporting_area": "all", "time_period": [2015, 2016],
///  "hs": "4401", "freq": "A", "trade_type": "C"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryParams {
    /// Partner area code(s), name(s) or `all`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_area: Option<ParamValue>,
    /// Reporting area code(s), name(s) or `all`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_area: Option<ParamValue>,
    /// Time period(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<ParamValue>,
    /// HS classification code(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hs: Option<ParamValue>,
    /// Frequency (`A` or `M`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<String>,
    /// Trade type (`C` or `S`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<String>,
    /// Trade flow name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_flow: Option<String>,
    /// Output format (`csv` or `json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fmt: Option<String>,
}

impl QueryParams {
    /// Read parameters from a JSON file of key/value pairs
    ///
    /// # Errors
    /// `Configuration` if the file cannot be read or is not JSON,
    /// `Validation` if it holds unknown keys or values of the wrong shape.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ComtradeError::Configuration(format!(
                "Failed to read request file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }

    /// Parse parameters from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => {
                ComtradeError::Validation(format!("Invalid request parameters: {e}"))
            }
            _ => ComtradeError::Configuration(format!("Malformed request file: {e}")),
        })
    }
}
