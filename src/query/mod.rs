//! Query parameter builder
//!
//! [`ComtradeQuery`] holds the typed parameters of one request and their
//! serialized `key=value` fragments. Fragments keep the position at which a
//! parameter was first set; setting a parameter again replaces its fragment
//! in place, so the URL never carries a key twice.

use crate::downloader::config::{DEFAULT_BASE_URL, MAX_COMMODITY_CODES, MAX_TIME_PERIODS};
use crate::registry::{AreaCode, AreaKind, ReferenceCodes};
use crate::{ComtradeError, Frequency, OutputFormat, Result, TradeFlow, TradeType};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub mod params;

pub use params::{AreaArg, AreaSelection, ParamValue, QueryKey, QueryParams, Scalar};

/// The only classification scheme supported
const CLASSIFICATION_HS: &str = "HS";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment {
    Known(QueryKey, String),
    /// Unrecognized `key=value` pair kept verbatim
    Other(String),
}

impl Fragment {
    fn render(&self) -> String {
        match self {
            Fragment::Known(key, value) => format!("{key}={value}"),
            Fragment::Other(raw) => raw.clone(),
        }
    }
}

/// Validated request parameters and their serialized query string
#[derive(Debug, Clone)]
pub struct ComtradeQuery {
    base_url: String,
    codes: Arc<ReferenceCodes>,
    fragments: Vec<Fragment>,
    url: String,
    partner_area: Option<AreaSelection>,
    reporting_area: Option<AreaSelection>,
    time_period: Option<Vec<u32>>,
    commodity_codes: Option<Vec<String>>,
    freq: Option<Frequency>,
    trade_type: Option<TradeType>,
    trade_flow: Option<TradeFlow>,
    fmt: OutputFormat,
}

impl ComtradeQuery {
    /// Empty query against the default endpoint, using the shared reference tables
    pub fn new() -> Result<Self> {
        Ok(Self::with_codes(ReferenceCodes::shared()?))
    }

    /// Empty query validated against the given reference tables
    pub fn with_codes(codes: Arc<ReferenceCodes>) -> Self {
        let mut query = Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            codes,
            fragments: Vec::new(),
            url: String::new(),
            partner_area: None,
            reporting_area: None,
            time_period: None,
            commodity_codes: None,
            freq: None,
            trade_type: None,
            trade_flow: None,
            fmt: OutputFormat::default(),
        };
        query.rebuild_url();
        query
    }

    /// Point the query at another endpoint (text before `?`)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches(['?', '&']).to_string();
        self.rebuild_url();
        self
    }

    /// Build a query from named parameters
    ///
    /// Parameters are applied in the order partner area, reporting area, time
    /// period, classification code, frequency, trade type, trade flow, format.
    pub fn from_params(params: &QueryParams) -> Result<Self> {
        Self::from_params_with_codes(params, ReferenceCodes::shared()?)
    }

    /// Build a query from named parameters, validated against the given tables
    pub fn from_params_with_codes(params: &QueryParams, codes: Arc<ReferenceCodes>) -> Result<Self> {
        let mut query = Self::with_codes(codes);
        query.apply(params)?;
        Ok(query)
    }

    /// Build a query from a JSON request file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_params(&QueryParams::from_file(path)?)
    }

    /// Rebuild a query from a full request URL or bare query string
    ///
    /// Recognized parameters are validated and populate the typed fields;
    /// other pairs are kept verbatim in their original position.
    pub fn from_url(url: &str) -> Result<Self> {
        Self::from_url_with_codes(url, ReferenceCodes::shared()?)
    }

    /// Rebuild a query from a URL, validated against the given tables
    pub fn from_url_with_codes(url: &str, codes: Arc<ReferenceCodes>) -> Result<Self> {
        let (base, query_string) = match url.split_once('?') {
            Some((base, qs)) => (Some(base), qs),
            None if url.contains('=') => (None, url),
            None => (Some(url), ""),
        };

        let mut query = Self::with_codes(codes);
        if let Some(base) = base.filter(|b| !b.is_empty()) {
            query.base_url = base.to_string();
        }

        for pair in query_string.split('&').filter(|p| !p.is_empty()) {
            let Some((key, value)) = url::form_urlencoded::parse(pair.as_bytes()).next() else {
                continue;
            };
            match QueryKey::from_str(&key) {
                Ok(key) => query.set_param(key, &value)?,
                Err(_) => {
                    query.fragments.push(Fragment::Other(pair.to_string()));
                    query.rebuild_url();
                }
            }
        }

        Ok(query)
    }

    /// Apply every parameter present in `params`
    pub fn apply(&mut self, params: &QueryParams) -> Result<()> {
        if let Some(value) = &params.partner_area {
            self.set_partner_areas(value.items())?;
        }
        if let Some(value) = &params.reporting_area {
            self.set_reporting_areas(value.items())?;
        }
        if let Some(value) = &params.time_period {
            self.set_time_periods(parse_periods(&value.items())?)?;
        }
        if let Some(value) = &params.hs {
            self.set_commodity_codes(value.items())?;
        }
        if let Some(value) = &params.freq {
            self.set_param(QueryKey::Frequency, value)?;
        }
        if let Some(value) = &params.trade_type {
            self.set_param(QueryKey::TradeType, value)?;
        }
        if let Some(value) = &params.trade_flow {
            self.set_trade_flow(TradeFlow::from_str(value).map_err(ComtradeError::Validation)?);
        }
        if let Some(value) = &params.fmt {
            self.set_param(QueryKey::Format, value)?;
        }
        Ok(())
    }

    /// Set a parameter from its query string representation
    ///
    /// `rg` takes the numeric flow code here; [`TradeFlow`] names are accepted too.
    pub fn set_param(&mut self, key: QueryKey, value: &str) -> Result<()> {
        match key {
            QueryKey::PartnerArea => self.set_partner_areas(split_list(value)),
            QueryKey::ReportingArea => self.set_reporting_areas(split_list(value)),
            QueryKey::TimePeriod => self.set_time_periods(parse_periods(&split_list(value))?),
            QueryKey::CommodityCode => self.set_commodity_code(value),
            QueryKey::Classification => {
                if !value.trim().eq_ignore_ascii_case(CLASSIFICATION_HS) {
                    return Err(ComtradeError::Validation(format!(
                        "Unsupported classification: {value}. Only 'HS' is supported"
                    )));
                }
                self.put(QueryKey::Classification, CLASSIFICATION_HS.to_string());
                Ok(())
            }
            QueryKey::Frequency => {
                self.set_freq(Frequency::from_str(value).map_err(ComtradeError::Validation)?);
                Ok(())
            }
            QueryKey::TradeType => {
                self.set_trade_type(TradeType::from_str(value).map_err(ComtradeError::Validation)?);
                Ok(())
            }
            QueryKey::TradeFlow => {
                let flow = TradeFlow::from_code(value)
                    .or_else(|| TradeFlow::from_str(value).ok())
                    .ok_or_else(|| {
                        ComtradeError::Validation(format!("Invalid trade flow: {value}"))
                    })?;
                self.set_trade_flow(flow);
                Ok(())
            }
            QueryKey::Format => {
                self.set_fmt(OutputFormat::from_str(value).map_err(ComtradeError::Validation)?);
                Ok(())
            }
        }
    }

    /// Set a single partner area (code, name or `all`)
    pub fn set_partner_area(&mut self, area: impl Into<AreaArg>) -> Result<()> {
        self.set_partner_areas([area])
    }

    /// Set one or more partner areas
    pub fn set_partner_areas<I, A>(&mut self, areas: I) -> Result<()>
    where
        I: IntoIterator<Item = A>,
        A: Into<AreaArg>,
    {
        let selection = self.resolve_areas(AreaKind::Partner, areas)?;
        self.put(QueryKey::PartnerArea, selection.to_string());
        self.partner_area = Some(selection);
        Ok(())
    }

    /// Set a single reporting area (code, name or `all`)
    pub fn set_reporting_area(&mut self, area: impl Into<AreaArg>) -> Result<()> {
        self.set_reporting_areas([area])
    }

    /// Set one or more reporting areas
    pub fn set_reporting_areas<I, A>(&mut self, areas: I) -> Result<()>
    where
        I: IntoIterator<Item = A>,
        A: Into<AreaArg>,
    {
        let selection = self.resolve_areas(AreaKind::Reporter, areas)?;
        self.put(QueryKey::ReportingArea, selection.to_string());
        self.reporting_area = Some(selection);
        Ok(())
    }

    /// Set a single time period (`YYYY` or `YYYYMM`)
    pub fn set_time_period(&mut self, period: u32) -> Result<()> {
        self.set_time_periods([period])
    }

    /// Set up to [`MAX_TIME_PERIODS`] time periods
    pub fn set_time_periods<I>(&mut self, periods: I) -> Result<()>
    where
        I: IntoIterator<Item = u32>,
    {
        let periods: Vec<u32> = periods.into_iter().collect();
        if periods.is_empty() {
            return Err(ComtradeError::Validation(
                "At least one time period is required".to_string(),
            ));
        }
        if periods.len() > MAX_TIME_PERIODS {
            return Err(ComtradeError::Validation(format!(
                "Too many time periods provided ({}); limit is {MAX_TIME_PERIODS}.",
                periods.len()
            )));
        }
        if let Some(bad) = periods.iter().find(|p| !is_valid_period(**p)) {
            return Err(ComtradeError::Validation(format!(
                "Invalid time period: {bad}. Expected YYYY or YYYYMM"
            )));
        }

        self.put(QueryKey::TimePeriod, params::join(&periods));
        self.time_period = Some(periods);
        Ok(())
    }

    /// Set classification code(s) from one value; comma-joined text is split
    pub fn set_commodity_code<T: ToString>(&mut self, code: T) -> Result<()> {
        let text = code.to_string();
        self.set_commodity_codes(text.split(',').map(str::to_string).collect::<Vec<_>>())
    }

    /// Set up to [`MAX_COMMODITY_CODES`] HS classification codes
    pub fn set_commodity_codes<I>(&mut self, codes: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let codes: Vec<String> = codes
            .into_iter()
            .map(|c| c.to_string().trim().to_string())
            .collect();

        if codes.is_empty() {
            return Err(ComtradeError::Validation(
                "At least one HS code is required".to_string(),
            ));
        }
        if codes.len() > MAX_COMMODITY_CODES {
            return Err(ComtradeError::Validation(format!(
                "Too many HS codes provided ({}); limit is {MAX_COMMODITY_CODES}.",
                codes.len()
            )));
        }
        if let Some(bad) = codes
            .iter()
            .find(|c| c.is_empty() || !c.chars().all(|ch| ch.is_ascii_alphanumeric()))
        {
            return Err(ComtradeError::Validation(format!("Invalid HS code: '{bad}'")));
        }

        if !self.has_fragment(QueryKey::Classification) {
            self.put(QueryKey::Classification, CLASSIFICATION_HS.to_string());
        }
        self.put(QueryKey::CommodityCode, params::join(&codes));
        self.commodity_codes = Some(codes);
        Ok(())
    }

    /// Set the frequency
    pub fn set_freq(&mut self, freq: Frequency) {
        self.put(QueryKey::Frequency, freq.code().to_string());
        self.freq = Some(freq);
    }

    /// Set the trade type
    pub fn set_trade_type(&mut self, trade_type: TradeType) {
        self.put(QueryKey::TradeType, trade_type.code().to_string());
        self.trade_type = Some(trade_type);
    }

    /// Set the trade flow
    pub fn set_trade_flow(&mut self, flow: TradeFlow) {
        self.put(QueryKey::TradeFlow, flow.code().to_string());
        self.trade_flow = Some(flow);
    }

    /// Set the response format
    pub fn set_fmt(&mut self, fmt: OutputFormat) {
        self.put(QueryKey::Format, fmt.as_str().to_string());
        self.fmt = fmt;
    }

    /// Full request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Endpoint without the query string
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reference tables used for validation
    pub fn codes(&self) -> &Arc<ReferenceCodes> {
        &self.codes
    }

    /// Partner area, if set
    pub fn partner_area(&self) -> Option<&AreaSelection> {
        self.partner_area.as_ref()
    }

    /// Reporting area, if set
    pub fn reporting_area(&self) -> Option<&AreaSelection> {
        self.reporting_area.as_ref()
    }

    /// Time periods, if set
    pub fn time_period(&self) -> Option<&[u32]> {
        self.time_period.as_deref()
    }

    /// Classification codes, if set
    pub fn commodity_codes(&self) -> Option<&[String]> {
        self.commodity_codes.as_deref()
    }

    /// Classification codes as the comma-joined `cc` value
    pub fn hs(&self) -> Option<String> {
        self.commodity_codes.as_deref().map(params::join)
    }

    /// Frequency, if set
    pub fn freq(&self) -> Option<Frequency> {
        self.freq
    }

    /// Trade type, if set
    pub fn trade_type(&self) -> Option<TradeType> {
        self.trade_type
    }

    /// Trade flow, if set
    pub fn trade_flow(&self) -> Option<TradeFlow> {
        self.trade_flow
    }

    /// Response format (defaults to csv)
    pub fn fmt(&self) -> OutputFormat {
        self.fmt
    }

    fn resolve_areas<I, A>(&self, kind: AreaKind, areas: I) -> Result<AreaSelection>
    where
        I: IntoIterator<Item = A>,
        A: Into<AreaArg>,
    {
        let table = self.codes.table(kind);
        let mut codes = Vec::new();
        let mut saw_all = false;

        for area in areas {
            let resolved = match area.into() {
                AreaArg::All => AreaCode::All,
                AreaArg::Code(code) if table.contains_code(code) => AreaCode::Code(code),
                AreaArg::Code(code) => {
                    return Err(ComtradeError::Validation(format!(
                        "Invalid {kind} code: {code}"
                    )))
                }
                AreaArg::Name(name) => table.resolve_name(&name).ok_or_else(|| {
                    ComtradeError::Validation(format!("Invalid {kind}: '{name}'"))
                })?,
            };
            match resolved {
                AreaCode::All => saw_all = true,
                AreaCode::Code(code) => codes.push(code),
            }
        }

        match (saw_all, codes.is_empty()) {
            (true, true) => Ok(AreaSelection::All),
            (false, false) => Ok(AreaSelection::Codes(codes)),
            (true, false) => Err(ComtradeError::Validation(format!(
                "'all' cannot be combined with other {kind} codes"
            ))),
            (false, true) => Err(ComtradeError::Validation(format!(
                "At least one {kind} is required"
            ))),
        }
    }

    fn has_fragment(&self, key: QueryKey) -> bool {
        self.fragments
            .iter()
            .any(|f| matches!(f, Fragment::Known(k, _) if *k == key))
    }

    /// Insert or replace the fragment for `key`, then re-render the URL
    fn put(&mut self, key: QueryKey, value: String) {
        let existing = self
            .fragments
            .iter_mut()
            .find(|f| matches!(f, Fragment::Known(k, _) if *k == key));

        match existing {
            Some(fragment) => *fragment = Fragment::Known(key, value),
            None => self.fragments.push(Fragment::Known(key, value)),
        }
        self.rebuild_url();
    }

    fn rebuild_url(&mut self) {
        let mut parts: Vec<String> = self.fragments.iter().map(Fragment::render).collect();
        // fmt trails the other parameters until it is set explicitly
        if !self.has_fragment(QueryKey::Format) {
            parts.push(format!("{}={}", QueryKey::Format, self.fmt));
        }
        self.url = format!("{}?{}", self.base_url, parts.join("&"));
    }
}

impl fmt::Display for ComtradeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Current Comtrade Request URL: {}", self.url)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|v| v.trim().to_string()).collect()
}

fn parse_periods(items: &[String]) -> Result<Vec<u32>> {
    items
        .iter()
        .map(|item| {
            item.trim().parse::<u32>().map_err(|_| {
                ComtradeError::Validation(format!("Invalid time period: '{item}'"))
            })
        })
        .collect()
}

/// `YYYY` or `YYYYMM` with a month between 1 and 12
fn is_valid_period(period: u32) -> bool {
    match period {
        1000..=9999 => true,
        100_000..=999_999 => (1..=12).contains(&(period % 100)),
        _ => false,
    }
}
