//! Reference area code tables
//!
//! The registry holds the reporting-area and partner-area code lists used to
//! validate query parameters and to translate area names into numeric codes.
//! Both lists ship embedded in the crate and are loaded at most once per
//! process; [`ReferenceCodes::from_dir`] loads the same files from disk.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Embedded reporting area data
const REPORTER_AREAS_JSON: &str = include_str!("reporterAreas.json");

/// Embedded partner area data
const PARTNER_AREAS_JSON: &str = include_str!("partnerAreas.json");

/// Process-wide code tables (loaded on first use)
static SHARED: Lazy<RwLock<Option<Arc<ReferenceCodes>>>> = Lazy::new(|| RwLock::new(None));

/// Which side of a trade flow a code list describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    /// Reporting areas (`r` parameter)
    Reporter,
    /// Partner areas (`p` parameter)
    Partner,
}

impl AreaKind {
    /// File name of the backing reference data
    pub fn file_name(&self) -> &'static str {
        match self {
            AreaKind::Reporter => "reporterAreas.json",
            AreaKind::Partner => "partnerAreas.json",
        }
    }
}

impl fmt::Display for AreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaKind::Reporter => write!(f, "reporting area"),
            AreaKind::Partner => write!(f, "partner area"),
        }
    }
}

/// A resolved area: either a numeric code or the `all` literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaCode {
    /// Every area
    All,
    /// A single numeric area code
    Code(u32),
}

impl fmt::Display for AreaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaCode::All => write!(f, "all"),
            AreaCode::Code(code) => write!(f, "{code}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAreaList {
    results: Vec<RawArea>,
}

#[derive(Debug, Deserialize)]
struct RawArea {
    id: String,
    text: String,
}

/// Immutable lookup table for one area kind
#[derive(Debug, Clone)]
pub struct AreaCodeTable {
    kind: AreaKind,
    by_name: HashMap<String, AreaCode>,
    codes: HashSet<u32>,
}

impl AreaCodeTable {
    /// Parse a `{results: [{id, text}, ...]}` document
    pub fn from_json(kind: AreaKind, json: &str) -> Result<Self, RegistryError> {
        let raw: RawAreaList = serde_json::from_str(json).map_err(|e| {
            RegistryError::ParseError(format!("Failed to parse {}: {e}", kind.file_name()))
        })?;

        let mut by_name = HashMap::with_capacity(raw.results.len() + 1);
        let mut codes = HashSet::with_capacity(raw.results.len());

        for entry in raw.results {
            if entry.id == "all" {
                continue;
            }
            let code: u32 = entry.id.trim().parse().map_err(|_| {
                RegistryError::InvalidEntry(format!(
                    "{}: id '{}' for '{}' is not numeric",
                    kind.file_name(),
                    entry.id,
                    entry.text
                ))
            })?;
            by_name.insert(entry.text.to_lowercase(), AreaCode::Code(code));
            codes.insert(code);
        }
        by_name.insert("all".to_string(), AreaCode::All);

        debug!("Loaded {} {} codes", codes.len(), kind);

        Ok(Self {
            kind,
            by_name,
            codes,
        })
    }

    /// Area kind of this table
    pub fn kind(&self) -> AreaKind {
        self.kind
    }

    /// Look up an area by name (case-insensitive); `all` resolves to [`AreaCode::All`]
    pub fn resolve_name(&self, name: &str) -> Option<AreaCode> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    /// Check whether a numeric code is a known area
    pub fn contains_code(&self, code: u32) -> bool {
        self.codes.contains(&code)
    }

    /// Name to code mapping, including the `all` entry
    pub fn names(&self) -> &HashMap<String, AreaCode> {
        &self.by_name
    }

    /// Number of numeric codes
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if the table has no numeric codes
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Reporting and partner area tables
#[derive(Debug, Clone)]
pub struct ReferenceCodes {
    reporters: AreaCodeTable,
    partners: AreaCodeTable,
}

impl ReferenceCodes {
    /// Parse the tables embedded in the crate
    pub fn embedded() -> Result<Self, RegistryError> {
        Ok(Self {
            reporters: AreaCodeTable::from_json(AreaKind::Reporter, REPORTER_AREAS_JSON)?,
            partners: AreaCodeTable::from_json(AreaKind::Partner, PARTNER_AREAS_JSON)?,
        })
    }

    /// Load `reporterAreas.json` and `partnerAreas.json` from a directory
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let read = |kind: AreaKind| -> Result<AreaCodeTable, RegistryError> {
            let path = dir.join(kind.file_name());
            let json = std::fs::read_to_string(&path).map_err(|e| {
                RegistryError::Io(format!("Failed to read {}: {e}", path.display()))
            })?;
            AreaCodeTable::from_json(kind, &json)
        };

        Ok(Self {
            reporters: read(AreaKind::Reporter)?,
            partners: read(AreaKind::Partner)?,
        })
    }

    /// Table for the given area kind
    pub fn table(&self, kind: AreaKind) -> &AreaCodeTable {
        match kind {
            AreaKind::Reporter => &self.reporters,
            AreaKind::Partner => &self.partners,
        }
    }

    /// Shared process-wide tables
    ///
    /// The embedded data is parsed on first call and reused afterwards.
    pub fn shared() -> Result<Arc<Self>, RegistryError> {
        if let Some(codes) = SHARED.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            return Ok(Arc::clone(codes));
        }

        let mut slot = SHARED.write().unwrap_or_else(|e| e.into_inner());
        if let Some(codes) = slot.as_ref() {
            return Ok(Arc::clone(codes));
        }
        let codes = Arc::new(Self::embedded()?);
        *slot = Some(Arc::clone(&codes));
        Ok(codes)
    }

    /// Replace the shared tables
    ///
    /// Builders created afterwards see the new tables; existing builders keep
    /// the tables they were created with.
    pub fn reload(codes: ReferenceCodes) {
        let mut slot = SHARED.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(codes));
    }
}

/// Name to code mapping for one area kind, taken from the shared tables
pub fn load_codes(kind: AreaKind) -> Result<HashMap<String, AreaCode>, RegistryError> {
    Ok(ReferenceCodes::shared()?.table(kind).names().clone())
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Backing file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// Backing file is not valid reference data
    #[error("parse error: {0}")]
    ParseError(String),

    /// An entry has an unusable id
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}
