//! Response tables
//!
//! A [`Table`] is the parsed form of one response body: named columns and rows
//! of text cells. Empty CSV fields and JSON `null`s are empty cells (`None`).

use crate::OutputFormat;
use serde_json::Value;
use tracing::debug;

/// Key under which some JSON responses nest their records
const JSON_DATASET_KEY: &str = "dataset";

/// Table errors
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Body is not valid CSV
    #[error("CSV parse error: {0}")]
    Csv(String),

    /// Body is not a JSON record list
    #[error("JSON parse error: {0}")]
    Json(String),

    /// Appended table has different columns
    #[error("column mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        /// Columns of the receiving table
        expected: Vec<String>,
        /// Columns of the appended table
        actual: Vec<String>,
    },

    /// A row does not have one cell per column
    #[error("row {row} has {cells} cells, expected {columns}")]
    RaggedRow {
        /// Row index
        row: usize,
        /// Cells in the row
        cells: usize,
        /// Columns in the table
        columns: usize,
    },
}

/// In-memory result table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Build a table from columns and rows
    pub fn from_parts(
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, TableError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(TableError::RaggedRow {
                row,
                cells: cells.len(),
                columns: columns.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Parse a response body in the given format
    pub fn parse(body: &str, format: OutputFormat) -> Result<Self, TableError> {
        match format {
            OutputFormat::Csv => Self::from_csv(body),
            OutputFormat::Json => Self::from_json(body),
        }
    }

    /// Parse a CSV body with a header row
    pub fn from_csv(body: &str) -> Result<Self, TableError> {
        let body = body.trim_start_matches('\u{feff}');
        if body.trim().is_empty() {
            return Err(TableError::Csv("empty response body".to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(body.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| TableError::Csv(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TableError::Csv(e.to_string()))?;
            rows.push(
                record
                    .iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect(),
            );
        }

        debug!("Parsed CSV table: {} rows x {} columns", rows.len(), columns.len());
        Ok(Self { columns, rows })
    }

    /// Parse a JSON body: a record array, or an object with a `dataset` array
    pub fn from_json(body: &str) -> Result<Self, TableError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| TableError::Json(e.to_string()))?;

        let records = match value {
            Value::Array(records) => records,
            Value::Object(mut map) => match map.remove(JSON_DATASET_KEY) {
                Some(Value::Array(records)) => records,
                Some(Value::Null) => Vec::new(),
                Some(other) => {
                    return Err(TableError::Json(format!(
                        "'{JSON_DATASET_KEY}' is not an array: {other}"
                    )))
                }
                None => {
                    return Err(TableError::Json(format!(
                        "object response without '{JSON_DATASET_KEY}' key"
                    )))
                }
            },
            other => return Err(TableError::Json(format!("unexpected response: {other}"))),
        };

        let mut columns: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(records.len());
        for (idx, record) in records.into_iter().enumerate() {
            let Value::Object(object) = record else {
                return Err(TableError::Json(format!("record {idx} is not an object")));
            };
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
            objects.push(object);
        }

        let rows = objects
            .iter()
            .map(|object| {
                columns
                    .iter()
                    .map(|column| object.get(column).and_then(json_cell))
                    .collect()
            })
            .collect::<Vec<Vec<Option<String>>>>();

        debug!("Parsed JSON table: {} rows x {} columns", rows.len(), columns.len());
        Ok(Self { columns, rows })
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows of cells, one cell per column
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has neither rows nor columns
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Cells of one column
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Remove every column whose cells are all empty; returns the removed names
    ///
    /// A table without rows keeps its columns.
    pub fn drop_empty_columns(&mut self) -> Vec<String> {
        if self.rows.is_empty() {
            return Vec::new();
        }

        let keep: Vec<bool> = (0..self.columns.len())
            .map(|idx| self.rows.iter().any(|row| row[idx].is_some()))
            .collect();

        let mut dropped = Vec::new();
        let mut kept_columns = Vec::new();
        for (column, keep) in self.columns.drain(..).zip(&keep) {
            if *keep {
                kept_columns.push(column);
            } else {
                dropped.push(column);
            }
        }
        self.columns = kept_columns;

        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }

        if !dropped.is_empty() {
            debug!("Dropped {} empty columns: {:?}", dropped.len(), dropped);
        }
        dropped
    }

    /// Append the rows of `other`
    ///
    /// Columns are not aligned: both tables must have identical columns, unless
    /// `self` is empty, in which case it takes over `other`.
    pub fn append(&mut self, other: Table) -> Result<(), TableError> {
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        if self.columns != other.columns {
            return Err(TableError::SchemaMismatch {
                expected: self.columns.clone(),
                actual: other.columns,
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }
}

fn json_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
