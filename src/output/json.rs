//! JSON output writer

use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{ensure_parent_dir, OutputError, OutputResult, TableWriter};
use crate::table::Table;

/// Writes a table as a JSON array of records; empty cells become `null`
pub struct JsonTableWriter {
    writer: BufWriter<File>,
    rows_written: u64,
}

impl JsonTableWriter {
    /// Create a new JSON writer
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating JSON writer: path={}", path.display());

        ensure_parent_dir(path)?;

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        Ok(Self {
            writer: BufWriter::new(file),
            rows_written: 0,
        })
    }

    /// Get number of rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl TableWriter for JsonTableWriter {
    fn write_table(&mut self, table: &Table) -> OutputResult<()> {
        let records: Vec<Value> = table
            .rows()
            .iter()
            .map(|row| {
                let record: Map<String, Value> = table
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        let value = cell.clone().map(Value::String).unwrap_or(Value::Null);
                        (column.clone(), value)
                    })
                    .collect();
                Value::Object(record)
            })
            .collect();

        serde_json::to_writer(&mut self.writer, &records).map_err(|e| {
            OutputError::SerializationError(format!("Failed to write records: {}", e))
        })?;
        self.rows_written += records.len() as u64;

        debug!("Wrote {} JSON records", records.len());
        Ok(())
    }

    fn close(mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))?;

        let file = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get file handle: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;
        Ok(())
    }
}
