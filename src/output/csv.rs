//! CSV output writer

use csv::Writer;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{ensure_parent_dir, OutputError, OutputResult, TableWriter};
use crate::table::Table;

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV writer for result tables
///
/// Writes a header row followed by one record per table row; empty cells are
/// written as empty fields.
pub struct CsvTableWriter {
    writer: Writer<BufWriter<File>>,
    rows_written: u64,
}

impl CsvTableWriter {
    /// Create a new CSV writer
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new CSV writer with custom buffer size
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `buffer_size` - Size of write buffer in bytes
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        buffer_size: usize,
    ) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        ensure_parent_dir(path)?;

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);
        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            rows_written: 0,
        })
    }

    /// Get number of rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl TableWriter for CsvTableWriter {
    fn write_table(&mut self, table: &Table) -> OutputResult<()> {
        self.writer
            .write_record(table.columns())
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;

        for row in table.rows() {
            self.writer
                .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
                .map_err(|e| OutputError::CsvError(format!("Failed to write row: {}", e)))?;
            self.rows_written += 1;
        }

        debug!("Wrote {} CSV rows", self.rows_written);
        Ok(())
    }

    fn close(mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get inner writer: {}", e))
        })?;

        let file = buf_writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get file handle: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        debug!("CSV writer closed: {} rows written", self.rows_written);
        Ok(())
    }
}
