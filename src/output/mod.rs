//! Table output writers

use crate::table::Table;
use crate::OutputFormat;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod csv;
pub mod json;
pub mod path;

pub use self::csv::CsvTableWriter;
pub use self::json::JsonTableWriter;
pub use self::path::next_available_path;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writer for whole result tables
pub trait TableWriter {
    /// Write every row of `table`
    fn write_table(&mut self, table: &Table) -> OutputResult<()>;

    /// Flush buffered data and sync the file to disk
    fn close(self) -> OutputResult<()>;
}

/// Save a table without overwriting existing files
///
/// If `path` exists, the first free `<stem>_v<N>.<ext>` name is used instead.
/// Returns the path actually written.
pub fn save_table<P: AsRef<Path>>(
    table: &Table,
    path: P,
    format: OutputFormat,
) -> OutputResult<PathBuf> {
    let target = next_available_path(path.as_ref());

    match format {
        OutputFormat::Csv => {
            let mut writer = CsvTableWriter::new(&target)?;
            writer.write_table(table)?;
            writer.close()?;
        }
        OutputFormat::Json => {
            let mut writer = JsonTableWriter::new(&target)?;
            writer.write_table(table)?;
            writer.close()?;
        }
    }

    info!(
        "Saved {} rows to {} ({})",
        table.num_rows(),
        target.display(),
        format
    );
    Ok(target)
}

/// Create the parent directory of `path` if needed
pub(crate) fn ensure_parent_dir(path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
    }
    Ok(())
}
