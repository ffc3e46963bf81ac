//! Non-colliding output paths
//!
//! Saved results never replace an existing file. When the requested path is
//! taken, a version suffix is inserted before the extension:
//!
//! ```rust
//! use comtrade_downloader::output::next_available_path;
//! use std::path::Path;
//!
//! // Nothing exists at this path, so it is returned unchanged
//! let path = next_available_path(Path::new("/nonexistent/dir/exports.csv"));
//! assert_eq!(path, Path::new("/nonexistent/dir/exports.csv"));
//! ```

use std::path::{Path, PathBuf};
use tracing::debug;

/// First free path among `path`, `<stem>_v1.<ext>`, `<stem>_v2.<ext>`, ...
pub fn next_available_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let mut version = 1u32;
    loop {
        let candidate = versioned_path(path, version);
        if !candidate.exists() {
            debug!(
                "{} exists, writing to {} instead",
                path.display(),
                candidate.display()
            );
            return candidate;
        }
        version += 1;
    }
}

/// `<stem>_v<version>.<ext>` next to `path`; paths without extension get a bare suffix
pub fn versioned_path(path: &Path, version: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match path.extension() {
        Some(ext) => format!("{stem}_v{version}.{}", ext.to_string_lossy()),
        None => format!("{stem}_v{version}"),
    };
    path.with_file_name(file_name)
}
