//! Shared path resolution for scan roots and output roots.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SfoError};

/// Resolve the scan root to an existing, canonical directory.
///
/// A file path resolves to its parent directory. An unresolvable path is a
/// [`SfoError::MissingTarget`] — the run aborts before any traversal.
pub fn normalize_scan_root(path: &Path) -> Result<PathBuf> {
    let canonical = fs::canonicalize(path).map_err(|_| SfoError::MissingTarget {
        path: path.to_path_buf(),
    })?;
    if canonical.is_dir() {
        return Ok(canonical);
    }
    canonical
        .parent()
        .map(Path::to_path_buf)
        .ok_or(SfoError::MissingTarget {
            path: path.to_path_buf(),
        })
}

/// Resolve the output root: `<parentOf(scan_root)>/<folder_name>`.
///
/// The output root lives adjacent to the scan root, which also keeps a
/// repeated scan of the root from walking its own output.
pub fn output_root_for(scan_root: &Path, folder_name: &str) -> Result<PathBuf> {
    let parent = scan_root.parent().ok_or_else(|| SfoError::InvalidConfig {
        details: format!(
            "scan root {} has no parent directory to hold the output folder",
            scan_root.display()
        ),
    })?;
    Ok(parent.join(folder_name))
}

/// Append a UTC timestamp to an output folder name, allowing repeated runs
/// against the same root without tripping the already-exists check.
#[must_use]
pub fn stamped_folder_name(folder_name: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    format!("{folder_name}-{stamp}")
}
