//! Output directory versioning.
//!
//! Each run writes into a fresh, empty directory. A directory left behind by
//! an earlier run is never merged into or overwritten: it is renamed to the
//! lowest free `<root>_<k>` (k ≥ 1) first.
//!
//! ```text
//! before:  Output/  Output_1/
//! after:   Output/ (empty)  Output_1/  Output_2/ (previous Output)
//! ```
//!
//! Any filesystem error here is fatal to the run.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum OutputDirError {
    #[error("output directory name is empty")]
    EmptyRoot,
    #[error("failed to move existing {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output directory {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A freshly created output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedOutput {
    pub path: PathBuf,
    /// Where the previous directory of the same name was moved, if any.
    pub archived: Option<PathBuf>,
}

/// `<root>_<suffix>`, ignoring any trailing separator on `root`.
pub fn versioned_path(root: &Path, suffix: u32) -> PathBuf {
    let normalized: PathBuf = root.components().collect();
    let mut name = OsString::from(normalized.as_os_str());
    name.push(format!("_{suffix}"));
    PathBuf::from(name)
}

/// Lowest `<root>_<k>`, k ≥ 1, that does not exist.
pub fn next_free_version(root: &Path) -> PathBuf {
    (1..)
        .map(|k| versioned_path(root, k))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .unwrap_or_else(|| versioned_path(root, u32::MAX))
}

/// Archive any existing `root` and create it empty.
pub fn prepare(root: &Path) -> Result<PreparedOutput, OutputDirError> {
    if root.as_os_str().is_empty() {
        return Err(OutputDirError::EmptyRoot);
    }

    let archived = if fs::symlink_metadata(root).is_ok() {
        let target = next_free_version(root);
        info!(
            from = %root.display(),
            to = %target.display(),
            "output directory exists, moving it aside"
        );
        fs::rename(root, &target).map_err(|source| OutputDirError::Rename {
            from: root.to_path_buf(),
            to: target.clone(),
            source,
        })?;
        Some(target)
    } else {
        None
    };

    fs::create_dir_all(root).map_err(|source| OutputDirError::Create {
        path: root.to_path_buf(),
        source,
    })?;

    Ok(PreparedOutput {
        path: root.to_path_buf(),
        archived,
    })
}
