//! Manifest discovery.
//!
//! Like git's search for `.git`, tplgen walks from the working directory up to
//! the filesystem root looking for `tplgen.toml`.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::constants::MANIFEST_FILE_NAME;
use crate::core::TplgenError;

/// Find the manifest by searching from the current directory upward.
///
/// # Errors
///
/// Returns [`TplgenError::ManifestNotFound`] when no `tplgen.toml` exists in the
/// current directory or any ancestor.
pub fn find_manifest() -> Result<PathBuf> {
    let current = std::env::current_dir()
        .context("Cannot determine current working directory. This may indicate a permission issue or corrupted filesystem")?;
    find_manifest_from(current)
}

/// Find manifest using explicit path or directory search.
///
/// Uses the explicit path if provided and it exists, otherwise searches from
/// the current directory.
pub fn find_manifest_with_optional(explicit_path: Option<PathBuf>) -> Result<PathBuf> {
    match explicit_path {
        Some(path) => {
            if path.is_file() {
                Ok(path)
            } else {
                Err(TplgenError::ManifestNotFound.into())
            }
        }
        None => find_manifest(),
    }
}

/// Find manifest by searching up from a specific starting directory.
pub fn find_manifest_from(mut current: PathBuf) -> Result<PathBuf> {
    loop {
        let candidate = current.join(MANIFEST_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(TplgenError::ManifestNotFound.into());
        }
    }
}
