//! File system utilities for generation output
//!
//! Output files are written atomically: the rendered content goes to a
//! temporary sibling file first and is renamed into place, so a target is
//! either untouched or fully replaced, never partially written.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tplgen_cli::utils::fs::{ensure_dir, safe_write};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("target/generated-sources/tplgen"))?;
//! safe_write(Path::new("target/generated-sources/tplgen/greeting.rs"), "// generated")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Ensures a directory exists, creating it and its parents if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or if the path exists
/// but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            format!(
                "Failed to create directory: {}\n\nCheck directory permissions and path validity",
                path.display()
            )
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Safely writes a string to a file using [`atomic_write`].
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Atomically writes bytes to a file.
///
/// The parent directory is created when missing. Content is written to a
/// temporary file in the same directory, synced, and renamed over the target.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the temporary
/// file cannot be written, or the rename fails. On error the target file is
/// left as it was.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Lexically normalizes a path by resolving `.` and `..` components.
///
/// Does not touch the file system and does not follow symlinks.
///
/// # Examples
///
/// ```rust
/// use tplgen_cli::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_path(Path::new("a/./b/../c")), PathBuf::from("a/c"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                components.pop();
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Resolves `path` against `base` unless it is already absolute, then normalizes it.
#[must_use]
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}
