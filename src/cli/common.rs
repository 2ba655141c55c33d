//! Common utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::artifact::{BuildContext, ManifestResolver};
use crate::manifest::{Manifest, find_manifest_with_optional};

/// Output format shared by the reporting commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output with colors.
    #[default]
    Text,
    /// Structured JSON output for scripts and CI.
    Json,
}

/// Manifest and project information shared by every command.
#[derive(Debug)]
pub struct CommandContext {
    /// Parsed and validated project manifest.
    pub manifest: Manifest,
    /// Path to the manifest file.
    pub manifest_path: PathBuf,
    /// Project root directory (containing tplgen.toml).
    pub project_dir: PathBuf,
}

impl CommandContext {
    /// Locate and load the manifest.
    ///
    /// Uses `manifest_path` when given, otherwise searches upward from the
    /// current directory.
    pub fn load(manifest_path: Option<PathBuf>) -> Result<Self> {
        let manifest_path = find_manifest_with_optional(manifest_path)?;
        Self::from_manifest_path(&manifest_path)
    }

    /// Create a command context from a manifest path.
    ///
    /// # Errors
    /// Returns an error if the manifest file doesn't exist, cannot be parsed
    /// or fails validation.
    pub fn from_manifest_path(manifest_path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = manifest_path.as_ref();

        if !manifest_path.exists() {
            return Err(anyhow::anyhow!("Manifest file {} not found", manifest_path.display()));
        }

        let manifest = Manifest::load(manifest_path)?;
        let project_dir = manifest.base_dir();

        Ok(Self {
            manifest,
            manifest_path: manifest_path.to_path_buf(),
            project_dir,
        })
    }

    /// Resolve the project's dependencies into a fresh build context.
    pub fn build_context(&self) -> Result<BuildContext> {
        BuildContext::from_manifest(&self.manifest, &ManifestResolver)
            .with_context(|| format!("Failed to resolve dependencies of {}", self.manifest_path.display()))
    }

    /// Path relative to the project directory for display.
    #[must_use]
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_dir).unwrap_or(path).display().to_string()
    }
}
