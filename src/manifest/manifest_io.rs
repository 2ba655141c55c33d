//! I/O operations for manifest files.

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::TplgenError;
use crate::manifest::Manifest;

impl Manifest {
    /// Create a new empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load, parse and validate a manifest from a TOML file.
    ///
    /// The manifest's directory becomes the base for every relative path it
    /// contains.
    ///
    /// # Errors
    ///
    /// - the file cannot be read
    /// - [`TplgenError::ManifestParseError`] for invalid TOML or unknown keys
    /// - [`TplgenError::ManifestValidationError`] for inconsistent content
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;

        let mut manifest = Self::parse(&content, &path.display().to_string())?;

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Cannot determine current working directory")?
                .join(dir)
        };
        manifest.manifest_dir = Some(crate::utils::fs::normalize_path(&dir));

        manifest.validate()?;
        tracing::debug!(
            "Loaded manifest {} ({} templates, {} dependencies)",
            path.display(),
            manifest.templates.len(),
            manifest.dependencies.len()
        );
        Ok(manifest)
    }

    /// Parse manifest content without validating it.
    ///
    /// `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content)
            .map_err(|e| TplgenError::ManifestParseError {
                file: origin.to_string(),
                reason: e.to_string(),
            })
            .with_context(|| format!("Failed to parse manifest file {origin}"))?;
        Ok(manifest)
    }

    /// Serialize the manifest back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize manifest")
    }
}
