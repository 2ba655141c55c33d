//! Generation run orchestration.
//!
//! A [`Generator`] walks the manifest's generation units in declaration
//! order. For each unit it:
//!
//! 1. Loads and parses the template, so a missing or malformed template fails
//!    before any controller code runs
//! 2. Runs the configured controller through the [`ControllerPipeline`] and
//!    installs its attributes into a fresh render context
//! 3. Installs the unit's static properties, overriding controller attributes
//!    of the same name
//! 4. Renders and atomically writes the target file
//! 5. Registers the generated-sources root of Rust outputs as a compile
//!    source root
//!
//! The first failing unit stops the run. Files written by earlier units are
//! kept.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tera::Context as TeraContext;

use crate::artifact::BuildContext;
use crate::constants::{GENERATED_SOURCE_EXTENSION, GENERATED_SOURCES_DIR};
use crate::controller::{CompilerService, ControllerPipeline, ControllerRegistry};
use crate::core::TplgenError;
use crate::manifest::{Manifest, TemplateUnit};
use crate::templating::{TemplateRenderer, TemplateSource};
use crate::utils::fs::atomic_write;
use crate::utils::similar_names;

/// Outcome of one successfully generated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    /// Template name of the unit.
    pub name: String,
    /// Absolute path of the written file.
    pub target: PathBuf,
    /// Attributes installed from the controller.
    pub controller_attributes: usize,
    /// Compile source root registered for this output, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_source_root: Option<PathBuf>,
}

/// Summary of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Completed units in execution order.
    pub units: Vec<UnitOutcome>,
    /// Every compile source root known to the build context after the run.
    pub compile_source_roots: Vec<PathBuf>,
}

impl RunReport {
    /// Paths of all written files.
    pub fn written_files(&self) -> impl Iterator<Item = &Path> {
        self.units.iter().map(|unit| unit.target.as_path())
    }
}

/// Runs generation units against a manifest.
pub struct Generator<'a> {
    manifest: &'a Manifest,
    pipeline: ControllerPipeline<'a>,
    renderer: TemplateRenderer,
}

impl<'a> Generator<'a> {
    pub const fn new(
        manifest: &'a Manifest,
        registry: &'a ControllerRegistry,
        compiler: &'a dyn CompilerService,
    ) -> Self {
        Self {
            manifest,
            pipeline: ControllerPipeline::new(registry, compiler),
            renderer: TemplateRenderer::new(),
        }
    }

    /// Run every unit, or only the units named in `selection`.
    ///
    /// Selected units still run in manifest order.
    ///
    /// # Errors
    ///
    /// Fails when a selected name matches no unit, or on the first unit that
    /// fails. The error names the failing unit.
    pub fn run(&self, context: &mut BuildContext, selection: &[String]) -> Result<RunReport> {
        for name in selection {
            if self.manifest.find_unit(name).is_none() {
                let suggestions =
                    similar_names(name, self.manifest.templates.iter().map(|unit| unit.name.as_str()));
                let mut message = format!("No generation unit named '{name}' in the manifest");
                if !suggestions.is_empty() {
                    message.push_str(&format!(" (did you mean: {}?)", suggestions.join(", ")));
                }
                return Err(TplgenError::Other {
                    message,
                }
                .into());
            }
        }

        let mut report = RunReport::default();
        for unit in &self.manifest.templates {
            if !selection.is_empty() && !selection.contains(&unit.name) {
                tracing::debug!("Skipping unit {}", unit.name);
                continue;
            }
            let outcome = self
                .run_unit(unit, context)
                .with_context(|| format!("Generation unit '{}' failed", unit.name))?;
            report.units.push(outcome);
        }

        report.compile_source_roots = context.compile_source_roots().to_vec();
        Ok(report)
    }

    /// Generate a single unit.
    pub fn run_unit(&self, unit: &TemplateUnit, context: &mut BuildContext) -> Result<UnitOutcome> {
        let directory = self.manifest.resolve_path(&unit.directory);
        let target = self.manifest.resolve_path(&unit.target);
        tracing::info!("Processing template {} from {}", unit.name, directory.display());

        let source = TemplateSource::load(&directory, &unit.name)?;
        let template = self.renderer.prepare(&source)?;

        let mut render_context = TeraContext::new();
        let controller_attributes = match &unit.controller {
            Some(spec) => self.pipeline.execute(spec, context, &mut render_context)?,
            None => 0,
        };
        for (key, value) in &unit.properties {
            render_context.insert(key.as_str(), value);
        }

        let output = self.renderer.render(&template, &render_context)?;
        atomic_write(&target, output.as_bytes()).map_err(|e| TplgenError::OutputWriteFailure {
            path: target.display().to_string(),
            reason: format!("{e:#}"),
        })?;
        tracing::info!("Wrote {}", target.display());

        let compile_source_root = compile_source_root(&target);
        if let Some(root) = &compile_source_root {
            context.add_compile_source_root(root.clone());
        }

        Ok(UnitOutcome {
            name: unit.name.clone(),
            target,
            controller_attributes,
            compile_source_root,
        })
    }
}

/// Compile source root for a generated file, if it qualifies.
///
/// A file qualifies when it has the generated source extension and sits at
/// least one directory below a `generated-sources` component. The root is
/// that component plus the directory that follows it.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tplgen_cli::generator::compile_source_root;
///
/// let root = compile_source_root(Path::new("/p/target/generated-sources/tplgen/greeting.rs"));
/// assert_eq!(root, Some(PathBuf::from("/p/target/generated-sources/tplgen")));
/// assert_eq!(compile_source_root(Path::new("/p/target/greeting.rs")), None);
/// ```
#[must_use]
pub fn compile_source_root(path: &Path) -> Option<PathBuf> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(GENERATED_SOURCE_EXTENSION) {
        return None;
    }

    let components: Vec<Component<'_>> = path.components().collect();
    let marker = components
        .iter()
        .position(|component| component.as_os_str() == GENERATED_SOURCES_DIR)?;

    // The component after the marker must be a directory, not the file itself.
    if marker + 2 >= components.len() {
        return None;
    }
    Some(components[..=marker + 1].iter().collect())
}
