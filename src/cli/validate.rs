//! Validate project configuration without generating anything.
//!
//! Checks run in order:
//!
//! 1. **Manifest**: TOML syntax, known keys, required fields, unique targets,
//!    controller type and method names
//! 2. **Dependencies**: every `requires` edge resolves and the graph has no
//!    cycles
//! 3. **Templates**: every unit's template exists and parses
//! 4. **Controllers** (with `--resolve`): every controller type resolves in
//!    its classpath roots and exposes a valid zero-argument, map-returning
//!    method. Nothing is compiled or invoked.
//!
//! A manifest that fails to load stops validation immediately. Later checks
//! report every problem they find before the command fails.
//!
//! # Examples
//!
//! ```bash
//! tplgen validate
//! tplgen validate --resolve --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::CliConfig;
use super::common::{CommandContext, OutputFormat};
use crate::artifact::BuildContext;
use crate::controller::{CompileRequest, CompilerService, ControllerPipeline, ControllerRegistry};
use crate::templating::{TemplateRenderer, TemplateSource};

/// Arguments of `tplgen validate`.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Resolve every controller and check its method contract
    ///
    /// Controllers are looked up exactly as `render` would, but a missing
    /// type is reported instead of compiled and no controller code runs.
    #[arg(long)]
    pub resolve: bool,

    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Results of a validation run, used for JSON output.
#[derive(Debug, Default, Serialize)]
struct ValidationResults {
    /// No errors were found.
    valid: bool,
    /// The manifest loaded and passed structural validation.
    manifest_valid: bool,
    /// The dependency graph resolved.
    dependencies_resolvable: bool,
    /// Every template exists and parses.
    templates_valid: bool,
    /// Every controller resolved; absent unless `--resolve` was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    controllers_resolvable: Option<bool>,
    /// Messages that make validation fail.
    errors: Vec<String>,
    /// Non-fatal findings.
    warnings: Vec<String>,
}

/// Compiler used during validation, where compiling is never allowed.
struct NoCompile;

impl CompilerService for NoCompile {
    fn compile(&self, request: &CompileRequest) -> Result<()> {
        anyhow::bail!("validation does not compile controllers ({})", request.type_name)
    }
}

impl ValidateCommand {
    pub fn execute(
        self,
        manifest_path: Option<PathBuf>,
        registry: &ControllerRegistry,
        config: CliConfig,
    ) -> Result<()> {
        let mut results = ValidationResults::default();

        let ctx = match CommandContext::load(manifest_path) {
            Ok(ctx) => ctx,
            Err(e) => {
                results.errors.push(format!("{e:#}"));
                self.report(&results, config)?;
                return Err(e);
            }
        };
        results.manifest_valid = true;
        if config.verbose && !config.quiet && self.format == OutputFormat::Text {
            println!("{} Manifest {} is valid", "✓".green(), ctx.manifest_path.display());
        }

        if ctx.manifest.templates.is_empty() {
            results.warnings.push("No generation units defined".to_string());
        }

        let build = match ctx.build_context() {
            Ok(build) => {
                results.dependencies_resolvable = true;
                Some(build)
            }
            Err(e) => {
                results.errors.push(format!("{e:#}"));
                None
            }
        };

        results.templates_valid = Self::check_templates(&ctx, &mut results.errors);

        if self.resolve {
            let resolvable = match build {
                Some(mut build) => Self::check_controllers(&ctx, registry, &mut build, &mut results.errors),
                None => false,
            };
            results.controllers_resolvable = Some(resolvable);
        }

        results.valid = results.errors.is_empty();
        self.report(&results, config)?;

        if results.valid {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Validation failed with {} error(s)", results.errors.len()))
        }
    }

    fn check_templates(ctx: &CommandContext, errors: &mut Vec<String>) -> bool {
        let renderer = TemplateRenderer::new();
        let mut valid = true;
        for unit in &ctx.manifest.templates {
            let directory = ctx.manifest.resolve_path(&unit.directory);
            let checked = TemplateSource::load(&directory, &unit.name)
                .and_then(|source| renderer.prepare(&source).map(|_| ()));
            if let Err(e) = checked {
                errors.push(format!("Unit '{}': {e}", unit.name));
                valid = false;
            }
        }
        valid
    }

    fn check_controllers(
        ctx: &CommandContext,
        registry: &ControllerRegistry,
        build: &mut BuildContext,
        errors: &mut Vec<String>,
    ) -> bool {
        let pipeline = ControllerPipeline::new(registry, &NoCompile);
        let mut valid = true;
        for unit in &ctx.manifest.templates {
            let Some(spec) = &unit.controller else {
                continue;
            };
            match pipeline.check(spec, build) {
                Ok(resolved) => {
                    tracing::debug!("Controller {} resolved from {}", resolved.identity(), resolved.handle.origin().display());
                }
                Err(e) => {
                    errors.push(format!("Unit '{}': {e:#}", unit.name));
                    valid = false;
                }
            }
        }
        valid
    }

    fn report(&self, results: &ValidationResults, config: CliConfig) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(results)?);
            }
            OutputFormat::Text => {
                if config.quiet {
                    return Ok(());
                }
                for error in &results.errors {
                    println!("{} {error}", "✗".red());
                }
                for warning in &results.warnings {
                    println!("{} Warning: {warning}", "⚠".yellow());
                }
                if results.valid {
                    println!("{} Valid tplgen.toml", "✓".green());
                }
            }
        }
        Ok(())
    }
}
