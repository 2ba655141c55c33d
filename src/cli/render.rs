//! Run generation units.
//!
//! Renders every unit declared in `tplgen.toml`, in declaration order, or
//! only the units selected with `--unit`. A failing unit aborts the command
//! with exit status 1; files written by earlier units stay in place.
//!
//! # Examples
//!
//! ```bash
//! tplgen render
//! tplgen render --unit Greeting
//! tplgen render --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::CliConfig;
use super::common::{CommandContext, OutputFormat};
use crate::controller::{ControllerRegistry, RustcCompiler};
use crate::generator::{Generator, RunReport};

/// Arguments of `tplgen render`.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Render only the named unit (repeatable)
    #[arg(long = "unit", value_name = "NAME")]
    pub units: Vec<String>,

    /// Output format of the run summary
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl RenderCommand {
    pub fn execute(
        self,
        manifest_path: Option<PathBuf>,
        registry: &ControllerRegistry,
        config: CliConfig,
    ) -> Result<()> {
        let ctx = CommandContext::load(manifest_path)?;
        let report = self.run(&ctx, registry)?;
        self.print_report(&ctx, &report, config)
    }

    /// Run the selected units against `ctx`.
    pub fn run(&self, ctx: &CommandContext, registry: &ControllerRegistry) -> Result<RunReport> {
        let compiler = RustcCompiler::from_config(&ctx.manifest.compiler);
        let mut build = ctx.build_context()?;
        Generator::new(&ctx.manifest, registry, &compiler).run(&mut build, &self.units)
    }

    fn print_report(&self, ctx: &CommandContext, report: &RunReport, config: CliConfig) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text => {
                if config.quiet {
                    return Ok(());
                }
                if report.units.is_empty() {
                    println!("No generation units to render");
                    return Ok(());
                }
                for unit in &report.units {
                    println!(
                        "{} {} -> {}",
                        "✓".green(),
                        unit.name.bold(),
                        ctx.display_path(&unit.target)
                    );
                }
                for root in &report.compile_source_roots {
                    println!("  compile source root: {}", ctx.display_path(root).cyan());
                }
                println!("\nRendered {} unit(s)", report.units.len());
            }
        }
        Ok(())
    }
}
