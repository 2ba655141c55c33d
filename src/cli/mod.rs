//! Command-line interface for tplgen.
//!
//! # Available Commands
//!
//! - `render` - Run the generation units declared in `tplgen.toml`
//! - `validate` - Check the manifest, its dependency graph and templates
//! - `list` - Show the configured generation units
//!
//! # Command Usage Patterns
//!
//! ```bash
//! # Render every unit
//! tplgen render
//!
//! # Render selected units with debug logging
//! tplgen --verbose render --unit Greeting --unit Model
//!
//! # Resolve every controller without compiling or invoking it
//! tplgen validate --resolve --format json
//!
//! # Use a manifest outside the current directory tree
//! tplgen --manifest-path build/tplgen.toml list
//! ```
//!
//! # Logging
//!
//! Log output goes through `tracing`. `--verbose` selects `debug`, `--quiet`
//! selects `error`, and the default is `info`. A `RUST_LOG` value in the
//! environment takes precedence over all three.

mod common;
mod list;
mod render;
mod validate;


pub use common::{CommandContext, OutputFormat};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::controller::ControllerRegistry;

/// Runtime configuration derived from global flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Suppress informational output.
    pub quiet: bool,
    /// Show detailed output.
    pub verbose: bool,
}

impl CliConfig {
    /// Default `tracing` filter for these flags.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "tplgen",
    about = "Build-time template generation driven by named controllers",
    version,
    long_about = "tplgen renders templates from the data returned by controller types, \
                  compiling missing controllers on demand, and writes the results into the build tree."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the manifest file (tplgen.toml)
    ///
    /// By default the manifest is searched for from the current directory
    /// upward.
    #[arg(long, global = true, value_name = "PATH")]
    manifest_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render generation units
    Render(render::RenderCommand),

    /// Validate the manifest, dependencies and templates
    Validate(validate::ValidateCommand),

    /// List configured generation units
    List(list::ListCommand),
}

impl Cli {
    /// Configuration derived from the global flags.
    #[must_use]
    pub const fn build_config(&self) -> CliConfig {
        CliConfig {
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }

    /// Execute with no in-process controllers registered.
    ///
    /// Controllers are then only found as dynamic libraries in the classpath
    /// roots.
    pub fn execute(self) -> Result<()> {
        self.execute_with_registry(&ControllerRegistry::new())
    }

    /// Execute with the given in-process controllers available.
    pub fn execute_with_registry(self, registry: &ControllerRegistry) -> Result<()> {
        let config = self.build_config();
        let manifest_path = self.manifest_path;

        match self.command {
            Commands::Render(cmd) => cmd.execute(manifest_path, registry, config),
            Commands::Validate(cmd) => cmd.execute(manifest_path, registry, config),
            Commands::List(cmd) => cmd.execute(manifest_path, config),
        }
    }
}
