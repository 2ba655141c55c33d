//! tplgen CLI entry point
//!
//! Parses arguments, installs the log subscriber, and runs the selected
//! command:
//! - `render` - Render the generation units from tplgen.toml
//! - `validate` - Validate the manifest, dependencies and templates
//! - `list` - List configured generation units

use anyhow::Result;
use clap::Parser;
use tplgen_cli::cli;
use tplgen_cli::core::user_friendly_error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.log_level())
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
