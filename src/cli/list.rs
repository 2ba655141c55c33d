//! List configured generation units.
//!
//! Shows each unit's template, output target and controller, in execution
//! order.
//!
//! ```text
//! NAME      TEMPLATE DIR   TARGET                                    CONTROLLER
//! Greeting  templates      target/generated-sources/tplgen/greeting.rs  com.example.Greeting.data
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::CliConfig;
use super::common::{CommandContext, OutputFormat};

/// Arguments of `tplgen list`.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct UnitEntry {
    name: String,
    directory: PathBuf,
    target: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    controller: Option<String>,
    compile: bool,
}

impl ListCommand {
    pub fn execute(self, manifest_path: Option<PathBuf>, config: CliConfig) -> Result<()> {
        let ctx = CommandContext::load(manifest_path)?;
        let entries: Vec<UnitEntry> = ctx
            .manifest
            .templates
            .iter()
            .map(|unit| UnitEntry {
                name: unit.name.clone(),
                directory: unit.directory.clone(),
                target: unit.target.clone(),
                controller: unit.controller.as_ref().map(|spec| spec.identity()),
                compile: unit.controller.as_ref().is_some_and(|spec| spec.compile),
            })
            .collect();

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Text if config.quiet => {}
            OutputFormat::Text => print_table(&entries),
        }
        Ok(())
    }
}

fn print_table(entries: &[UnitEntry]) {
    if entries.is_empty() {
        println!("No generation units configured.");
        return;
    }

    let name_width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0).max(4);
    let dir_width = entries.iter().map(|e| e.directory.display().to_string().len()).max().unwrap_or(0).max(12);
    let target_width = entries.iter().map(|e| e.target.display().to_string().len()).max().unwrap_or(0).max(6);

    println!(
        "{:<name_width$}  {:<dir_width$}  {:<target_width$}  {}",
        "NAME".bold(),
        "TEMPLATE DIR".bold(),
        "TARGET".bold(),
        "CONTROLLER".bold()
    );
    for entry in entries {
        let controller = match &entry.controller {
            Some(identity) if entry.compile => format!("{identity} (compile)"),
            Some(identity) => identity.clone(),
            None => "-".dimmed().to_string(),
        };
        println!(
            "{:<name_width$}  {:<dir_width$}  {:<target_width$}  {}",
            entry.name,
            entry.directory.display().to_string(),
            entry.target.display().to_string(),
            controller
        );
    }
}
