//! tplgen - build-time template generation driven by named controllers
//!
//! For every generation unit declared in `tplgen.toml`, tplgen resolves a
//! controller type by name, runs one of its methods to obtain a string-keyed
//! attribute map, renders a template with those attributes, and writes the
//! result into the build tree.
//!
//! # Architecture Overview
//!
//! ```text
//! ArtifactView -> SymbolLoader -> [CompileFallback -> SymbolLoader]
//!              -> contract check -> invoke -> map results -> render -> write
//! ```
//!
//! - Resolution sees only the controller output directory and the project's
//!   direct runtime dependencies, and the full dependency view is restored
//!   afterwards on every path
//! - A missing controller is compiled from source at most once per unit
//! - The controller method must take no arguments and return a key/value map
//!   whose keys are all strings
//!
//! # Core Modules
//!
//! - [`artifact`] - Dependency artifacts, their graph, and the narrowed view
//! - [`controller`] - Controller lookup, compilation, contract and invocation
//! - [`templating`] - Template lookup and rendering with Tera
//! - [`generator`] - Per-unit orchestration and output writing
//! - [`manifest`] - `tplgen.toml` parsing and validation
//! - [`cli`] - Command-line interface
//! - [`core`] - Error taxonomy and user-facing error reporting
//! - [`utils`] - File system helpers and name suggestions
//!
//! # Manifest Format (tplgen.toml)
//!
//! ```toml
//! [project]
//! output-dir = "target/controllers"
//! source-dir = "controllers"
//!
//! [[templates]]
//! directory = "templates"
//! name = "Greeting"
//! target = "target/generated-sources/tplgen/greeting.rs"
//!
//! [templates.controller]
//! type = "com.example.Greeting"
//! method = "data"
//! ```
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use tplgen_cli::artifact::{BuildContext, ManifestResolver};
//! use tplgen_cli::controller::{ControllerRegistry, RustcCompiler};
//! use tplgen_cli::generator::Generator;
//! use tplgen_cli::manifest::Manifest;
//!
//! # fn example() -> anyhow::Result<()> {
//! let manifest = Manifest::load(std::path::Path::new("tplgen.toml"))?;
//! let registry = ControllerRegistry::new();
//! let compiler = RustcCompiler::from_config(&manifest.compiler);
//!
//! let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver)?;
//! let report = Generator::new(&manifest, &registry, &compiler).run(&mut context, &[])?;
//! for file in report.written_files() {
//!     println!("wrote {}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod cli;
pub mod constants;
pub mod controller;
pub mod core;
pub mod generator;
pub mod manifest;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
