//! Compile fallback for controllers missing from the classpath.
//!
//! When the first lookup of a controller type finds nothing and the
//! controller allows compilation, the type's source unit is handed to a
//! [`CompilerService`] once. The source unit path is derived from the type
//! name: `com.example.Greeting` becomes `com/example/Greeting.rs`, relative to
//! the project's controller source directory. The compiler must place the
//! result where [`SymbolLoader`](super::SymbolLoader) looks for it, inside
//! the output directory.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::library::library_path;
use crate::constants::CONTROLLER_SOURCE_EXTENSION;
use crate::core::TplgenError;
use crate::manifest::{CompilerSection, ControllerSpec};
use crate::utils::fs::ensure_dir;

/// Relative source unit path for a dotted type name.
///
/// # Examples
///
/// ```rust
/// use std::path::PathBuf;
/// use tplgen_cli::controller::compile::source_unit_path;
///
/// assert_eq!(
///     source_unit_path("com.example.Greeting"),
///     ["com", "example", "Greeting.rs"].iter().collect::<PathBuf>()
/// );
/// ```
#[must_use]
pub fn source_unit_path(type_name: &str) -> PathBuf {
    let mut path: PathBuf = type_name.split('.').collect();
    path.set_extension(CONTROLLER_SOURCE_EXTENSION);
    path
}

/// Everything a compiler needs to build one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Fully-qualified controller type name.
    pub type_name: String,
    /// Controller method the compiled type has to provide.
    pub method: String,
    /// Source unit relative to `source_dir`.
    pub source_unit: PathBuf,
    /// Language edition.
    pub source_version: String,
    /// Target triple; host target when `None`.
    pub target_version: Option<String>,
    /// Directory holding controller sources.
    pub source_dir: PathBuf,
    /// Directory receiving compiled controllers.
    pub output_dir: PathBuf,
}

impl CompileRequest {
    /// Build the request for `spec` with the project's directories.
    pub fn new(spec: &ControllerSpec, source_dir: &Path, output_dir: &Path) -> Self {
        Self {
            type_name: spec.type_name.clone(),
            method: spec.method.clone(),
            source_unit: source_unit_path(&spec.type_name),
            source_version: spec.source_version.clone(),
            target_version: spec.target_version.clone().filter(|t| !t.trim().is_empty()),
            source_dir: source_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Absolute path of the source unit.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.source_unit)
    }

    /// Where the compiled controller has to end up.
    #[must_use]
    pub fn library_path(&self) -> PathBuf {
        library_path(&self.output_dir, &self.type_name)
    }
}

/// Compiles controller sources into the output directory.
pub trait CompilerService {
    fn compile(&self, request: &CompileRequest) -> Result<()>;
}

/// Compiles controllers with `rustc` into `cdylib` controller libraries.
#[derive(Debug, Clone)]
pub struct RustcCompiler {
    program: String,
    args: Vec<String>,
}

impl Default for RustcCompiler {
    fn default() -> Self {
        Self {
            program: "rustc".to_string(),
            args: Vec::new(),
        }
    }
}

impl RustcCompiler {
    /// Use the manifest's `[compiler]` table.
    #[must_use]
    pub fn from_config(config: &CompilerSection) -> Self {
        Self {
            program: config.program.clone().unwrap_or_else(|| "rustc".to_string()),
            args: config.args.clone(),
        }
    }

    /// Command line arguments for `request`, excluding the program.
    #[must_use]
    pub fn arguments(&self, request: &CompileRequest) -> Vec<String> {
        let crate_name = request.type_name.replace('.', "_").to_lowercase();
        let mut args = self.args.clone();
        args.extend([
            "--crate-type".to_string(),
            "cdylib".to_string(),
            "--crate-name".to_string(),
            crate_name,
            "--edition".to_string(),
            request.source_version.clone(),
        ]);
        if let Some(target) = &request.target_version {
            args.extend(["--target".to_string(), target.clone()]);
        }
        args.extend([
            "-o".to_string(),
            request.library_path().display().to_string(),
            request.source_path().display().to_string(),
        ]);
        args
    }

    fn failure(request: &CompileRequest, reason: impl Into<String>) -> anyhow::Error {
        TplgenError::CompileFailure {
            type_name: request.type_name.clone(),
            method: request.method.clone(),
            source_unit: request.source_unit.display().to_string(),
            reason: reason.into(),
        }
        .into()
    }
}

impl CompilerService for RustcCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<()> {
        let source = request.source_path();
        if !source.is_file() {
            return Err(Self::failure(
                request,
                format!("source unit {} does not exist", source.display()),
            ));
        }

        let program = which::which(&self.program).map_err(|e| {
            Self::failure(request, format!("compiler '{}' not found: {e}", self.program))
        })?;

        let library = request.library_path();
        if let Some(parent) = library.parent() {
            ensure_dir(parent)?;
        }

        let args = self.arguments(request);
        tracing::debug!("Running {} {}", program.display(), args.join(" "));
        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| Self::failure(request, format!("failed to run {}: {e}", program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::failure(request, stderr.trim().to_string()));
        }
        Ok(())
    }
}

/// Runs the compiler service for a controller that could not be found.
#[derive(Clone, Copy)]
pub struct CompileFallback<'c> {
    compiler: &'c dyn CompilerService,
}

impl<'c> CompileFallback<'c> {
    pub const fn new(compiler: &'c dyn CompilerService) -> Self {
        Self {
            compiler,
        }
    }

    /// Compile the controller described by `spec`.
    ///
    /// Errors that are not already a [`TplgenError`] are reported as
    /// [`TplgenError::CompileFailure`].
    pub fn compile(&self, spec: &ControllerSpec, source_dir: &Path, output_dir: &Path) -> Result<()> {
        let request = CompileRequest::new(spec, source_dir, output_dir);
        tracing::info!("Adding {} to compiler include list...", request.source_unit.display());
        tracing::info!("Compiling...");

        self.compiler.compile(&request).map_err(|e| {
            if e.downcast_ref::<TplgenError>().is_some() {
                e
            } else {
                TplgenError::CompileFailure {
                    type_name: request.type_name.clone(),
                    method: request.method.clone(),
                    source_unit: request.source_unit.display().to_string(),
                    reason: format!("{e:#}"),
                }
                .into()
            }
        })
    }
}
