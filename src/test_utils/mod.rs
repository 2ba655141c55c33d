//! Test utilities for tplgen
//!
//! Helpers shared by unit and integration tests: one-time logging setup, a
//! throwaway project builder, and fixture controllers.
//!
//! # Example
//!
//! ```rust,no_run
//! use tplgen_cli::test_utils::{TestProject, greeting_registry};
//!
//! let project = TestProject::greeting().unwrap();
//! let registry = greeting_registry(&project.output_dir());
//! assert!(project.exists("templates/Greeting.st"));
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_OUTPUT_DIR, MANIFEST_FILE_NAME};
use crate::controller::{
    Argument, ControllerObject, ControllerRegistry, MethodSignature, ParamType, RegisteredType,
    ResultMap, ReturnType,
};
use crate::manifest::{Manifest, Properties};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Manifest of the canonical greeting project.
pub const GREETING_MANIFEST: &str = r#"[project]
output-dir = "target/controllers"
source-dir = "controllers"

[[templates]]
directory = "templates"
name = "Greeting"
target = "target/generated-sources/tplgen/greeting.rs"

[templates.controller]
type = "com.example.Greeting"
method = "data"
"#;

/// A project rooted in a temporary directory.
///
/// The directory is removed when the project is dropped.
pub struct TestProject {
    _temp: TempDir,
    root: PathBuf,
}

impl TestProject {
    /// Empty project without a manifest.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create temporary project directory")?;
        let root = temp.path().to_path_buf();
        Ok(Self {
            _temp: temp,
            root,
        })
    }

    /// Project with `templates/Greeting.st` (`Hello, <name>!`), a manifest
    /// wiring it to `com.example.Greeting.data`, and an existing controller
    /// output directory.
    pub fn greeting() -> Result<Self> {
        let project = Self::new()?;
        project.write_manifest(GREETING_MANIFEST)?;
        project.write_template("Greeting.st", "Hello, <name>!")?;
        std::fs::create_dir_all(project.output_dir())?;
        Ok(project)
    }

    /// Project root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Default controller output directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(DEFAULT_OUTPUT_DIR)
    }

    pub fn write_manifest(&self, content: &str) -> Result<()> {
        self.write(MANIFEST_FILE_NAME, content)
    }

    /// Write `templates/<file_name>`.
    pub fn write_template(&self, file_name: &str, content: &str) -> Result<()> {
        self.write(&format!("templates/{file_name}"), content)
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.root.join(relative);
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path())
    }
}

/// `com.example.Greeting` with a static `data` method returning `name = World`.
#[must_use]
pub fn greeting_type() -> RegisteredType {
    RegisteredType::builder("com.example.Greeting")
        .static_method(MethodSignature::associated("data", ReturnType::Map), |_| {
            Ok(Some(ResultMap::new().with("name", "World")))
        })
        .build()
}

/// Registry providing [`greeting_type`] from `location`.
#[must_use]
pub fn greeting_registry(location: &Path) -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    registry.register(location, greeting_type());
    registry
}

/// Instance controller that echoes its injected properties.
///
/// `data` returns every property plus a `calls` counter. Each construction
/// increments the shared counter handed to [`echo_type`].
pub struct EchoController {
    properties: Properties,
    calls: u64,
}

impl ControllerObject for EchoController {
    fn call(&mut self, method: &str, args: &[Argument]) -> Result<Option<ResultMap>> {
        match (method, args) {
            ("set_properties", [Argument::Properties(properties)]) => {
                self.properties = properties.clone();
                Ok(None)
            }
            ("data", []) => {
                self.calls += 1;
                let mut result: ResultMap = self
                    .properties
                    .iter()
                    .map(|(key, value)| (Value::from(key.as_str()), Value::from(value.as_str())))
                    .collect();
                result.insert("calls", self.calls);
                Ok(Some(result))
            }
            _ => anyhow::bail!("EchoController has no method {method}"),
        }
    }
}

/// `com.example.Echo`, backed by [`EchoController`].
pub fn echo_type(constructed: Rc<Cell<usize>>) -> RegisteredType {
    RegisteredType::builder("com.example.Echo")
        .constructor(move || {
            constructed.set(constructed.get() + 1);
            Ok(EchoController {
                properties: Properties::new(),
                calls: 0,
            })
        })
        .instance_method(MethodSignature::instance("data", ReturnType::Map))
        .instance_method(
            MethodSignature::instance("set_properties", ReturnType::Unit)
                .with_params(vec![ParamType::Properties]),
        )
        .build()
}
