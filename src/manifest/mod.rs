//! Manifest file (`tplgen.toml`) parsing and validation.
//!
//! The manifest declares everything a generation run needs: where compiled
//! controllers and controller sources live, the project's dependency
//! artifacts, the compiler used for the compile fallback, and the ordered list
//! of generation units.
//!
//! # Format
//!
//! ```toml
//! [project]
//! output-dir = "target/controllers"
//! source-dir = "controllers"
//!
//! [[dependencies]]
//! name = "greeting-lib"
//! path = "libs/greeting"
//! scope = "runtime"
//! requires = ["common-lib"]
//!
//! [[dependencies]]
//! name = "common-lib"
//! path = "libs/common"
//! direct = false
//!
//! [compiler]
//! program = "rustc"
//!
//! [[templates]]
//! directory = "templates"
//! name = "Greeting"
//! target = "target/generated-sources/tplgen/greeting.rs"
//! properties = { author = "build" }
//!
//! [templates.controller]
//! type = "com.example.Greeting"
//! method = "data"
//! compile = true
//! properties = { salutation = "Hello" }
//! ```
//!
//! Relative paths are resolved against the directory containing the manifest.
//! Generation units run in declaration order.

mod helpers;
mod manifest_io;
mod manifest_validation;


pub use helpers::{find_manifest, find_manifest_from, find_manifest_with_optional};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_DIR, DEFAULT_SOURCE_VERSION};
use crate::utils::fs::resolve_against;

/// String-to-string property table attached to units and controllers.
pub type Properties = BTreeMap<String, String>;

/// Parsed `tplgen.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Project-wide directories.
    #[serde(default)]
    pub project: ProjectSection,

    /// Dependency artifacts, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencySpec>,

    /// Compiler used by the compile fallback.
    #[serde(default)]
    pub compiler: CompilerSection,

    /// Generation units, in execution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateUnit>,

    /// Directory containing the manifest file; set by [`Manifest::load`].
    #[serde(skip)]
    pub manifest_dir: Option<PathBuf>,
}

/// `[project]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectSection {
    /// Directory holding compiled controllers; always the first classpath root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding controller sources for the compile fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}

/// Scope of a dependency artifact, mirroring the usual build-tool scopes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Needed to compile and run (default).
    #[default]
    Compile,
    /// Needed only at run time.
    Runtime,
    /// Supplied by the environment at run time.
    Provided,
    /// Only needed by tests.
    Test,
}

impl DependencyScope {
    /// Whether artifacts of this scope are on the runtime classpath.
    #[must_use]
    pub const fn is_runtime(self) -> bool {
        matches!(self, Self::Compile | Self::Runtime)
    }
}

impl std::fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Provided => "provided",
            Self::Test => "test",
        };
        f.write_str(name)
    }
}

/// One `[[dependencies]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DependencySpec {
    /// Unique dependency name.
    pub name: String,
    /// Location of the artifact (a directory of controller libraries).
    pub path: PathBuf,
    /// Artifact scope.
    #[serde(default)]
    pub scope: DependencyScope,
    /// Names of dependencies this artifact itself depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// Whether the project declares this dependency directly.
    ///
    /// Entries with `direct = false` are only reachable through `requires`.
    #[serde(default = "default_true")]
    pub direct: bool,
}

/// `[compiler]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CompilerSection {
    /// Compiler executable; `rustc` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Extra arguments passed before the generated ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// One `[[templates]]` entry: a generation unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TemplateUnit {
    /// Directory containing the template file.
    pub directory: PathBuf,
    /// Logical template name (file name without extension).
    pub name: String,
    /// Output file path.
    pub target: PathBuf,
    /// Controller supplying data for the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerSpec>,
    /// Static attributes installed after the controller's results.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

/// `[templates.controller]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ControllerSpec {
    /// Fully-qualified, dot-separated type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Zero-argument method returning the attribute map.
    pub method: String,
    /// Whether a missing type may be compiled from source.
    #[serde(default = "default_true")]
    pub compile: bool,
    /// Language edition used to compile the controller.
    #[serde(default = "default_source_version")]
    pub source_version: String,
    /// Target triple used to compile the controller; host target when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    /// Properties handed to the controller's property setter.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

fn default_true() -> bool {
    true
}

fn default_source_version() -> String {
    DEFAULT_SOURCE_VERSION.to_string()
}

impl ControllerSpec {
    /// Create a spec with default flags for the given type and method.
    pub fn new(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            method: method.into(),
            compile: true,
            source_version: default_source_version(),
            target_version: None,
            properties: Properties::new(),
        }
    }

    /// `Type.method` identity used in log lines and errors.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}.{}", self.type_name, self.method)
    }
}

impl TemplateUnit {
    /// Create a unit without controller or properties.
    pub fn new(
        directory: impl Into<PathBuf>,
        name: impl Into<String>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            target: target.into(),
            controller: None,
            properties: Properties::new(),
        }
    }
}

impl Manifest {
    /// Base directory against which relative paths resolve.
    ///
    /// Falls back to the current directory for manifests built in memory.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.manifest_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve a manifest-relative path.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        resolve_against(&self.base_dir(), path)
    }

    /// Absolute output directory for compiled controllers.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        let dir = self.project.output_dir.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT_DIR));
        self.resolve_path(dir)
    }

    /// Absolute directory holding controller sources.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        let dir = self.project.source_dir.as_deref().unwrap_or(Path::new(DEFAULT_SOURCE_DIR));
        self.resolve_path(dir)
    }

    /// Find a generation unit by template name.
    #[must_use]
    pub fn find_unit(&self, name: &str) -> Option<&TemplateUnit> {
        self.templates.iter().find(|unit| unit.name == name)
    }

    /// Find a dependency by name.
    #[must_use]
    pub fn find_dependency(&self, name: &str) -> Option<&DependencySpec> {
        self.dependencies.iter().find(|dep| dep.name == name)
    }
}
