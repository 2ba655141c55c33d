//! Symbolic lookup of controller types.
//!
//! [`SymbolLoader::resolve`] searches an ordered list of classpath roots for a
//! fully-qualified type name. Each existing root is checked against the
//! in-process [`ControllerRegistry`] first and then for a controller library
//! at the conventional path (see [`library::library_path`]). Roots that do
//! not exist are skipped.
//!
//! A type that no root provides is [`LoadFailure::NotFound`], which the
//! pipeline may recover from by compiling the controller. Everything else
//! that goes wrong is [`LoadFailure::Load`].

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use super::TypeHandle;
use super::library::{self, LibraryType};
use super::registry::ControllerRegistry;

static TYPE_NAME: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").ok()
});

static METHOD_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

/// Whether `name` is a dot-separated sequence of identifiers.
#[must_use]
pub fn is_valid_type_name(name: &str) -> bool {
    TYPE_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

/// Whether `name` is a single identifier.
#[must_use]
pub fn is_valid_method_name(name: &str) -> bool {
    METHOD_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

/// Why a lookup produced no type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// No root provides the type.
    NotFound,
    /// A root or library could not be read or loaded.
    Load(String),
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Load(reason) => f.write_str(reason),
        }
    }
}

/// Looks controller types up by name.
#[derive(Debug, Clone, Copy)]
pub struct SymbolLoader<'r> {
    registry: &'r ControllerRegistry,
}

impl<'r> SymbolLoader<'r> {
    #[must_use]
    pub const fn new(registry: &'r ControllerRegistry) -> Self {
        Self {
            registry,
        }
    }

    /// Resolve `type_name` against `roots`, in order.
    pub fn resolve(&self, type_name: &str, roots: &[PathBuf]) -> Result<TypeHandle, LoadFailure> {
        if !is_valid_type_name(type_name) {
            return Err(LoadFailure::Load(format!(
                "'{type_name}' is not a valid type name: expected dot-separated identifiers"
            )));
        }

        for root in roots {
            match std::fs::metadata(root) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("Skipping missing classpath root {}", root.display());
                    continue;
                }
                Err(e) => {
                    return Err(LoadFailure::Load(format!(
                        "cannot read classpath root {}: {e}",
                        root.display()
                    )));
                }
                Ok(meta) if !meta.is_dir() => {
                    return Err(LoadFailure::Load(format!(
                        "classpath root {} is not a directory",
                        root.display()
                    )));
                }
                Ok(_) => {}
            }

            if let Some(handle) = self.find_in_root(type_name, root)? {
                tracing::debug!("Found {type_name} in {}", root.display());
                return Ok(handle);
            }
        }

        Err(LoadFailure::NotFound)
    }

    fn find_in_root(&self, type_name: &str, root: &Path) -> Result<Option<TypeHandle>, LoadFailure> {
        if let Some(ty) = self.registry.lookup(type_name, root) {
            return Ok(Some(TypeHandle::new(ty, root)));
        }

        let path = library::library_path(root, type_name);
        if !path.is_file() {
            return Ok(None);
        }
        let ty = LibraryType::load(&path, type_name).map_err(|e| LoadFailure::Load(format!("{e:#}")))?;
        Ok(Some(TypeHandle::new(Arc::new(ty), root)))
    }
}
