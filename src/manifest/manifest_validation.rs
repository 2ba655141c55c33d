//! Manifest validation.

use anyhow::Result;
use std::collections::HashSet;

use crate::controller::loader::{is_valid_method_name, is_valid_type_name};
use crate::core::TplgenError;
use crate::manifest::Manifest;

impl Manifest {
    /// Validate manifest consistency.
    ///
    /// Checks that:
    /// - every generation unit names a directory, template and target
    /// - targets are unique after path resolution
    /// - controllers name a dotted type and a method identifier
    /// - dependency names are unique, paths are non-empty, and `requires`
    ///   only references declared dependencies
    ///
    /// Dependency cycles are reported when the dependency graph is resolved.
    pub fn validate(&self) -> Result<()> {
        let mut targets = HashSet::new();
        for (index, unit) in self.templates.iter().enumerate() {
            let label = if unit.name.trim().is_empty() {
                format!("templates[{index}]")
            } else {
                format!("template '{}'", unit.name)
            };

            if unit.name.trim().is_empty() {
                return Err(invalid(format!("{label} is missing a template name")));
            }
            if unit.directory.as_os_str().is_empty() {
                return Err(invalid(format!("{label} is missing a template directory")));
            }
            if unit.target.as_os_str().is_empty() {
                return Err(invalid(format!("{label} is missing an output target")));
            }

            let target = self.resolve_path(&unit.target);
            if !targets.insert(target.clone()) {
                return Err(invalid(format!(
                    "{label} writes to {} which another template already targets",
                    target.display()
                )));
            }

            if let Some(controller) = &unit.controller {
                if !is_valid_type_name(&controller.type_name) {
                    return Err(invalid(format!(
                        "{label} has invalid controller type '{}': expected dot-separated identifiers",
                        controller.type_name
                    )));
                }
                if !is_valid_method_name(&controller.method) {
                    return Err(invalid(format!(
                        "{label} has invalid controller method '{}'",
                        controller.method
                    )));
                }
                if controller.source_version.trim().is_empty() {
                    return Err(invalid(format!("{label} has an empty controller source-version")));
                }
            }
        }

        let mut names = HashSet::new();
        for dep in &self.dependencies {
            if dep.name.trim().is_empty() {
                return Err(invalid("dependency is missing a name".to_string()));
            }
            if !names.insert(dep.name.as_str()) {
                return Err(invalid(format!("dependency '{}' is declared more than once", dep.name)));
            }
            if dep.path.as_os_str().is_empty() {
                return Err(invalid(format!("dependency '{}' is missing a path", dep.name)));
            }
        }
        for dep in &self.dependencies {
            for required in &dep.requires {
                if !names.contains(required.as_str()) {
                    return Err(invalid(format!(
                        "dependency '{}' requires undeclared dependency '{required}'",
                        dep.name
                    )));
                }
            }
        }

        Ok(())
    }
}

fn invalid(reason: String) -> anyhow::Error {
    TplgenError::ManifestValidationError {
        reason,
    }
    .into()
}
