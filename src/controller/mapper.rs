//! Installs controller results into the render context.

use serde_json::Value;
use std::collections::HashSet;
use tera::Context as TeraContext;

use super::value::{ResultMap, value_type_name};
use crate::core::TplgenError;
use crate::manifest::ControllerSpec;

/// Validate `result` and insert every entry into `context`.
///
/// All keys are checked before anything is inserted, so a rejected result
/// leaves `context` untouched. Returns the number of distinct attributes
/// installed; when a key repeats, its last value wins.
///
/// # Errors
///
/// - [`TplgenError::NullResult`] when the controller returned no value
/// - [`TplgenError::NonStringKey`] for the first key that is not a string
pub fn apply(
    result: Option<ResultMap>,
    context: &mut TeraContext,
    controller: &ControllerSpec,
) -> Result<usize, TplgenError> {
    let Some(map) = result else {
        return Err(TplgenError::NullResult {
            type_name: controller.type_name.clone(),
            method: controller.method.clone(),
        });
    };

    if let Some((key, _)) = map.iter().find(|(key, _)| !key.is_string()) {
        return Err(TplgenError::NonStringKey {
            type_name: controller.type_name.clone(),
            method: controller.method.clone(),
            key_type: value_type_name(key).to_string(),
        });
    }

    let mut names = HashSet::new();
    for (key, value) in map {
        if let Value::String(key) = key {
            context.insert(&key, &value);
            names.insert(key);
        }
    }
    let installed = names.len();
    tracing::debug!("Installed {installed} attributes from {}", controller.identity());
    Ok(installed)
}
