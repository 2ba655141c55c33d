//! The controller method contract.
//!
//! A controller method must take no arguments and return something a
//! key/value map can be assigned to. Optionally the type exposes
//! `set_properties(properties)` to receive the controller's static property
//! table before the call. Both checks use the type descriptor only.

use super::descriptor::ParamType;
use super::{MethodHandle, TypeHandle};
use crate::constants::PROPERTY_SETTER_NAME;
use crate::core::TplgenError;
use crate::utils::suggest::similar_names;

/// Find the zero-argument method `name` and check its return type.
///
/// # Errors
///
/// - [`TplgenError::MethodNotFound`] when no zero-argument overload exists
/// - [`TplgenError::ContractViolation`] when its return type is not map-assignable
pub fn invocable_method(handle: &TypeHandle, name: &str) -> Result<MethodHandle, TplgenError> {
    let descriptor = handle.descriptor();
    let Some(signature) = descriptor.methods_named(name).find(|m| m.is_zero_arg()) else {
        let candidates = descriptor
            .methods
            .iter()
            .filter(|m| m.is_zero_arg() && m.returns.is_map_assignable())
            .map(|m| m.name.as_str());
        return Err(TplgenError::MethodNotFound {
            type_name: descriptor.name.clone(),
            method: name.to_string(),
            suggestions: similar_names(name, candidates),
        });
    };

    if !signature.returns.is_map_assignable() {
        return Err(TplgenError::ContractViolation {
            type_name: descriptor.name.clone(),
            method: name.to_string(),
            declared: signature.returns.to_string(),
        });
    }

    Ok(MethodHandle::new(signature.clone()))
}

/// Find the optional property setter: `set_properties` taking exactly one
/// property table.
#[must_use]
pub fn find_property_setter(handle: &TypeHandle) -> Option<MethodHandle> {
    handle
        .descriptor()
        .methods_named(PROPERTY_SETTER_NAME)
        .find(|m| m.params == [ParamType::Properties])
        .cloned()
        .map(MethodHandle::new)
}
