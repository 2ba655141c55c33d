//! Controller invocation.

use super::value::{Argument, ResultMap};
use super::{ControllerObject, MethodHandle, ResolvedController, TypeHandle};
use crate::core::TplgenError;
use crate::manifest::Properties;

/// Per-unit invocation scope.
///
/// Starts unbound. The first instance-method call constructs the controller
/// with its zero-argument constructor; later calls reuse that instance.
/// Static calls never construct anything. The instance is dropped with the
/// scope.
pub struct ControllerScope {
    handle: TypeHandle,
    instance: Option<Box<dyn ControllerObject>>,
}

impl ControllerScope {
    #[must_use]
    pub const fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            instance: None,
        }
    }

    /// Whether an instance has been constructed.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.instance.is_some()
    }

    /// Invoke `method` with `args`.
    pub fn invoke(
        &mut self,
        method: &MethodHandle,
        args: &[Argument],
    ) -> Result<Option<ResultMap>, TplgenError> {
        let result = if method.is_static() {
            self.handle.controller_type().call_static(method.name(), args)
        } else {
            self.bind(method)?.call(method.name(), args)
        };

        result.map_err(|e| TplgenError::InvocationFailure {
            type_name: self.handle.name().to_string(),
            method: method.name().to_string(),
            reason: format!("{e:#}"),
        })
    }

    fn bind(&mut self, method: &MethodHandle) -> Result<&mut dyn ControllerObject, TplgenError> {
        let instance = match self.instance.take() {
            Some(instance) => instance,
            None => {
                tracing::debug!("Instantiating controller {}", self.handle.name());
                self.handle.controller_type().instantiate().map_err(|e| {
                    TplgenError::InstantiationFailure {
                        type_name: self.handle.name().to_string(),
                        method: method.name().to_string(),
                        reason: format!("{e:#}"),
                    }
                })?
            }
        };
        Ok(&mut **self.instance.insert(instance))
    }
}

impl std::fmt::Debug for ControllerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerScope")
            .field("handle", &self.handle)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Run a resolved controller once.
///
/// The property setter, when present, receives `properties` before the main
/// call; an empty table skips it. Both calls share one scope and therefore
/// one instance.
pub fn invoke_controller(
    resolved: &ResolvedController,
    properties: &Properties,
) -> Result<Option<ResultMap>, TplgenError> {
    let mut scope = ControllerScope::new(resolved.handle.clone());

    if let Some(setter) = &resolved.property_setter
        && !properties.is_empty()
    {
        tracing::debug!("Applying {} properties to {}", properties.len(), resolved.handle.name());
        scope.invoke(setter, &[Argument::Properties(properties.clone())])?;
    }

    tracing::info!("Invoking controller: {}()", resolved.identity());
    scope.invoke(&resolved.method, &[])
}
