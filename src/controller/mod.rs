//! Controller resolution and invocation.
//!
//! A controller is a named type plus a named method that supplies the data a
//! template renders. Getting from the configured names to attributes in a
//! render context takes these steps:
//!
//! 1. [`loader::SymbolLoader`] looks the type up by name in a narrowed set of
//!    classpath roots (see [`crate::artifact::ArtifactView`])
//! 2. when the type is missing and compilation is enabled,
//!    [`compile::CompileFallback`] compiles it once and the lookup is repeated
//! 3. [`contract`] checks that the method takes no arguments and returns a
//!    key/value map, and finds the optional property setter
//! 4. [`invoker`] binds at most one instance, injects properties and calls
//!    the method
//! 5. [`mapper`] validates the returned keys and installs the attributes
//!
//! [`pipeline::ControllerPipeline`] runs the whole sequence for one
//! generation unit.
//!
//! Controller types come from two places: Rust types registered in a
//! [`registry::ControllerRegistry`] against an artifact location, and dynamic
//! libraries that export the controller module table (see [`library`]).

pub mod compile;
pub mod contract;
pub mod descriptor;
pub mod invoker;
pub mod library;
pub mod loader;
pub mod mapper;
pub mod pipeline;
pub mod registry;
pub mod value;

pub use compile::{CompileFallback, CompileRequest, CompilerService, RustcCompiler};
pub use descriptor::{MethodSignature, ParamType, ReturnType, TypeDescriptor};
pub use loader::{LoadFailure, SymbolLoader};
pub use pipeline::ControllerPipeline;
pub use registry::{ControllerRegistry, RegisteredType};
pub use value::{Argument, ResultMap};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A live controller instance.
pub trait ControllerObject {
    /// Invoke an instance method.
    ///
    /// `Ok(None)` means the method returned no value.
    fn call(&mut self, method: &str, args: &[Argument]) -> anyhow::Result<Option<ResultMap>>;
}

/// A controller type that can be looked up by name.
pub trait ControllerType {
    /// Declared methods of the type.
    fn descriptor(&self) -> &TypeDescriptor;

    /// Construct an instance with no arguments.
    fn instantiate(&self) -> anyhow::Result<Box<dyn ControllerObject>>;

    /// Invoke a static method.
    fn call_static(&self, method: &str, args: &[Argument]) -> anyhow::Result<Option<ResultMap>>;
}

/// A resolved controller type and the root it was found in.
#[derive(Clone)]
pub struct TypeHandle {
    ty: Arc<dyn ControllerType>,
    origin: PathBuf,
}

impl TypeHandle {
    pub fn new(ty: Arc<dyn ControllerType>, origin: impl Into<PathBuf>) -> Self {
        Self {
            ty,
            origin: origin.into(),
        }
    }

    /// Fully-qualified type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.ty.descriptor().name
    }

    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.ty.descriptor()
    }

    /// Classpath root the type was resolved from.
    #[must_use]
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub(crate) fn controller_type(&self) -> &dyn ControllerType {
        self.ty.as_ref()
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("name", &self.name())
            .field("origin", &self.origin)
            .finish()
    }
}

/// A method that passed a contract check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodHandle {
    signature: MethodSignature,
}

impl MethodHandle {
    pub(crate) const fn new(signature: MethodSignature) -> Self {
        Self {
            signature,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.signature.is_static
    }

    #[must_use]
    pub const fn signature(&self) -> &MethodSignature {
        &self.signature
    }
}

/// Everything needed to invoke one controller for one generation unit.
#[derive(Debug, Clone)]
pub struct ResolvedController {
    pub handle: TypeHandle,
    pub method: MethodHandle,
    pub property_setter: Option<MethodHandle>,
}

impl ResolvedController {
    /// `Type.method` identity used in log lines.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}.{}", self.handle.name(), self.method.name())
    }
}
