//! In-process controller types.
//!
//! Rust controller types are registered against the artifact location that
//! provides them. A registered type is only visible to lookups whose
//! classpath root contains that location, and only while the location exists
//! on disk, exactly like a compiled controller library would be.
//!
//! # Examples
//!
//! ```rust
//! use tplgen_cli::controller::{
//!     ControllerRegistry, MethodSignature, RegisteredType, ResultMap, ReturnType,
//! };
//!
//! let greeting = RegisteredType::builder("com.example.Greeting")
//!     .static_method(MethodSignature::associated("data", ReturnType::Map), |_args| {
//!         Ok(Some(ResultMap::new().with("name", "World")))
//!     })
//!     .build();
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register("target/controllers", greeting);
//! assert_eq!(registry.len(), 1);
//! ```

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::descriptor::{MethodSignature, TypeDescriptor};
use super::value::{Argument, ResultMap};
use super::{ControllerObject, ControllerType};
use crate::utils::fs::normalize_path;

type Constructor = Box<dyn Fn() -> Result<Box<dyn ControllerObject>>>;
type StaticMethod = Box<dyn Fn(&[Argument]) -> Result<Option<ResultMap>>>;

/// A controller type implemented in Rust.
pub struct RegisteredType {
    descriptor: TypeDescriptor,
    constructor: Option<Constructor>,
    statics: HashMap<String, StaticMethod>,
}

impl RegisteredType {
    /// Start describing a type called `name`.
    pub fn builder(name: impl Into<String>) -> RegisteredTypeBuilder {
        RegisteredTypeBuilder {
            ty: Self {
                descriptor: TypeDescriptor::new(name),
                constructor: None,
                statics: HashMap::new(),
            },
        }
    }
}

impl std::fmt::Debug for RegisteredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredType")
            .field("descriptor", &self.descriptor)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

impl ControllerType for RegisteredType {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn instantiate(&self) -> Result<Box<dyn ControllerObject>> {
        let constructor = self
            .constructor
            .as_ref()
            .ok_or_else(|| anyhow!("{} has no zero-argument constructor", self.descriptor.name))?;
        constructor()
    }

    fn call_static(&self, method: &str, args: &[Argument]) -> Result<Option<ResultMap>> {
        let body = self
            .statics
            .get(method)
            .ok_or_else(|| anyhow!("{} has no static method {method}", self.descriptor.name))?;
        body(args)
    }
}

/// Builder returned by [`RegisteredType::builder`].
pub struct RegisteredTypeBuilder {
    ty: RegisteredType,
}

impl RegisteredTypeBuilder {
    /// Set the zero-argument constructor used for instance methods.
    #[must_use]
    pub fn constructor<F, O>(mut self, make: F) -> Self
    where
        F: Fn() -> Result<O> + 'static,
        O: ControllerObject + 'static,
    {
        self.ty.constructor =
            Some(Box::new(move || make().map(|obj| Box::new(obj) as Box<dyn ControllerObject>)));
        self
    }

    /// Declare an instance method dispatched through [`ControllerObject::call`].
    #[must_use]
    pub fn instance_method(mut self, signature: MethodSignature) -> Self {
        self.ty.descriptor.methods.push(MethodSignature {
            is_static: false,
            ..signature
        });
        self
    }

    /// Declare a static method with its body.
    #[must_use]
    pub fn static_method<F>(mut self, signature: MethodSignature, body: F) -> Self
    where
        F: Fn(&[Argument]) -> Result<Option<ResultMap>> + 'static,
    {
        self.ty.statics.insert(signature.name.clone(), Box::new(body));
        self.ty.descriptor.methods.push(MethodSignature {
            is_static: true,
            ..signature
        });
        self
    }

    #[must_use]
    pub fn build(self) -> RegisteredType {
        self.ty
    }
}

/// Registered controller types keyed by the artifact location providing them.
#[derive(Default)]
pub struct ControllerRegistry {
    entries: Vec<(PathBuf, Arc<dyn ControllerType>)>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` as provided by the artifact at `location`.
    pub fn register(&mut self, location: impl AsRef<Path>, ty: impl ControllerType + 'static) {
        self.register_shared(location, Arc::new(ty));
    }

    /// Register an already shared type.
    pub fn register_shared(&mut self, location: impl AsRef<Path>, ty: Arc<dyn ControllerType>) {
        let location = normalize_path(location.as_ref());
        tracing::debug!("Registered controller {} at {}", ty.descriptor().name, location.display());
        self.entries.push((location, ty));
    }

    /// Find `type_name` among types whose location lies inside `root`.
    ///
    /// The first registration wins when several match.
    #[must_use]
    pub fn lookup(&self, type_name: &str, root: &Path) -> Option<Arc<dyn ControllerType>> {
        let root = normalize_path(root);
        self.entries
            .iter()
            .find(|(location, ty)| {
                ty.descriptor().name == type_name && location.starts_with(&root) && location.exists()
            })
            .map(|(_, ty)| Arc::clone(ty))
    }

    /// Names of every registered type, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, ty)| ty.descriptor().name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.type_names()).finish()
    }
}
