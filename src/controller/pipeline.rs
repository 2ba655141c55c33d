//! Resolve, compile if needed, check, invoke and map one controller.

use anyhow::Result;
use tera::Context as TeraContext;

use super::compile::{CompileFallback, CompilerService};
use super::contract::{find_property_setter, invocable_method};
use super::invoker::invoke_controller;
use super::loader::{LoadFailure, SymbolLoader};
use super::registry::ControllerRegistry;
use super::{ResolvedController, TypeHandle, mapper};
use crate::artifact::{ArtifactView, BuildContext};
use crate::core::TplgenError;
use crate::manifest::ControllerSpec;

/// Runs the controller stage of a generation unit.
///
/// Resolution happens inside an [`ArtifactView`] so the controller only sees
/// the output directory and the project's direct runtime dependencies. A
/// missing type is compiled at most once, in a fresh window, and looked up
/// again; there are no further retries.
#[derive(Clone, Copy)]
pub struct ControllerPipeline<'a> {
    loader: SymbolLoader<'a>,
    compiler: &'a dyn CompilerService,
}

impl<'a> ControllerPipeline<'a> {
    #[must_use]
    pub const fn new(registry: &'a ControllerRegistry, compiler: &'a dyn CompilerService) -> Self {
        Self {
            loader: SymbolLoader::new(registry),
            compiler,
        }
    }

    /// Resolve the controller type and check the method contract.
    pub fn resolve(&self, spec: &ControllerSpec, context: &mut BuildContext) -> Result<ResolvedController> {
        let handle = match self.load(spec, context) {
            Ok(handle) => handle,
            Err(LoadFailure::NotFound) if spec.compile => {
                tracing::info!(
                    "Unable to find the class: {}.  Attempting to compile it...",
                    spec.type_name
                );
                self.compile_and_load(spec, context)?
            }
            Err(LoadFailure::NotFound) => {
                return Err(TplgenError::TypeNotFound {
                    type_name: spec.type_name.clone(),
                    method: spec.method.clone(),
                    after_compile: false,
                }
                .into());
            }
            Err(LoadFailure::Load(reason)) => return Err(load_error(spec, reason)),
        };

        let method = invocable_method(&handle, &spec.method)?;
        let property_setter = find_property_setter(&handle);
        Ok(ResolvedController {
            handle,
            method,
            property_setter,
        })
    }

    /// Resolve `spec` without compiling and check its contract.
    ///
    /// Used by validation, where a missing type is reported rather than built.
    pub fn check(&self, spec: &ControllerSpec, context: &mut BuildContext) -> Result<ResolvedController> {
        let handle = self.load(spec, context).map_err(|failure| match failure {
            LoadFailure::NotFound => TplgenError::TypeNotFound {
                type_name: spec.type_name.clone(),
                method: spec.method.clone(),
                after_compile: false,
            }
            .into(),
            LoadFailure::Load(reason) => load_error(spec, reason),
        })?;
        let method = invocable_method(&handle, &spec.method)?;
        Ok(ResolvedController {
            property_setter: find_property_setter(&handle),
            handle,
            method,
        })
    }

    /// Run the controller and install its results into `render_context`.
    ///
    /// Returns the number of installed attributes.
    pub fn execute(
        &self,
        spec: &ControllerSpec,
        context: &mut BuildContext,
        render_context: &mut TeraContext,
    ) -> Result<usize> {
        let resolved = self.resolve(spec, context)?;
        let result = invoke_controller(&resolved, &spec.properties)?;
        Ok(mapper::apply(result, render_context, spec)?)
    }

    fn load(&self, spec: &ControllerSpec, context: &mut BuildContext) -> Result<TypeHandle, LoadFailure> {
        let view = ArtifactView::narrow(context);
        tracing::info!("Loading controller class file...");
        let result = self.loader.resolve(&spec.type_name, &view.classpath_roots());
        view.restore();
        result
    }

    fn compile_and_load(&self, spec: &ControllerSpec, context: &mut BuildContext) -> Result<TypeHandle> {
        let view = ArtifactView::narrow(context);
        let ctx = view.context();
        CompileFallback::new(self.compiler).compile(spec, ctx.source_dir(), ctx.output_dir())?;

        tracing::info!("Loading controller class file...");
        let result = self.loader.resolve(&spec.type_name, &view.classpath_roots());
        view.restore();

        match result {
            Ok(handle) => Ok(handle),
            Err(LoadFailure::NotFound) => Err(TplgenError::TypeNotFound {
                type_name: spec.type_name.clone(),
                method: spec.method.clone(),
                after_compile: true,
            }
            .into()),
            Err(LoadFailure::Load(reason)) => Err(load_error(spec, reason)),
        }
    }
}

fn load_error(spec: &ControllerSpec, reason: String) -> anyhow::Error {
    TplgenError::LoadError {
        type_name: spec.type_name.clone(),
        method: spec.method.clone(),
        reason,
    }
    .into()
}
