//! Project artifacts and the classpath visible to controllers.
//!
//! The host project's dependencies are resolved once per run into an
//! [`ArtifactSet`] held by the [`BuildContext`]. While a controller is being
//! resolved (and possibly compiled) the visible set is narrowed to the
//! project's direct runtime dependencies through an [`ArtifactView`], which
//! puts the previous set back when it goes out of scope.
//!
//! Resolution itself is behind the [`DependencyResolver`] trait so that a
//! different build system can supply its own artifact graph; the default
//! [`ManifestResolver`] reads the manifest's `[[dependencies]]` table.

mod graph;
mod view;

pub use graph::ArtifactGraph;
pub use view::ArtifactView;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::TplgenError;
use crate::manifest::{DependencyScope, Manifest};

/// A resolved dependency artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Dependency name from the manifest.
    pub name: String,
    /// Absolute location of the artifact.
    pub path: PathBuf,
    /// Declared scope.
    pub scope: DependencyScope,
    /// Whether the project declares the artifact directly.
    pub direct: bool,
}

/// Ordered set of artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an artifact, keeping declaration order.
    pub fn push(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.artifacts.iter()
    }

    /// Artifact locations in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.artifacts.iter().map(|a| a.path.as_path())
    }

    /// Number of artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// The direct dependencies whose scope is available at run time.
    #[must_use]
    pub fn direct_runtime(&self) -> Self {
        self.iter().filter(|a| a.direct && a.scope.is_runtime()).cloned().collect()
    }
}

impl FromIterator<Artifact> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        Self {
            artifacts: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

/// Which scopes a resolution request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeFilter {
    /// Every scope.
    #[default]
    All,
    /// Scopes available at run time (`compile` and `runtime`).
    Runtime,
}

impl ScopeFilter {
    /// Whether an artifact of `scope` passes the filter.
    #[must_use]
    pub const fn matches(self, scope: DependencyScope) -> bool {
        match self {
            Self::All => true,
            Self::Runtime => scope.is_runtime(),
        }
    }
}

/// Source of the project's dependency artifacts.
pub trait DependencyResolver {
    /// Resolve the project's artifacts, direct and transitive, that pass `filter`.
    fn resolve(&self, manifest: &Manifest, filter: ScopeFilter) -> Result<ArtifactSet>;
}

/// Resolves artifacts from the manifest's `[[dependencies]]` table.
///
/// Artifacts reachable from a direct dependency through `requires` edges are
/// included; entries that nothing reaches are dropped. Cycles are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestResolver;

impl ManifestResolver {
    /// Build the `requires` graph for `manifest`.
    #[must_use]
    pub fn graph(manifest: &Manifest) -> ArtifactGraph {
        let mut graph = ArtifactGraph::new();
        for dep in &manifest.dependencies {
            graph.add_artifact(&dep.name);
            for required in &dep.requires {
                graph.add_dependency(&dep.name, required);
            }
        }
        graph
    }
}

impl DependencyResolver for ManifestResolver {
    fn resolve(&self, manifest: &Manifest, filter: ScopeFilter) -> Result<ArtifactSet> {
        let graph = Self::graph(manifest);
        graph.detect_cycles().map_err(|e| TplgenError::DependencyResolutionFailed {
            reason: e.to_string(),
        })?;

        let reachable = graph.reachable_from(
            manifest.dependencies.iter().filter(|d| d.direct).map(|d| d.name.as_str()),
        );

        let set: ArtifactSet = manifest
            .dependencies
            .iter()
            .filter(|dep| reachable.contains(&dep.name) && filter.matches(dep.scope))
            .map(|dep| Artifact {
                name: dep.name.clone(),
                path: manifest.resolve_path(&dep.path),
                scope: dep.scope,
                direct: dep.direct,
            })
            .collect();

        for artifact in &set {
            if !artifact.path.exists() {
                tracing::debug!(
                    "Dependency '{}' points to missing location {}",
                    artifact.name,
                    artifact.path.display()
                );
            }
        }
        tracing::debug!(
            "Resolved {} of {} declared dependencies ({} edges)",
            set.len(),
            manifest.dependencies.len(),
            graph.edge_count()
        );
        Ok(set)
    }
}

/// Per-run build state shared by every generation unit.
///
/// Holds the controller output directory and the project's resolved
/// artifacts. The `visible` set is what controller resolution currently sees;
/// it only changes through an [`ArtifactView`].
#[derive(Debug, Clone)]
pub struct BuildContext {
    output_dir: PathBuf,
    source_dir: PathBuf,
    artifacts: ArtifactSet,
    visible: ArtifactSet,
    compile_source_roots: Vec<PathBuf>,
}

impl BuildContext {
    /// Create a context whose visible set starts as every project artifact.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
        artifacts: ArtifactSet,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            source_dir: source_dir.into(),
            visible: artifacts.clone(),
            artifacts,
            compile_source_roots: Vec::new(),
        }
    }

    /// Build the context for `manifest`, resolving its dependencies with `resolver`.
    pub fn from_manifest(manifest: &Manifest, resolver: &dyn DependencyResolver) -> Result<Self> {
        let artifacts = resolver.resolve(manifest, ScopeFilter::All)?;
        Ok(Self::new(manifest.output_dir(), manifest.source_dir(), artifacts))
    }

    /// Directory holding compiled controllers.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Directory holding controller sources.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Every resolved project artifact.
    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// The artifacts currently visible to controller resolution.
    #[must_use]
    pub const fn visible(&self) -> &ArtifactSet {
        &self.visible
    }

    /// Register a directory of generated sources for later compilation.
    ///
    /// Registering the same directory twice has no effect.
    pub fn add_compile_source_root(&mut self, root: PathBuf) -> bool {
        if self.compile_source_roots.contains(&root) {
            return false;
        }
        tracing::info!("Adding compile source root: {}", root.display());
        self.compile_source_roots.push(root);
        true
    }

    /// Registered compile source roots, in registration order.
    #[must_use]
    pub fn compile_source_roots(&self) -> &[PathBuf] {
        &self.compile_source_roots
    }

    fn replace_visible(&mut self, set: ArtifactSet) -> ArtifactSet {
        std::mem::replace(&mut self.visible, set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DependencySpec;

    fn dep(name: &str, scope: DependencyScope, direct: bool, requires: &[&str]) -> DependencySpec {
        DependencySpec {
            name: name.to_string(),
            path: PathBuf::from(format!("libs/{name}")),
            scope,
            requires: requires.iter().map(|s| (*s).to_string()).collect(),
            direct,
        }
    }

    fn manifest_with(deps: Vec<DependencySpec>) -> Manifest {
        let mut manifest = Manifest::new();
        manifest.manifest_dir = Some(PathBuf::from("/project"));
        manifest.dependencies = deps;
        manifest
    }

    #[test]
    fn test_resolver_includes_transitive_and_drops_unreachable() {
        let manifest = manifest_with(vec![
            dep("app-lib", DependencyScope::Compile, true, &["common"]),
            dep("common", DependencyScope::Compile, false, &[]),
            dep("orphan", DependencyScope::Compile, false, &[]),
        ]);

        let set = ManifestResolver.resolve(&manifest, ScopeFilter::All).unwrap();
        let names: Vec<_> = set.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["app-lib", "common"]);
        assert_eq!(set.iter().next().unwrap().path, PathBuf::from("/project/libs/app-lib"));
    }

    #[test]
    fn test_resolver_applies_scope_filter() {
        let manifest = manifest_with(vec![
            dep("runtime-lib", DependencyScope::Runtime, true, &[]),
            dep("test-lib", DependencyScope::Test, true, &[]),
            dep("provided-lib", DependencyScope::Provided, true, &[]),
        ]);

        let set = ManifestResolver.resolve(&manifest, ScopeFilter::Runtime).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().name, "runtime-lib");
    }

    #[test]
    fn test_resolver_rejects_cycles() {
        let manifest = manifest_with(vec![
            dep("a", DependencyScope::Compile, true, &["b"]),
            dep("b", DependencyScope::Compile, false, &["a"]),
        ]);

        let err = ManifestResolver.resolve(&manifest, ScopeFilter::All).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TplgenError>(),
            Some(TplgenError::DependencyResolutionFailed { .. })
        ));
    }

    #[test]
    fn test_direct_runtime_selection() {
        let manifest = manifest_with(vec![
            dep("direct", DependencyScope::Compile, true, &["transitive"]),
            dep("transitive", DependencyScope::Runtime, false, &[]),
            dep("tests-only", DependencyScope::Test, true, &[]),
        ]);
        let set = ManifestResolver.resolve(&manifest, ScopeFilter::All).unwrap();

        let narrowed = set.direct_runtime();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed.iter().next().unwrap().name, "direct");
    }

    #[test]
    fn test_compile_source_roots_are_deduplicated() {
        let mut ctx = BuildContext::new("/out", "/src", ArtifactSet::new());
        assert!(ctx.add_compile_source_root(PathBuf::from("/gen/tplgen")));
        assert!(!ctx.add_compile_source_root(PathBuf::from("/gen/tplgen")));
        assert_eq!(ctx.compile_source_roots().len(), 1);
    }
}
