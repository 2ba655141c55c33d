//! Controller visibility through declared dependencies.

use anyhow::Result;
use tplgen_cli::artifact::{BuildContext, DependencyResolver, ManifestResolver, ScopeFilter};
use tplgen_cli::controller::{CompileRequest, CompilerService, ControllerRegistry};
use tplgen_cli::core::TplgenError;
use tplgen_cli::generator::Generator;
use tplgen_cli::test_utils::{TestProject, greeting_type};

struct NeverCompiles;

impl CompilerService for NeverCompiles {
    fn compile(&self, request: &CompileRequest) -> Result<()> {
        panic!("unexpected compile of {}", request.type_name);
    }
}

fn project_with_dependencies(compile_scope: &str) -> TestProject {
    let project = TestProject::greeting().unwrap();
    project
        .write_manifest(&format!(
            r#"
[[dependencies]]
name = "greeting-lib"
path = "libs/greeting"
scope = "{compile_scope}"
requires = ["common-lib"]

[[dependencies]]
name = "common-lib"
path = "libs/common"
direct = false

[[templates]]
directory = "templates"
name = "Greeting"
target = "out/greeting.txt"

[templates.controller]
type = "com.example.Greeting"
method = "data"
compile = false
"#
        ))
        .unwrap();
    std::fs::create_dir_all(project.path().join("libs/greeting")).unwrap();
    std::fs::create_dir_all(project.path().join("libs/common")).unwrap();
    project
}

#[test]
fn test_controller_in_direct_dependency_is_found() {
    let project = project_with_dependencies("runtime");
    let manifest = project.load_manifest().unwrap();
    let mut registry = ControllerRegistry::new();
    registry.register(project.path().join("libs/greeting"), greeting_type());

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    let visible_before = context.visible().clone();
    Generator::new(&manifest, &registry, &NeverCompiles).run(&mut context, &[]).unwrap();

    assert_eq!(project.read("out/greeting.txt").unwrap(), "Hello, World!");
    assert_eq!(context.visible(), &visible_before, "visible set restored after the run");
}

#[test]
fn test_controller_in_transitive_dependency_is_hidden() {
    let project = project_with_dependencies("runtime");
    let manifest = project.load_manifest().unwrap();
    let mut registry = ControllerRegistry::new();
    registry.register(project.path().join("libs/common"), greeting_type());

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    assert_eq!(context.artifacts().len(), 2, "transitive dependency is resolved");

    let err = Generator::new(&manifest, &registry, &NeverCompiles).run(&mut context, &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TplgenError>(),
        Some(TplgenError::TypeNotFound { .. })
    ));
    assert_eq!(context.visible().len(), 2, "visible set restored after failure");
}

#[test]
fn test_test_scoped_dependency_is_hidden() {
    let project = project_with_dependencies("test");
    let manifest = project.load_manifest().unwrap();
    let mut registry = ControllerRegistry::new();
    registry.register(project.path().join("libs/greeting"), greeting_type());

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    assert!(Generator::new(&manifest, &registry, &NeverCompiles).run(&mut context, &[]).is_err());
    assert!(!project.exists("out/greeting.txt"));
}

#[test]
fn test_runtime_filter_drops_test_scope() {
    let project = project_with_dependencies("test");
    let manifest = project.load_manifest().unwrap();

    let all = ManifestResolver.resolve(&manifest, ScopeFilter::All).unwrap();
    let runtime = ManifestResolver.resolve(&manifest, ScopeFilter::Runtime).unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(runtime.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), vec!["common-lib"]);
}

#[test]
fn test_dependency_cycle_fails_resolution() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest(
            r#"
[[dependencies]]
name = "a"
path = "libs/a"
requires = ["b"]

[[dependencies]]
name = "b"
path = "libs/b"
requires = ["a"]
"#,
        )
        .unwrap();
    let manifest = project.load_manifest().unwrap();

    let err = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TplgenError>(),
        Some(TplgenError::DependencyResolutionFailed { .. })
    ));
}
