//! Full generation runs against temporary projects.

use anyhow::Result;
use std::cell::Cell;
use std::rc::Rc;
use tplgen_cli::artifact::{BuildContext, ManifestResolver};
use tplgen_cli::controller::{CompileRequest, CompilerService, ControllerRegistry};
use tplgen_cli::core::TplgenError;
use tplgen_cli::generator::Generator;
use tplgen_cli::test_utils::{TestProject, echo_type, greeting_registry, greeting_type, init_test_logging};

/// Records compile requests; "builds" by creating the output directory.
struct FakeCompiler {
    calls: Cell<usize>,
}

impl FakeCompiler {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
        }
    }
}

impl CompilerService for FakeCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        std::fs::create_dir_all(&request.output_dir)?;
        Ok(())
    }
}

#[test]
fn test_greeting_renders_hello_world() {
    init_test_logging(None);
    let project = TestProject::greeting().unwrap();
    let manifest = project.load_manifest().unwrap();
    let registry = greeting_registry(&project.output_dir());
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    let report = Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap();

    assert_eq!(project.read("target/generated-sources/tplgen/greeting.rs").unwrap(), "Hello, World!");
    assert_eq!(report.units.len(), 1);
    assert_eq!(
        report.compile_source_roots,
        vec![project.path().join("target/generated-sources/tplgen")]
    );
    assert_eq!(compiler.calls.get(), 0, "a loadable controller is never compiled");
}

#[test]
fn test_missing_type_without_compile_fails_and_writes_nothing() {
    let project = TestProject::greeting().unwrap();
    project
        .write_manifest(
            r#"
[[templates]]
directory = "templates"
name = "Greeting"
target = "out/greeting.txt"

[templates.controller]
type = "com.example.Greeting"
method = "data"
compile = false
"#,
        )
        .unwrap();
    let manifest = project.load_manifest().unwrap();
    let registry = ControllerRegistry::new();
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    let err = Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("com.example.Greeting.data"), "error names the controller: {message}");
    let error = err.downcast_ref::<TplgenError>().unwrap();
    assert!(matches!(error, TplgenError::TypeNotFound { after_compile: false, .. }));
    assert_eq!(error.controller_type(), Some("com.example.Greeting"));
    assert_eq!(error.controller_method(), Some("data"));
    assert!(!project.exists("out/greeting.txt"));
    assert_eq!(compiler.calls.get(), 0);
}

#[test]
fn test_existing_output_untouched_on_failure() {
    let project = TestProject::greeting().unwrap();
    project.write("target/generated-sources/tplgen/greeting.rs", "previous").unwrap();
    let manifest = project.load_manifest().unwrap();
    // Nothing registered and the compiler produces nothing useful.
    let registry = ControllerRegistry::new();
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    let err = Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<TplgenError>(),
        Some(TplgenError::TypeNotFound { after_compile: true, .. })
    ));
    assert_eq!(compiler.calls.get(), 1, "exactly one compile attempt");
    assert_eq!(project.read("target/generated-sources/tplgen/greeting.rs").unwrap(), "previous");
}

#[test]
fn test_compile_fallback_makes_controller_visible() {
    let project = TestProject::greeting().unwrap();
    std::fs::remove_dir_all(project.output_dir()).unwrap();
    let manifest = project.load_manifest().unwrap();
    // Registered in the output directory, which only exists once compiled.
    let mut registry = ControllerRegistry::new();
    registry.register(project.output_dir(), greeting_type());
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap();

    assert_eq!(compiler.calls.get(), 1);
    assert_eq!(project.read("target/generated-sources/tplgen/greeting.rs").unwrap(), "Hello, World!");
}

#[test]
fn test_properties_reach_one_controller_instance() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest(
            r#"
[[templates]]
directory = "templates"
name = "Echo"
target = "out/echo.txt"

[templates.controller]
type = "com.example.Echo"
method = "data"
properties = { greeting = "Howdy" }
"#,
        )
        .unwrap();
    project.write_template("Echo.tera", "{{ greeting }} x{{ calls }}").unwrap();
    std::fs::create_dir_all(project.output_dir()).unwrap();

    let constructed = Rc::new(Cell::new(0));
    let mut registry = ControllerRegistry::new();
    registry.register(project.output_dir(), echo_type(Rc::clone(&constructed)));
    let manifest = project.load_manifest().unwrap();
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap();

    assert_eq!(project.read("out/echo.txt").unwrap(), "Howdy x1");
    assert_eq!(constructed.get(), 1);
}

#[test]
fn test_instances_are_not_shared_between_units() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest(
            r#"
[[templates]]
directory = "templates"
name = "Echo"
target = "out/first.txt"

[templates.controller]
type = "com.example.Echo"
method = "data"

[[templates]]
directory = "templates"
name = "Echo"
target = "out/second.txt"

[templates.controller]
type = "com.example.Echo"
method = "data"
"#,
        )
        .unwrap();
    project.write_template("Echo.tera", "x{{ calls }}").unwrap();
    std::fs::create_dir_all(project.output_dir()).unwrap();

    let constructed = Rc::new(Cell::new(0));
    let mut registry = ControllerRegistry::new();
    registry.register(project.output_dir(), echo_type(Rc::clone(&constructed)));
    let manifest = project.load_manifest().unwrap();
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap();

    assert_eq!(constructed.get(), 2);
    assert_eq!(project.read("out/first.txt").unwrap(), "x1");
    assert_eq!(project.read("out/second.txt").unwrap(), "x1");
}

#[test]
fn test_unit_properties_override_controller_attributes() {
    let project = TestProject::greeting().unwrap();
    project
        .write_manifest(
            r#"
[[templates]]
directory = "templates"
name = "Greeting"
target = "out/greeting.txt"
properties = { name = "Override" }

[templates.controller]
type = "com.example.Greeting"
method = "data"
"#,
        )
        .unwrap();
    let manifest = project.load_manifest().unwrap();
    let registry = greeting_registry(&project.output_dir());
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap();

    assert_eq!(project.read("out/greeting.txt").unwrap(), "Hello, Override!");
}

#[test]
fn test_indentation_is_preserved() {
    let project = TestProject::greeting().unwrap();
    project.write_template("Greeting.st", "fn main() {\n    println!(\"<name>\");\n}\n").unwrap();
    let manifest = project.load_manifest().unwrap();
    let registry = greeting_registry(&project.output_dir());
    let compiler = FakeCompiler::new();

    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver).unwrap();
    Generator::new(&manifest, &registry, &compiler).run(&mut context, &[]).unwrap();

    assert_eq!(
        project.read("target/generated-sources/tplgen/greeting.rs").unwrap(),
        "fn main() {\n    println!(\"World\");\n}\n"
    );
}
