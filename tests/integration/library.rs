//! Dynamic-library controllers built by `rustc` through the compile fallback.
//!
//! These tests need a working `rustc` on `PATH` and are skipped without one.

use anyhow::Result;
use std::cell::Cell;
use tplgen_cli::artifact::{BuildContext, ManifestResolver};
use tplgen_cli::controller::{CompileRequest, CompilerService, ControllerRegistry, RustcCompiler};
use tplgen_cli::core::TplgenError;
use tplgen_cli::generator::Generator;
use tplgen_cli::test_utils::TestProject;

/// Controller source exporting the `tplgen_controller_module_v1` table.
///
/// `set_properties` stores the `who` property; `data` answers with
/// `name = <who>` and a per-instance call counter. Greeting "Nobody" is an
/// error reported through the call protocol.
const GREETING_SOURCE: &str = r###"
#![allow(dead_code)]

use std::ffi::{c_char, c_void, CStr, CString};

#[repr(C)]
pub struct ControllerModuleV1 {
    api_version: u32,
    describe: unsafe extern "C" fn() -> *mut c_char,
    create: unsafe extern "C" fn(*mut *mut c_char) -> *mut c_void,
    call: unsafe extern "C" fn(*mut c_void, *const c_char, *const c_char) -> *mut c_char,
    destroy: unsafe extern "C" fn(*mut c_void),
    free_string: unsafe extern "C" fn(*mut c_char),
}

struct Greeting {
    who: String,
    calls: u32,
}

fn owned(value: String) -> *mut c_char {
    CString::new(value).map(CString::into_raw).unwrap_or(std::ptr::null_mut())
}

unsafe extern "C" fn describe() -> *mut c_char {
    owned(
        r##"{"name":"com.example.Greeting","methods":[{"name":"data","returns":"map"},{"name":"set_properties","params":["properties"],"returns":"unit"}]}"##
            .to_string(),
    )
}

unsafe extern "C" fn create(_error: *mut *mut c_char) -> *mut c_void {
    Box::into_raw(Box::new(Greeting { who: "World".to_string(), calls: 0 })) as *mut c_void
}

unsafe extern "C" fn call(
    instance: *mut c_void,
    method: *const c_char,
    args: *const c_char,
) -> *mut c_char {
    let greeting = &mut *(instance as *mut Greeting);
    let method = CStr::from_ptr(method).to_string_lossy().into_owned();
    let args = CStr::from_ptr(args).to_string_lossy().into_owned();
    match method.as_str() {
        "set_properties" => {
            let marker = "\"who\":\"";
            if let Some(start) = args.find(marker) {
                let rest = &args[start + marker.len()..];
                if let Some(end) = rest.find('"') {
                    greeting.who = rest[..end].to_string();
                }
            }
            owned(r##"{"ok":null}"##.to_string())
        }
        "data" if greeting.who == "Nobody" => owned(r##"{"error":"nobody to greet"}"##.to_string()),
        "data" => {
            greeting.calls += 1;
            owned(format!(
                r##"{{"ok":[["name","{}"],["calls",{}]]}}"##,
                greeting.who, greeting.calls
            ))
        }
        other => owned(format!(r##"{{"error":"unknown method {}"}}"##, other)),
    }
}

unsafe extern "C" fn destroy(instance: *mut c_void) {
    drop(Box::from_raw(instance as *mut Greeting));
}

unsafe extern "C" fn free_string(value: *mut c_char) {
    drop(CString::from_raw(value));
}

static MODULE: ControllerModuleV1 = ControllerModuleV1 {
    api_version: 1,
    describe,
    create,
    call,
    destroy,
    free_string,
};

#[no_mangle]
pub extern "C" fn tplgen_controller_module_v1() -> *const ControllerModuleV1 {
    &MODULE
}
"###;

const TARGET: &str = "target/generated-sources/tplgen/greeting.rs";

fn manifest(who: &str) -> String {
    format!(
        r#"
[project]
source-dir = "controllers"
output-dir = "target/controllers"

[[templates]]
directory = "templates"
name = "Greeting"
target = "{TARGET}"

[templates.controller]
type = "com.example.Greeting"
method = "data"
compile = true
properties = {{ who = "{who}" }}
"#
    )
}

/// [`RustcCompiler`] that counts how often it runs.
struct CountingRustc {
    inner: RustcCompiler,
    calls: Cell<usize>,
}

impl CountingRustc {
    fn new() -> Self {
        Self {
            inner: RustcCompiler::default(),
            calls: Cell::new(0),
        }
    }
}

impl CompilerService for CountingRustc {
    fn compile(&self, request: &CompileRequest) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        self.inner.compile(request)
    }
}

fn rustc_available() -> bool {
    if which::which("rustc").is_ok() {
        true
    } else {
        eprintln!("rustc not found on PATH, skipping dynamic library controller test");
        false
    }
}

fn library_project(who: &str) -> TestProject {
    let project = TestProject::new().unwrap();
    project.write_manifest(&manifest(who)).unwrap();
    project.write_template("Greeting.st", "Hello, <name>! (<calls>)").unwrap();
    project.write("controllers/com/example/Greeting.rs", GREETING_SOURCE).unwrap();
    project
}

fn run(project: &TestProject, compiler: &dyn CompilerService) -> Result<()> {
    let manifest = project.load_manifest()?;
    let registry = ControllerRegistry::new();
    let mut context = BuildContext::from_manifest(&manifest, &ManifestResolver)?;
    Generator::new(&manifest, &registry, compiler).run(&mut context, &[])?;
    Ok(())
}

#[test]
fn test_library_controller_compiled_then_loaded() {
    if !rustc_available() {
        return;
    }
    let project = library_project("Library");
    let compiler = CountingRustc::new();

    run(&project, &compiler).unwrap();

    assert_eq!(compiler.calls.get(), 1, "missing library is compiled once");
    assert_eq!(project.read(TARGET).unwrap(), "Hello, Library! (1)");

    // The compiled library now sits in the output directory.
    project.write(TARGET, "stale").unwrap();
    run(&project, &compiler).unwrap();

    assert_eq!(compiler.calls.get(), 1, "second run loads without compiling");
    assert_eq!(project.read(TARGET).unwrap(), "Hello, Library! (1)");
}

#[test]
fn test_library_controller_error_is_invocation_failure() {
    if !rustc_available() {
        return;
    }
    let project = library_project("Nobody");
    let compiler = CountingRustc::new();

    let err = run(&project, &compiler).unwrap_err();

    match err.downcast_ref::<TplgenError>() {
        Some(TplgenError::InvocationFailure {
            type_name,
            method,
            reason,
        }) => {
            assert_eq!(type_name, "com.example.Greeting");
            assert_eq!(method, "data");
            assert!(reason.contains("nobody to greet"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!project.exists(TARGET));
}
