//! Binary-level tests for `tplgen`.

use assert_cmd::Command;
use predicates::prelude::*;
use tplgen_cli::test_utils::{GREETING_MANIFEST, TestProject};

fn tplgen() -> Command {
    let mut cmd = Command::cargo_bin("tplgen").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

const MISSING_CONTROLLER: &str = r#"
[[templates]]
directory = "templates"
name = "Greeting"
target = "out/greeting.txt"

[templates.controller]
type = "com.example.Greeting"
method = "data"
compile = false
"#;

#[test]
fn test_render_missing_controller_exits_with_failure() {
    let project = TestProject::greeting().unwrap();
    project.write_manifest(MISSING_CONTROLLER).unwrap();

    tplgen()
        .current_dir(project.path())
        .arg("render")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "The class com.example.Greeting is not in the classpath, and compilation is not enabled",
        ));

    assert!(!project.exists("out/greeting.txt"));
}

#[test]
fn test_render_without_controller_uses_properties() {
    let project = TestProject::greeting().unwrap();
    project
        .write_manifest(
            r#"
[[templates]]
directory = "templates"
name = "Greeting"
target = "target/generated-sources/tplgen/greeting.rs"
properties = { name = "Static" }
"#,
        )
        .unwrap();

    tplgen()
        .current_dir(project.path())
        .arg("render")
        .assert()
        .success()
        .stdout(predicate::str::contains("Greeting"))
        .stdout(predicate::str::contains("compile source root"));

    assert_eq!(project.read("target/generated-sources/tplgen/greeting.rs").unwrap(), "Hello, Static!");
}

#[test]
fn test_render_json_report() {
    let project = TestProject::greeting().unwrap();
    project
        .write_manifest(
            r#"
[[templates]]
directory = "templates"
name = "Greeting"
target = "out/greeting.txt"
"#,
        )
        .unwrap();

    let output = tplgen()
        .current_dir(project.path())
        .args(["--quiet", "render", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["units"][0]["name"], "Greeting");
    assert_eq!(report["compile_source_roots"], serde_json::json!([]));
}

#[test]
fn test_validate_valid_manifest() {
    let project = TestProject::greeting().unwrap();

    tplgen()
        .current_dir(project.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid tplgen.toml"));
}

#[test]
fn test_validate_resolve_reports_missing_controller() {
    let project = TestProject::greeting().unwrap();

    tplgen()
        .current_dir(project.path())
        .args(["validate", "--resolve"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("com.example.Greeting"));
}

#[test]
fn test_validate_missing_template_json() {
    let project = TestProject::new().unwrap();
    project.write_manifest(GREETING_MANIFEST).unwrap();

    let output = tplgen()
        .current_dir(project.path())
        .args(["validate", "--format", "json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results["valid"], false);
    assert_eq!(results["manifest_valid"], true);
    assert_eq!(results["templates_valid"], false);
    assert!(results["errors"][0].as_str().unwrap().contains("Template 'Greeting' not found"));
}

#[test]
fn test_validate_rejects_unknown_keys() {
    let project = TestProject::new().unwrap();
    project.write_manifest("[project]\nout-dir = \"x\"\n").unwrap();

    tplgen()
        .current_dir(project.path())
        .arg("validate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("tplgen.toml"));
}

#[test]
fn test_list_shows_units() {
    let project = TestProject::greeting().unwrap();

    tplgen()
        .current_dir(project.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Greeting"))
        .stdout(predicate::str::contains("com.example.Greeting.data"));
}

#[test]
fn test_no_manifest_fails() {
    let project = TestProject::new().unwrap();

    tplgen()
        .current_dir(project.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tplgen.toml not found"));
}

#[test]
fn test_explicit_manifest_path() {
    let project = TestProject::greeting().unwrap();
    let elsewhere = TestProject::new().unwrap();

    tplgen()
        .current_dir(elsewhere.path())
        .arg("--manifest-path")
        .arg(project.manifest_path())
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Greeting\""));
}
