use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use richdoc_cli::ExitCode;
use richdoc_test_support::{sample_document, write_document, SAMPLE_MARKDOWN};
use serde_json::Value;
use tempfile::TempDir;

fn richdoc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("richdoc").expect("binary");
    cmd.current_dir(dir);
    cmd
}

fn setup_markdown(dir: &Path) -> PathBuf {
    let path = dir.join("doc.md");
    fs::write(&path, SAMPLE_MARKDOWN).expect("write sample");
    path
}

fn setup_payload(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write payload");
    path
}

#[test]
fn outline_lists_markdown_headings() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());

    richdoc(temp.path())
        .args(["outline", "doc.md"])
        .assert()
        .success()
        .stdout("# Overview\n  ## Details\n# Usage\n");
}

#[test]
fn outline_json_reads_native_documents() {
    let temp = TempDir::new().expect("tempdir");
    write_document(temp.path(), "doc.json", &sample_document()).expect("write doc");

    let output = richdoc(temp.path())
        .args(["--format", "json", "outline", "doc.json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(value["command"], "outline");
    let headings = value["headings"].as_array().expect("headings");
    assert_eq!(headings.len(), 3);
    assert_eq!(headings[1]["text"], "Details");
    assert_eq!(headings[1]["level"], 2);
}

#[test]
fn section_prints_nested_paragraphs() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());

    richdoc(temp.path())
        .args(["section", "doc.md", "^overview$"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Overview"))
        .stdout(predicate::str::contains("[1] Each block has a stable id."))
        .stdout(predicate::str::contains("[3] Undo restores whole snapshots."));
}

#[test]
fn section_not_found_lists_candidates() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());

    richdoc(temp.path())
        .args(["section", "doc.md", "^Missing$"])
        .assert()
        .failure()
        .code(ExitCode::NotFound.code())
        .stderr(predicate::str::contains("Candidate headings:"))
        .stderr(predicate::str::contains("  - Usage"));
}

#[test]
fn invalid_pattern_is_an_argument_error() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());

    richdoc(temp.path())
        .args(["section", "doc.md", "(unclosed"])
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments.code())
        .stderr(predicate::str::contains("Failed to compile pattern"));
}

#[test]
fn missing_document_is_an_io_error() {
    let temp = TempDir::new().expect("tempdir");

    richdoc(temp.path())
        .args(["outline", "absent.md"])
        .assert()
        .failure()
        .code(ExitCode::Io.code());
}

#[test]
fn apply_dry_run_prints_diff_without_writing() {
    let temp = TempDir::new().expect("tempdir");
    let doc = setup_markdown(temp.path());
    setup_payload(
        temp.path(),
        "ops.json",
        r#"[{"type": "insert_paragraph", "payload": {"after": null, "text": "Draft banner"}}]"#,
    );

    richdoc(temp.path())
        .args(["apply", "doc.md", "--ops", "ops.json", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 1 op(s)"))
        .stdout(predicate::str::contains("+Draft banner"));

    assert_eq!(fs::read_to_string(doc).unwrap(), SAMPLE_MARKDOWN);
}

#[test]
fn apply_rejects_malformed_ops() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());
    setup_payload(temp.path(), "ops.json", r#"[{"type": "explode"}]"#);

    richdoc(temp.path())
        .args(["apply", "doc.md", "--ops", "ops.json"])
        .assert()
        .failure()
        .code(ExitCode::InvalidContent.code());
}

#[test]
fn reconcile_expand_applies_and_keeps_backup() {
    let temp = TempDir::new().expect("tempdir");
    let doc = setup_markdown(temp.path());
    setup_payload(
        temp.path(),
        "model.json",
        r#"[
            {"index": 0, "text": "Run the outline command first."},
            {"index": 1, "text": "Then reconcile a section."}
        ]"#,
    );

    richdoc(temp.path())
        .args([
            "reconcile",
            "doc.md",
            "^Usage$",
            "--with",
            "model.json",
            "--intent",
            "expand_section",
            "--apply",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 op(s) (expand):"))
        .stdout(predicate::str::contains("Then reconcile a section."))
        .stdout(predicate::str::contains("Wrote"));

    let updated = fs::read_to_string(&doc).unwrap();
    assert!(updated.ends_with(
        "# Usage\n\nRun the outline command first.\n\nThen reconcile a section.\n"
    ));
    assert_eq!(
        fs::read_to_string(temp.path().join("doc.md.bak")).unwrap(),
        SAMPLE_MARKDOWN
    );
}

#[test]
fn reconcile_without_apply_leaves_document_alone() {
    let temp = TempDir::new().expect("tempdir");
    let doc = setup_markdown(temp.path());
    setup_payload(
        temp.path(),
        "model.json",
        r#"[{"index": 0, "text": "Start with the outline."}]"#,
    );

    richdoc(temp.path())
        .args(["reconcile", "doc.md", "^Usage$", "--with", "model.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("replace [0] Start with the outline."));

    assert_eq!(fs::read_to_string(doc).unwrap(), SAMPLE_MARKDOWN);
    assert!(!temp.path().join("doc.md.bak").exists());
}

#[test]
fn strict_reconcile_rejects_non_array_output() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());
    setup_payload(temp.path(), "model.json", r#"{"text": "not a list"}"#);

    richdoc(temp.path())
        .args([
            "reconcile",
            "doc.md",
            "^Usage$",
            "--with",
            "model.json",
            "--mode",
            "summarize",
            "--strict",
        ])
        .assert()
        .failure()
        .code(ExitCode::Validation.code())
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn reconcile_requires_a_single_section() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());
    setup_payload(temp.path(), "model.json", "[]");

    richdoc(temp.path())
        .args(["reconcile", "doc.md", "e", "--with", "model.json"])
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments.code())
        .stderr(predicate::str::contains("matched 3 sections"));
}

#[test]
fn repair_fills_missing_paragraphs_from_section() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());
    setup_payload(
        temp.path(),
        "model.json",
        r#"[{"index": 0, "text": "Blocks everywhere."}]"#,
    );

    richdoc(temp.path())
        .args(["repair", "doc.md", "^Overview$", "--with", "model.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept original text at 1, 2, 3"))
        .stdout(predicate::str::contains("[0] Blocks everywhere."))
        .stdout(predicate::str::contains("[1] Each block has a stable id."));
}

#[test]
fn import_then_export_restores_markdown() {
    let temp = TempDir::new().expect("tempdir");
    setup_markdown(temp.path());

    richdoc(temp.path())
        .args(["import", "doc.md", "-o", "doc.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote doc.json"));

    let native: Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("doc.json")).unwrap())
            .expect("native json");
    assert!(native.is_object());

    richdoc(temp.path())
        .args(["export", "doc.json"])
        .assert()
        .success()
        .stdout(SAMPLE_MARKDOWN);
}
