//! CLI smoke tests.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sift_cmd(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sift").unwrap();
    cmd.arg("--db").arg(temp.path().join("idx"));
    cmd
}

#[test]
fn add_then_search() {
    let temp = TempDir::new().unwrap();
    let doc = temp.path().join("guia.md");
    fs::write(&doc, "# Guía del Mediterráneo\n\nUn resumen breve.\n").unwrap();

    sift_cmd(&temp)
        .arg("add")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("indexed 1"));

    sift_cmd(&temp)
        .arg("search")
        .arg("mediterraneo")
        .arg("--count")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mediterráneo"))
        .stdout(predicate::str::contains("1 matching document(s)"));
}

#[test]
fn search_json_output() {
    let temp = TempDir::new().unwrap();
    let doc = temp.path().join("doc.md");
    fs::write(&doc, "# Alpha\n\nbeta gamma.\n").unwrap();

    sift_cmd(&temp).arg("add").arg(&doc).assert().success();

    sift_cmd(&temp)
        .arg("--json")
        .arg("search")
        .arg("beta")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"section_type\""))
        .stdout(predicate::str::contains("\"document_path\""));
}

#[test]
fn stats_and_clear() {
    let temp = TempDir::new().unwrap();
    let doc = temp.path().join("doc.md");
    fs::write(&doc, "# Alpha\n\ntexto.\n").unwrap();

    sift_cmd(&temp)
        .arg("add")
        .arg(&doc)
        .arg("--tag")
        .arg("manual")
        .assert()
        .success();

    sift_cmd(&temp)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("documents: 1"))
        .stdout(predicate::str::contains("#manual: 1"));

    sift_cmd(&temp).arg("clear").assert().success();

    sift_cmd(&temp)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("documents: 0"));
}

#[test]
fn missing_input_fails() {
    let temp = TempDir::new().unwrap();
    sift_cmd(&temp)
        .arg("add")
        .arg("/definitely/not/there.md")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input not found"));
}

#[test]
fn search_empty_index_reports_no_results() {
    let temp = TempDir::new().unwrap();
    sift_cmd(&temp)
        .arg("search")
        .arg("nada")
        .assert()
        .success()
        .stdout(predicate::str::contains("no results"));
}
