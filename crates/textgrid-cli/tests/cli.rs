//! Integration tests for the `textgrid` binary, driven through the actual
//! process boundary rather than calling the library directly.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn textgrid() -> Command {
    Command::cargo_bin("textgrid").unwrap()
}

#[test]
fn textlayout_reconstructs_a_single_block() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Invoice date 2024-01-01    Due date 2024-02-01").unwrap();

    textgrid()
        .arg("textlayout")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoice date"))
        .stdout(predicate::str::contains("Due date"));
}

#[test]
fn textlayout_writes_output_file() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    writeln!(input, "A: 1\nBB: 2\nCCC: 3").unwrap();
    let output = tempfile::NamedTempFile::new().unwrap();

    textgrid()
        .arg("textlayout")
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote layout"));

    let written = std::fs::read_to_string(output.path()).unwrap();
    assert!(written.contains("A:"));
}

#[test]
fn textlayout_fails_on_missing_file() {
    textgrid()
        .arg("textlayout")
        .arg("/no/such/file.txt")
        .assert()
        .failure();
}

#[test]
fn parse_extracts_fields_from_a_single_variant() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default.txt");
    std::fs::write(
        &path,
        "Invoice #INV-12345\nInvoice date 2024-06-01\nTotal amount 1 200,00 SEK\nMoms 240,00\n",
    )
    .unwrap();

    textgrid()
        .arg("parse")
        .arg(&path)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-12345"))
        .stdout(predicate::str::contains("SEK"));
}

#[test]
fn parse_dto_flattens_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default.txt");
    std::fs::write(&path, "Receipt from Acme Tech PBC\nAmount due $14.68\n").unwrap();

    textgrid()
        .arg("parse")
        .arg(&path)
        .arg("--format")
        .arg("json")
        .arg("--dto")
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn parse_requires_at_least_one_input_or_email() {
    textgrid()
        .arg("parse")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one text variant"));
}
