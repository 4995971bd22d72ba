//! End-to-end tests for the `renpy-grammar` binary.
#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;

const GRAMMAR_JSON: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/grammar.json");

fn cli() -> Command {
    Command::cargo_bin("renpy-grammar").unwrap()
}

#[test]
fn test_pack_then_inspect() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("renpy.grammar");

    cli()
        .args([GRAMMAR_JSON, "--pack", "--output"])
        .arg(&artifact)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));
    assert!(artifact.exists());

    cli()
        .arg(&artifact)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: renpy"))
        .stdout(predicate::str::contains("start rule: source_file"))
        .stdout(predicate::str::contains("symbols: 101"));
}

#[test]
fn test_packed_artifact_matches_bundled() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("renpy.grammar");

    cli()
        .args([GRAMMAR_JSON, "--pack", "-o"])
        .arg(&artifact)
        .assert()
        .success();

    let packed = std::fs::read(&artifact).unwrap();
    assert_eq!(packed, renpy_grammar::BUNDLED_ARTIFACT);
}

#[test]
fn test_strict_inspect_fails_on_unused_rules() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("renpy.grammar");
    std::fs::write(&artifact, renpy_grammar::BUNDLED_ARTIFACT).unwrap();

    cli()
        .arg(&artifact)
        .arg("--strict")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("strict mode rejected grammar"));
}

#[test]
fn test_config_file_enables_strict_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("loader.json");
    std::fs::write(&config, r#"{"strict": true}"#).unwrap();
    let output = dir.path().join("out.grammar");

    cli()
        .args([GRAMMAR_JSON, "--pack", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("refusing to pack 'renpy'"));
    assert!(!output.exists());
}

#[test]
fn test_inspect_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("garbage.grammar");
    std::fs::write(&artifact, b"definitely not a grammar").unwrap();

    cli()
        .arg(&artifact)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bad magic"));
}

#[test]
fn test_inspect_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    cli()
        .arg(dir.path().join("absent.grammar"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_pack_defaults_output_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grammar.json");
    std::fs::copy(GRAMMAR_JSON, &input).unwrap();

    cli().arg(&input).arg("--pack").assert().code(0);

    let artifact = dir.path().join("grammar.grammar");
    assert!(artifact.exists());
    cli()
        .arg(&artifact)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("name: renpy"));
}

#[test]
fn test_missing_input_is_an_argument_error() {
    cli().assert().code(2).stderr(predicate::str::starts_with("error:"));
}
