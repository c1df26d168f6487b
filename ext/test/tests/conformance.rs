//! Conformance tests that run YAML fixtures against veil
//!
//! Run with: cargo test -p veil-test --test conformance --features veil-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use std::fs;
use std::path::{Path, PathBuf};
use veil_test::fixture::Fixture;

/// Fixtures live next to this crate's manifest
fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run every fixture in a file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    assert!(path.exists(), "Fixture file does not exist: {}", path.display());

    println!("Running fixture file: {}", path.display());
    let yaml = fs::read_to_string(&path).expect("read yaml");

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.display(), e);
    });
    assert!(!fixtures.is_empty(), "{} holds no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_levels() {
    run_fixture_file("01_levels.yaml");
}

#[test]
fn test_field_rules() {
    run_fixture_file("02_field_rules.yaml");
}

#[test]
fn test_arrays() {
    run_fixture_file("03_arrays.yaml");
}

#[test]
fn test_minimize() {
    run_fixture_file("04_minimize.yaml");
}

#[test]
fn test_errors() {
    run_fixture_file("05_errors.yaml");
}

#[test]
fn test_all_files_covered() {
    let mut names: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".yaml") || name.ends_with(".yml"))
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "01_levels.yaml",
            "02_field_rules.yaml",
            "03_arrays.yaml",
            "04_minimize.yaml",
            "05_errors.yaml"
        ]
    );
}
