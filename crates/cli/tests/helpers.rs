use std::fs;
use std::path::Path;

use binsight::{absolute_path, resolve_settings, sha256_hex};
use tempfile::tempdir;

/// Digest of a known input matches the published SHA-256 test vector.
#[test]
fn sha256_hex_matches_known_digest() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

/// Empty content still produces a full-length digest.
#[test]
fn sha256_hex_of_empty_input() {
    assert_eq!(
        sha256_hex(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

/// Absolute inputs stay as given, canonicalized when they exist.
#[test]
fn absolute_path_keeps_absolute_inputs() {
    let tmp = tempdir().expect("tempdir");
    let missing = tmp.path().join("not-yet");
    assert_eq!(absolute_path(&missing).unwrap(), missing);

    let existing = tmp.path().join("here");
    fs::write(&existing, b"x").unwrap();
    assert_eq!(absolute_path(&existing).unwrap(), existing.canonicalize().unwrap());
}

/// Relative inputs are joined onto the current directory.
#[test]
fn absolute_path_joins_relative_inputs_with_cwd() {
    let result = absolute_path(Path::new("surely-missing-file.bin")).unwrap();
    assert!(result.is_absolute());
    assert!(result.ends_with("surely-missing-file.bin"));
}

/// No --config means default settings.
#[test]
fn resolve_settings_defaults_without_config() {
    let settings = resolve_settings(None).unwrap();
    assert_eq!(settings.model, "deepseek:8b");
}

/// A YAML --config is loaded.
#[test]
fn resolve_settings_reads_yaml() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("cfg.yaml");
    fs::write(&path, "model: gemma3\n").unwrap();
    let settings = resolve_settings(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(settings.model, "gemma3");
}
