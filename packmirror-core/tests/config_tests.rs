//! Config persistence error-message and on-disk format tests.
//! Layout: ~/.packmirror/config.json

use assert_fs::prelude::*;
use packmirror_core::{config, AppConfig, ConfigError};
use predicates::prelude::predicate;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;

fn sample() -> AppConfig {
    AppConfig {
        gunpack_new_path: PathBuf::from("C:\\mods\\gunpack-new"),
        gunpack_old_path: PathBuf::from("C:\\mods\\gunpack-old"),
        redux_new_path: PathBuf::from("C:\\mods\\redux-new"),
        redux_old_path: PathBuf::from("C:\\mods\\redux-old"),
        target_executable_path: Some(PathBuf::from("C:\\Games\\GTAV\\GTA5.exe")),
        autostart_enabled: true,
    }
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config not found"));
    assert!(err.to_string().contains("config.json"));
}

#[rstest]
#[case(b"{ not json".as_slice())]
#[case(b"[\"a list\", \"not a record\"]".as_slice())]
#[case(b"{\"gunpackNewPath\": 42}".as_slice())]
fn load_malformed_config_returns_parse_error_with_path(#[case] contents: &[u8]) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".packmirror/config.json")
        .write_binary(contents)
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.json"));
}

// ---------------------------------------------------------------------------
// 2. On-disk format
// ---------------------------------------------------------------------------

#[test]
fn saved_record_uses_flat_camel_case_keys() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    let file = home.child(".packmirror/config.json");
    file.assert(predicate::path::exists());
    for key in [
        "gunpackNewPath",
        "gunpackOldPath",
        "reduxNewPath",
        "reduxOldPath",
        "targetExecutablePath",
        "autostartEnabled",
    ] {
        file.assert(predicate::str::contains(key));
    }
}

#[test]
fn record_without_optional_fields_loads_with_defaults() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".packmirror/config.json")
        .write_str(
            r#"{
                "gunpackNewPath": "/a",
                "gunpackOldPath": "/b",
                "reduxNewPath": "/c",
                "reduxOldPath": "/d"
            }"#,
        )
        .expect("write");

    let cfg = config::load_at(home.path()).expect("load");
    assert_eq!(cfg.gunpack_new_path, PathBuf::from("/a"));
    assert!(cfg.target_executable_path.is_none());
    assert!(!cfg.autostart_enabled);
}

#[test]
fn save_overwrites_previous_record() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut cfg = sample();
    config::save_at(home.path(), &cfg).expect("first save");
    cfg.autostart_enabled = false;
    config::save_at(home.path(), &cfg).expect("second save");

    let loaded = config::load_at(home.path()).expect("load");
    assert!(!loaded.autostart_enabled);

    let entries: Vec<_> = fs::read_dir(home.path().join(".packmirror"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["config.json".to_string()]);
}
