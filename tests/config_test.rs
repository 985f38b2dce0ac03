//! Integration tests for Settings loading with layered precedence.
//!
//! These tests run without a global config (temp files only), so the explicit
//! file is layered directly over the compiled defaults.

use std::fs;

use tempfile::TempDir;

use treestate::application::{EngineOptions, TreeEngine};
use treestate::config::{IconSettings, Settings};
use treestate::domain::{NodeSpec, SelectionMode};

#[test]
fn given_explicit_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("treestate.toml");
    fs::write(
        &path,
        r#"
selection_mode = "multiple"

[icons]
leaf = "-"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    // Assert
    assert_eq!(settings.selection_mode, SelectionMode::Multiple);
    assert_eq!(settings.icons.leaf, "-");
    assert_eq!(
        settings.icons.collapsed,
        IconSettings::default().collapsed,
        "unspecified icons keep their defaults"
    );
}

#[test]
fn given_missing_explicit_config_when_load_then_error() {
    let dir = TempDir::new().unwrap();
    let result = Settings::load(Some(dir.path().join("absent.toml").as_path()));
    assert!(result.is_err());
}

#[test]
fn given_malformed_config_when_load_then_error_names_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "selection_mode = [").unwrap();

    let err = Settings::load(Some(path.as_path())).unwrap_err();

    assert!(err.to_string().contains("bad.toml"), "got: {err}");
}

#[test]
fn given_env_override_when_load_then_env_wins_over_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("treestate.toml");
    fs::write(&path, "[icons]\nloading = \"wait\"\n").unwrap();

    std::env::set_var("TREESTATE_ICONS__LOADING", "spin");
    let settings = Settings::load(Some(path.as_path()));
    std::env::remove_var("TREESTATE_ICONS__LOADING");

    assert_eq!(settings.unwrap().icons.loading, "spin");
}

#[test]
fn given_settings_when_building_engine_then_mode_applied() {
    let settings = Settings::from_toml_str("selection_mode = \"multiple\"\n").unwrap();
    let mut engine = TreeEngine::with_settings(
        vec![NodeSpec::new("a", "A"), NodeSpec::new("b", "B")],
        &settings,
    )
    .unwrap();

    engine.select("a").unwrap();
    engine.select("b").unwrap();

    assert_eq!(engine.selection_mode(), SelectionMode::Multiple);
    assert_eq!(engine.selected_ids(), vec!["a", "b"]);
    assert_eq!(EngineOptions::from(&settings).icons, settings.icons);
}

#[test]
fn given_template_when_written_and_loaded_then_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("treestate.toml");
    fs::write(&path, Settings::template()).unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();

    assert_eq!(settings.selection_mode, Settings::default().selection_mode);
    assert_eq!(settings.icons.leaf, Settings::default().icons.leaf);
}
