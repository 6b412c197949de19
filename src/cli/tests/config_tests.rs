use clap::Parser;
use std::path::{Path, PathBuf};

use super::args::{CliArgs, ColorChoice};
use super::config::{
    ConfigValue, DEFAULT_OUT_DIR, PROJECT_FILE, parse_project_config, resolve_settings,
};

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create test directory");
    }
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

fn args(argv: &[&str]) -> CliArgs {
    let mut full = vec!["cinderc"];
    full.extend_from_slice(argv);
    CliArgs::try_parse_from(full).expect("test args should parse")
}

#[test]
fn parses_commented_project_file() {
    let input = r#"
    {
      // inputs relative to this file
      "inputs": ["a.json", "b.json",],
      "outDir": "gen", /* inline */
      "noBuild": "true",
      "configs": { "limit": 3, "verbose": true, "name": "x // y" },
    }
    "#;

    let config = parse_project_config(input).expect("should parse commented JSON");
    assert_eq!(
        config.inputs,
        Some(vec!["a.json".to_string(), "b.json".to_string()])
    );
    assert_eq!(config.out_dir.as_deref(), Some("gen"));
    assert_eq!(config.no_build, Some(true));
    let configs = config.configs.expect("configs missing");
    assert_eq!(configs.get("limit"), Some(&ConfigValue::Int(3)));
    assert_eq!(configs.get("verbose"), Some(&ConfigValue::Bool(true)));
    assert_eq!(configs.get("name").map(ConfigValue::as_override).as_deref(), Some("x // y"));
}

#[test]
fn rejects_unknown_project_keys_and_bad_booleans() {
    assert!(parse_project_config(r#"{ "outdir": "gen" }"#).is_err());
    assert!(parse_project_config(r#"{ "noBuild": "maybe" }"#).is_err());
}

#[test]
fn defaults_without_project_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = resolve_settings(&args(&["m.json"]), dir.path()).unwrap();

    assert_eq!(settings.options.inputs, vec![dir.path().join("m.json")]);
    assert_eq!(settings.options.out_dir, Some(dir.path().join(DEFAULT_OUT_DIR)));
    assert_eq!(settings.options.cc, cinder_passes::DEFAULT_CC);
    assert!(!settings.options.no_build);
    assert!(settings.options.config_overrides.is_empty());
    assert!(settings.passlist.is_none());
    assert_eq!(settings.color, ColorChoice::Auto);
}

#[test]
fn project_file_in_working_directory_is_used() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        PROJECT_FILE,
        r#"{
          "inputs": ["src/m.json"],
          "outDir": "build",
          "passlist": "passes.txt",
          "cc": "clang",
          "genCommunicatedStructures": true,
          "configs": { "limit": 3, "tint": "green" }
        }"#,
    );
    let settings = resolve_settings(&args(&[]), dir.path()).unwrap();

    assert_eq!(settings.options.inputs, vec![dir.path().join("src/m.json")]);
    assert_eq!(settings.options.out_dir, Some(dir.path().join("build")));
    assert_eq!(settings.passlist, Some(dir.path().join("passes.txt")));
    assert_eq!(settings.options.cc, "clang");
    assert!(settings.options.gen_communicated_structures);
    let overrides: Vec<_> = settings
        .options
        .config_overrides
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(overrides, vec![("limit", "3"), ("tint", "green")]);
}

#[test]
fn command_line_overrides_project_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_file(
        dir.path(),
        "proj/cinder.json",
        r#"{ "inputs": ["m.json"], "outDir": "build", "cc": "clang", "configs": { "limit": 3 } }"#,
    );
    let settings = resolve_settings(
        &args(&[
            "--config",
            config.to_str().unwrap(),
            "-o",
            "out",
            "--cc",
            "gcc",
            "-s",
            "limit=5",
            "-s",
            "verbose",
            "other.json",
        ]),
        dir.path(),
    )
    .unwrap();

    assert_eq!(settings.options.inputs, vec![dir.path().join("other.json")]);
    assert_eq!(settings.options.out_dir, Some(dir.path().join("out")));
    assert_eq!(settings.options.cc, "gcc");
    assert_eq!(
        settings.options.config_overrides.get("limit").map(String::as_str),
        Some("5")
    );
    assert_eq!(
        settings.options.config_overrides.get("verbose").map(String::as_str),
        Some("true")
    );
}

#[test]
fn missing_explicit_project_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve_settings(&args(&["--config", "nope.json"]), dir.path()).unwrap_err();
    assert!(err.to_string().contains("failed to read project file"));
}
