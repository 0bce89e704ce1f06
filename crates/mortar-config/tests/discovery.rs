//! Tests for config file discovery and loading

use mortar_config::{ConfigDiscovery, ConfigError, ConfigSource, PluginDescriptor};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn discovers_package_json_field() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{
  "name": "app",
  "postcss": {
    "plugins": { "lightningcss": { "targets": ["chrome 100"] } },
    "options": { "excludedPackages": ["acme:legacy"] }
  }
}"#,
    )
    .unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    assert_eq!(discovery.find().unwrap().unwrap().file_name().unwrap(), "package.json");

    let config = discovery.load().unwrap().unwrap();
    assert_eq!(
        config.plugins,
        vec![PluginDescriptor::new("lightningcss").with_options(json!({ "targets": ["chrome 100"] }))]
    );
    assert_eq!(config.excluded_packages, vec!["acme:legacy"]);
}

#[test]
fn discovers_postcssrc_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".postcssrc.json"),
        r#"{ "plugins": ["a", "b"], "options": { "parser": "scss" } }"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap().unwrap();
    let names: Vec<&str> = config.plugins.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(config.parser.as_deref(), Some("scss"));
}

#[test]
fn discovers_toml_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("postcss.config.toml"),
        r#"
rewriteUrls = true

[[plugins]]
name = "lightningcss"

[options]
excludedPackages = ["my:pkg"]
maxSelectorsPerChunk = 4095
"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap().unwrap();
    assert_eq!(config.plugins[0].name, "lightningcss");
    assert!(config.rewrite_urls);
    assert_eq!(config.excluded_packages, vec!["my:pkg"]);
    assert_eq!(config.max_selectors_per_chunk, Some(4095));
}

#[test]
fn package_json_takes_precedence() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{ "postcss": { "plugins": ["from-package"] } }"#,
    )
    .unwrap();
    fs::write(dir.path().join(".postcssrc"), r#"{ "plugins": ["from-rc"] }"#).unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap().unwrap();
    assert_eq!(config.plugins[0].name, "from-package");
}

#[test]
fn missing_config_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(ConfigDiscovery::new(dir.path()).load().unwrap().is_none());
}

#[test]
fn malformed_config_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".postcssrc.json"), "{ plugins: ").unwrap();

    let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => {
            assert_eq!(path.file_name().unwrap(), ".postcssrc.json")
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn malformed_package_json_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), r#"{ "name": "app", "#).unwrap();
    fs::write(dir.path().join(".postcssrc"), r#"{ "plugins": ["a"] }"#).unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    match discovery.load().unwrap_err() {
        ConfigError::Parse { path, .. } => assert_eq!(path.file_name().unwrap(), "package.json"),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(discovery.find().is_err());
}

#[test]
fn wrong_field_types_are_a_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".postcssrc"),
        r#"{ "options": { "excludedPackages": "not-a-list" } }"#,
    )
    .unwrap();

    assert!(matches!(
        ConfigDiscovery::new(dir.path()).load(),
        Err(ConfigError::Parse { .. })
    ));
}
