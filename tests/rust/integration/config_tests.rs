//! Configuration loading from the environment and from YAML files.

use std::env;
use std::io::Write;

use graphkb::config::{ConfigError, TranslatorConfig};
use graphkb::translate;
use serial_test::serial;
use tempfile::NamedTempFile;

const VARS: &[&str] = &[
    "GRAPHKB_ASSETS_TABLE",
    "GRAPHKB_RELATIONS_TABLE",
    "GRAPHKB_OPTIMIZE_EITHER_DIRECTION",
    "GRAPHKB_KNOWN_ASSET_TYPES",
    "GRAPHKB_KNOWN_RELATION_TYPES",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_env_defaults() {
    clear_env();
    assert_eq!(TranslatorConfig::from_env().unwrap(), TranslatorConfig::default());
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    env::set_var("GRAPHKB_ASSETS_TABLE", "kb_assets");
    env::set_var("GRAPHKB_RELATIONS_TABLE", "kb_relations");
    env::set_var("GRAPHKB_OPTIMIZE_EITHER_DIRECTION", "false");
    env::set_var("GRAPHKB_KNOWN_ASSET_TYPES", "ip, domain,,org");

    let config = TranslatorConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.assets_table, "kb_assets");
    assert_eq!(config.relations_table, "kb_relations");
    assert!(!config.optimize_either_direction);
    assert_eq!(
        config.known_asset_types,
        Some(vec!["ip".to_string(), "domain".to_string(), "org".to_string()])
    );
    assert_eq!(config.known_relation_types, None);
}

#[test]
#[serial]
fn test_env_rejects_bad_values() {
    clear_env();
    env::set_var("GRAPHKB_OPTIMIZE_EITHER_DIRECTION", "sometimes");
    let flag = TranslatorConfig::from_env();
    clear_env();
    assert!(matches!(flag, Err(ConfigError::Parse { .. })));

    env::set_var("GRAPHKB_ASSETS_TABLE", "assets; DROP TABLE relations");
    let table = TranslatorConfig::from_env();
    clear_env();
    assert!(matches!(table, Err(ConfigError::Validation(_))));
}

#[test]
fn test_yaml_partial_file_keeps_defaults() {
    let file = yaml_file("assets_table: kb_assets\nknown_relation_types: [resolves, owns]\n");
    let config = TranslatorConfig::from_yaml_file(file.path()).unwrap();

    assert_eq!(config.assets_table, "kb_assets");
    assert_eq!(config.relations_table, "relations");
    assert!(config.optimize_either_direction);
    assert_eq!(
        config.known_relation_types,
        Some(vec!["resolves".to_string(), "owns".to_string()])
    );
}

#[test]
fn test_yaml_errors() {
    let missing = TranslatorConfig::from_yaml_file("/nonexistent/graphkb.yaml");
    assert!(matches!(missing, Err(ConfigError::Parse { .. })));

    let malformed = yaml_file("assets_table: [unterminated\n");
    assert!(matches!(
        TranslatorConfig::from_yaml_file(malformed.path()),
        Err(ConfigError::Parse { .. })
    ));

    let invalid = yaml_file("relations_table: \"bad-name\"\n");
    assert!(matches!(
        TranslatorConfig::from_yaml_file(invalid.path()),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_yaml_config_drives_translation() {
    let file = yaml_file(
        "assets_table: kb_assets\nrelations_table: kb_relations\noptimize_either_direction: false\n",
    );
    let config = TranslatorConfig::from_yaml_file(file.path()).unwrap();
    let translation = translate("MATCH (a)--(b) RETURN a.value", &config).unwrap();

    assert!(translation.query.contains("FROM (kb_assets a0, kb_assets a1, kb_relations r0)"));
    assert!(translation.query.contains("\nUNION ALL\n"));
}
