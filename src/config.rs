use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

use crate::sql_generator::SQL_IDENTIFIER;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Translator configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Table holding one row per asset: (id, value, type)
    #[validate(regex(path = *SQL_IDENTIFIER, message = "Assets table must be a plain SQL identifier"))]
    pub assets_table: String,

    /// Table holding one row per relation: (id, from_id, to_id, type)
    #[validate(regex(path = *SQL_IDENTIFIER, message = "Relations table must be a plain SQL identifier"))]
    pub relations_table: String,

    /// Scan a lone untyped either-direction relation in one direction only
    pub optimize_either_direction: bool,

    /// When set, node labels must be one of these asset types
    pub known_asset_types: Option<Vec<String>>,

    /// When set, relationship labels must be one of these relation types
    pub known_relation_types: Option<Vec<String>>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            assets_table: "assets".to_string(),
            relations_table: "relations".to_string(),
            optimize_either_direction: true,
            known_asset_types: None,
            known_relation_types: None,
        }
    }
}

impl TranslatorConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            assets_table: env::var("GRAPHKB_ASSETS_TABLE").unwrap_or_else(|_| "assets".to_string()),
            relations_table: env::var("GRAPHKB_RELATIONS_TABLE")
                .unwrap_or_else(|_| "relations".to_string()),
            optimize_either_direction: parse_env_var("GRAPHKB_OPTIMIZE_EITHER_DIRECTION", "true")?,
            known_asset_types: parse_env_list("GRAPHKB_KNOWN_ASSET_TYPES"),
            known_relation_types: parse_env_list("GRAPHKB_KNOWN_RELATION_TYPES"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            assets_table: cli.assets_table,
            relations_table: cli.relations_table,
            optimize_either_direction: cli.optimize_either_direction,
            known_asset_types: None,
            known_relation_types: None,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of a file or environment configuration.
    /// Type registries are kept since the CLI cannot set them.
    pub fn merge(&mut self, cli: CliConfig) {
        self.assets_table = cli.assets_table;
        self.relations_table = cli.relations_table;
        self.optimize_either_direction = cli.optimize_either_direction;
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub assets_table: String,
    pub relations_table: String,
    pub optimize_either_direction: bool,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

/// Comma separated list, absent when the variable is unset.
fn parse_env_list(key: &str) -> Option<Vec<String>> {
    env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}
