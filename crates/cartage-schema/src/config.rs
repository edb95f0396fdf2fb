use crate::coordinate::CoordinateError;
use crate::environment::Style;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported config_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("invalid module name '{0}'")]
    InvalidModuleName(String),
    #[error("module '{0}' is declared more than once")]
    DuplicateModule(String),
    #[error("module '{module}': {source}")]
    InvalidDependency {
        module: String,
        #[source]
        source: CoordinateError,
    },
    #[error("cartridge_list.{field}: {source}")]
    InvalidListReference {
        field: &'static str,
        #[source]
        source: CoordinateError,
    },
    #[error("metadata.repositories entry must not be empty")]
    EmptyRepository,
    #[error("metadata.timeout_secs must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfigV1 {
    pub config_version: u32,
    #[serde(default)]
    pub metadata: MetadataSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub baseline: BaselineSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cartridge_list: Option<CartridgeListSection>,
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetadataSection {
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MetadataSection {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Baseline (platform-provided) library lists per tier.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BaselineSection {
    #[serde(default)]
    pub production: Vec<String>,
    #[serde(default)]
    pub test: Vec<String>,
    #[serde(default)]
    pub development: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CartridgeListSection {
    pub template: String,
    pub output: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub dbinit: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModuleSection {
    pub name: String,
    pub style: Style,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_output_dir() -> String {
    "build/cartage".to_owned()
}

pub fn parse_config_str(input: &str) -> Result<ProjectConfigV1, ConfigError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<ProjectConfigV1, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let input = r#"
config_version = 1

[metadata]
repositories = ["https://repo.example.com/releases", "./local-repo"]
timeout_secs = 5

[output]
dir = "out"

[baseline]
production = ["platform/production.txt"]

[cartridge_list]
template = "cartridgelist.properties"
output = "out/cartridgelist.properties"
include = ["app_core"]
dbinit = ["app_core"]

[[module]]
name = "app_core"
style = "cartridge"
dependencies = ["com.google.guava:guava:31.1-jre", "app_base"]

[[module]]
name = "app_base"
style = "ALL"
"#;
        let config = parse_config_str(input).expect("should parse");
        assert_eq!(config.config_version, 1);
        assert_eq!(config.metadata.repositories.len(), 2);
        assert_eq!(config.metadata.timeout_secs, 5);
        assert_eq!(config.output.dir, "out");
        assert_eq!(config.baseline.production, vec!["platform/production.txt"]);
        assert!(config.baseline.test.is_empty());
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules[0].style, Style::Cartridge);
        assert_eq!(config.modules[1].style, Style::All);
        assert!(config.cartridge_list.is_some());
    }

    #[test]
    fn parses_minimal_config() {
        let config = parse_config_str("config_version = 1\n").expect("should parse");
        assert!(config.modules.is_empty());
        assert_eq!(config.metadata.timeout_secs, 10);
        assert_eq!(config.output.dir, "build/cartage");
        assert!(config.cartridge_list.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = r#"
config_version = 1

[[module]]
name = "app_core"
style = "cartridge"
unknown_field = true
"#;
        assert!(parse_config_str(input).is_err());
    }

    #[test]
    fn rejects_unknown_style() {
        let input = r#"
config_version = 1

[[module]]
name = "app_core"
style = "library"
"#;
        let err = parse_config_str(input).unwrap_err();
        assert!(err.to_string().contains("library"));
    }

    #[test]
    fn rejects_missing_version() {
        assert!(parse_config_str("[output]\ndir = \"x\"\n").is_err());
    }
}
