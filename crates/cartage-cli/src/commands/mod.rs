pub mod check;
pub mod classify;
pub mod completions;
pub mod extend;
pub mod manifests;
pub mod tiers;

use cartage_core::Engine;
use cartage_schema::Tier;
use std::path::Path;
use tracing::debug;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_VERSION_CONFLICT: u8 = 3;
pub const EXIT_MANIFEST_DRIFT: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn load_engine(config: &Path) -> Result<Engine, String> {
    debug!("loading project configuration from {}", config.display());
    Engine::from_config_file(config).map_err(|e| e.to_string())
}

pub fn colorize_tier(tier: Tier) -> String {
    use console::Style;
    let name = tier.as_str();
    match tier {
        Tier::Production => Style::new().green().bold().apply_to(name).to_string(),
        Tier::Test => Style::new().yellow().apply_to(name).to_string(),
        Tier::Development => Style::new().cyan().apply_to(name).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_tier() {
        let result = json_pretty(&Tier::Production).unwrap();
        assert_eq!(result, "\"production\"");
    }

    #[test]
    fn json_pretty_serializes_array() {
        let result = json_pretty(&vec![Tier::Test, Tier::Development]).unwrap();
        assert!(result.contains("\"development\""));
    }

    #[test]
    fn colorize_tier_keeps_name() {
        for tier in Tier::ORDERED {
            assert!(colorize_tier(tier).contains(tier.as_str()));
        }
    }

    #[test]
    fn missing_config_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_engine(&dir.path().join("cartage.toml")).err().unwrap();
        assert!(err.starts_with("configuration error:"), "{err}");
    }
}
