use crate::coordinate::ModuleCoordinate;
use crate::environment::{Style, Tier};
use crate::types::CartridgeName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A first-party module with its declared dependencies, split into other
/// first-party modules and third-party library coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeDescriptor {
    pub name: CartridgeName,
    pub style: Style,
    #[serde(default)]
    pub depends_on: BTreeSet<CartridgeName>,
    #[serde(default)]
    pub depends_on_libs: BTreeSet<ModuleCoordinate>,
}

impl CartridgeDescriptor {
    pub fn new(name: impl Into<CartridgeName>, style: Style) -> Self {
        Self {
            name: name.into(),
            style,
            depends_on: BTreeSet::new(),
            depends_on_libs: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_lib(mut self, coordinate: ModuleCoordinate) -> Self {
        self.depends_on_libs.insert(coordinate);
        self
    }

    /// Whether `tier` deploys this module.
    pub fn deployed_in(&self, tier: Tier) -> bool {
        tier.accepts(self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_libs_deduplicated() {
        let d = CartridgeDescriptor::new("app_core", Style::Cartridge)
            .with_lib(ModuleCoordinate::new("g", "n", "1.0"))
            .with_lib(ModuleCoordinate::new("g", "n", "1.0"));
        assert_eq!(d.depends_on_libs.len(), 1);
        assert!(d.depends_on.is_empty());
    }

    #[test]
    fn deployment_follows_style() {
        let d = CartridgeDescriptor::new("test_support", Style::Test);
        assert!(!d.deployed_in(Tier::Production));
        assert!(d.deployed_in(Tier::Test));
        assert!(d.deployed_in(Tier::Development));
    }

    #[test]
    fn serde_roundtrip() {
        let d = CartridgeDescriptor::new("app_core", Style::Adapter)
            .with_lib(ModuleCoordinate::new("org.slf4j", "slf4j-api", "2.0.9"));
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"org.slf4j:slf4j-api:2.0.9\""));
        let back: CartridgeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
