use crate::MetadataError;
use cartage_schema::ModuleCoordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property whose presence marks a first-party module; its value is the
/// module's local name.
pub const CARTRIDGE_NAME_PROPERTY: &str = "cartridge.name";
/// Optional property naming the module's style.
pub const CARTRIDGE_STYLE_PROPERTY: &str = "cartridge.style";

/// A package descriptor as published next to a module's artifacts.
///
/// ```json
/// { "properties": { "cartridge.name": "ac_payment", "cartridge.style": "adapter" } }
/// ```
///
/// Unknown top-level keys are ignored so descriptors may carry other data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleMetadata {
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ModuleMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(coordinate: &ModuleCoordinate, data: &[u8]) -> Result<Self, MetadataError> {
        serde_json::from_slice(data).map_err(|e| MetadataError::Parse {
            coordinate: coordinate.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    #[must_use]
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn cartridge_name(&self) -> Option<&str> {
        self.property(CARTRIDGE_NAME_PROPERTY)
    }

    pub fn cartridge_style(&self) -> Option<&str> {
        self.property(CARTRIDGE_STYLE_PROPERTY)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Repository-relative location of a coordinate's descriptor:
/// `<group with '.' as '/'>/<name>/<version>/<name>-<version>.json`.
pub fn descriptor_path(coordinate: &ModuleCoordinate) -> String {
    format!(
        "{}/{name}/{version}/{name}-{version}.json",
        coordinate.group.replace('.', "/"),
        name = coordinate.name,
        version = coordinate.version,
    )
}
