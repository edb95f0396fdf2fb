use crate::types::CartridgeName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("malformed coordinate '{0}', expected 'group:name:version'")]
    MalformedCoordinate(String),
    #[error("malformed module reference '{0}', expected a local module name or 'group:name:version'")]
    MalformedReference(String),
}

/// A `group:name:version` triple identifying a first-party module or a library.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleCoordinate {
    pub group: String,
    pub name: String,
    pub version: String,
}

/// The `(group, name)` part of a coordinate; the unit of version conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LibraryKey {
    pub group: String,
    pub name: String,
}

/// A reference to a first-party module: either a bare local name, trusted to be
/// first-party, or a fully qualified coordinate that needs classification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleReference {
    Local(CartridgeName),
    Remote(ModuleCoordinate),
}

/// Parts become repository path segments, so separators and dot-dot are refused.
fn is_coordinate_part(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && !part.contains("..")
        && !part
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\'))
}

impl ModuleCoordinate {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, CoordinateError> {
        let parts: Vec<&str> = input.trim().split(':').collect();
        match parts.as_slice() {
            [group, name, version]
                if is_coordinate_part(group)
                    && is_coordinate_part(name)
                    && is_coordinate_part(version) =>
            {
                Ok(Self::new(*group, *name, *version))
            }
            _ => Err(CoordinateError::MalformedCoordinate(input.to_owned())),
        }
    }

    pub fn key(&self) -> LibraryKey {
        LibraryKey {
            group: self.group.clone(),
            name: self.name.clone(),
        }
    }
}

impl LibraryKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Full library id for `version`: `group:name:version`.
    pub fn id(&self, version: &str) -> String {
        format!("{}:{}:{version}", self.group, self.name)
    }
}

impl ModuleReference {
    /// Parse a reference token. Anything that is neither a local name nor a
    /// well-formed coordinate is rejected.
    pub fn parse(input: &str) -> Result<Self, CoordinateError> {
        let trimmed = input.trim();
        if trimmed.contains(':') {
            return ModuleCoordinate::parse(trimmed)
                .map(ModuleReference::Remote)
                .map_err(|_| CoordinateError::MalformedReference(input.to_owned()));
        }
        if CartridgeName::is_valid(trimmed) {
            Ok(ModuleReference::Local(CartridgeName::new(trimmed)))
        } else {
            Err(CoordinateError::MalformedReference(input.to_owned()))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ModuleReference::Remote(_))
    }
}

impl fmt::Display for ModuleCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleReference::Local(name) => write!(f, "{name}"),
            ModuleReference::Remote(coordinate) => write!(f, "{coordinate}"),
        }
    }
}

impl FromStr for ModuleCoordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for ModuleReference {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleCoordinate {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModuleCoordinate> for String {
    fn from(coordinate: ModuleCoordinate) -> Self {
        coordinate.to_string()
    }
}

impl TryFrom<String> for LibraryKey {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once(':') {
            Some((group, name))
                if is_coordinate_part(group) && is_coordinate_part(name) && !name.contains(':') =>
            {
                Ok(LibraryKey::new(group, name))
            }
            _ => Err(CoordinateError::MalformedCoordinate(value)),
        }
    }
}

impl From<LibraryKey> for String {
    fn from(key: LibraryKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate() {
        let c = ModuleCoordinate::parse("com.google.guava:guava:31.1-jre").unwrap();
        assert_eq!(c.group, "com.google.guava");
        assert_eq!(c.name, "guava");
        assert_eq!(c.version, "31.1-jre");
        assert_eq!(c.to_string(), "com.google.guava:guava:31.1-jre");
        assert_eq!(c.key().to_string(), "com.google.guava:guava");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        for bad in [
            "g:n",
            "g:n:v:c",
            "g::v",
            ":n:v",
            "g:n:",
            "g:n a:v",
            "",
            "g:../../secret:1",
            "g:n:1/../..",
            "../etc:n:1",
            "g:n\\x:1",
            "g/h:n:1",
            "g:.:1",
        ] {
            assert_eq!(
                ModuleCoordinate::parse(bad),
                Err(CoordinateError::MalformedCoordinate(bad.to_owned())),
                "{bad:?} must be rejected"
            );
        }
    }

    #[test]
    fn reference_local_or_remote() {
        assert_eq!(
            ModuleReference::parse("app_core").unwrap(),
            ModuleReference::Local(CartridgeName::new("app_core"))
        );
        let remote = ModuleReference::parse("com.acme:ac_payment:2.1.0").unwrap();
        assert!(remote.is_remote());
        assert_eq!(remote.to_string(), "com.acme:ac_payment:2.1.0");
    }

    #[test]
    fn reference_error_names_the_token() {
        for bad in ["com.acme:ac_payment", "a b", "x/y", "g:n:v:extra"] {
            let err = ModuleReference::parse(bad).unwrap_err();
            assert_eq!(err, CoordinateError::MalformedReference(bad.to_owned()));
            assert!(err.to_string().contains(bad));
        }
    }

    #[test]
    fn library_key_id() {
        let key = LibraryKey::new("g", "n");
        assert_eq!(key.id("1.2.0"), "g:n:1.2.0");
    }

    #[test]
    fn coordinate_serde_as_string() {
        let c = ModuleCoordinate::new("g", "n", "1.0");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"g:n:1.0\"");
        let back: ModuleCoordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert!(serde_json::from_str::<ModuleCoordinate>("\"g:n\"").is_err());
    }

    #[test]
    fn library_key_serde_as_string() {
        let key = LibraryKey::new("org.slf4j", "slf4j-api");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"org.slf4j:slf4j-api\"");
        let back: LibraryKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
