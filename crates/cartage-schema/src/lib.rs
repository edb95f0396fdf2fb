//! Environment model, module coordinates, versions, and project configuration for Cartage.
//!
//! This crate defines the schema layer: deployment tiers and module styles with
//! their membership rule (`Tier::accepts`), `group:name:version` coordinates and
//! module references, the structured version parser used for conflict
//! resolution, cartridge descriptors, and `cartage.toml` parsing (`ProjectConfigV1`)
//! with its normalized form (`NormalizedConfig`).

pub mod config;
pub mod coordinate;
pub mod descriptor;
pub mod environment;
pub mod normalize;
pub mod types;
pub mod version;

pub use config::{
    parse_config_file, parse_config_str, BaselineSection, CartridgeListSection, ConfigError,
    MetadataSection, ModuleSection, OutputSection, ProjectConfigV1,
};
pub use coordinate::{CoordinateError, LibraryKey, ModuleCoordinate, ModuleReference};
pub use descriptor::CartridgeDescriptor;
pub use environment::{accepts, ParseEnvironmentError, Style, Tier};
pub use normalize::{NormalizedCartridgeList, NormalizedConfig, NormalizedModule, RepositorySpec};
pub use types::CartridgeName;
pub use version::{Version, VersionDelta, VersionError};
