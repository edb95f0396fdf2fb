//! Core pipeline for Cartage library manifests.
//!
//! This crate turns a normalized project configuration into per-tier library
//! manifests: modules are classified as cartridges or libraries through package
//! metadata (`Classifier`), declared libraries are aggregated per tier with
//! first-claim exclusivity (`resolve_tiers`), conflicting versions are reconciled
//! (`resolve`), baseline lists are subtracted (`exclude`), and results are
//! written with the canonical list codec. The `Engine` ties one run together.

pub mod aggregate;
pub mod cartridge_list;
pub mod classify;
pub mod codec;
pub mod conflict;
pub mod engine;
pub mod exclude;

pub use aggregate::{aggregate, resolve_tier, resolve_tiers, ConflictGroup, TierResolution};
pub use cartridge_list::{
    extend, CartridgeListTemplate, ExtensionReport, CARTRIDGES_PROPERTY, DBINIT_PROPERTY,
};
pub use classify::{
    describe_modules, is_module_reference, Classification, ClassificationCache,
    ClassificationStats, Classifier,
};
pub use codec::{parse_list, read_list, render_list, write_list};
pub use conflict::{resolve, DriftKind, Resolution, VersionConflictError, VersionDrift};
pub use engine::{CheckReport, ClassifiedReference, Engine, RunReport, TierCheck, TierManifest};
pub use exclude::{exclude, load_baseline, Filtered};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] cartage_schema::ConfigError),
    #[error("configuration error: {0}")]
    Reference(#[from] cartage_schema::CoordinateError),
    #[error("configuration error: template {} has no '{property}' property", .path.display())]
    MissingTemplateProperty {
        property: &'static str,
        path: PathBuf,
    },
    #[error("configuration error: no [cartridge_list] section configured")]
    NoCartridgeList,
    #[error("version conflict: {0}")]
    Conflict(#[from] VersionConflictError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
