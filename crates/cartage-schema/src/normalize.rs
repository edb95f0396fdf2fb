use crate::config::{ConfigError, ProjectConfigV1};
use crate::coordinate::ModuleReference;
use crate::environment::{Style, Tier};
use crate::types::CartridgeName;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Validated project configuration with paths resolved and lists sorted.
///
/// Every module name and reference is checked here, so malformed identifiers
/// abort a run before any metadata is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedConfig {
    pub repositories: Vec<RepositorySpec>,
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
    pub baselines: BTreeMap<Tier, Vec<PathBuf>>,
    pub cartridge_list: Option<NormalizedCartridgeList>,
    /// Sorted by name.
    pub modules: Vec<NormalizedModule>,
}

/// Where package descriptors are looked up, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySpec {
    Http(String),
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedModule {
    pub name: CartridgeName,
    pub style: Style,
    pub dependencies: BTreeSet<ModuleReference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCartridgeList {
    pub template: PathBuf,
    pub output: PathBuf,
    pub include: BTreeSet<ModuleReference>,
    pub dbinit: BTreeSet<ModuleReference>,
}

impl ProjectConfigV1 {
    /// Normalize the configuration. Relative paths resolve against `base_dir`,
    /// normally the directory holding `cartage.toml`.
    pub fn normalize(&self, base_dir: &Path) -> Result<NormalizedConfig, ConfigError> {
        if self.config_version != 1 {
            return Err(ConfigError::UnsupportedVersion(self.config_version));
        }
        if self.metadata.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let mut repositories = Vec::with_capacity(self.metadata.repositories.len());
        for entry in &self.metadata.repositories {
            repositories.push(parse_repository(entry, base_dir)?);
        }

        let mut modules: Vec<NormalizedModule> = Vec::with_capacity(self.modules.len());
        let mut seen = BTreeSet::new();
        for module in &self.modules {
            let name = module.name.trim();
            if !CartridgeName::is_valid(name) {
                return Err(ConfigError::InvalidModuleName(module.name.clone()));
            }
            if !seen.insert(name.to_owned()) {
                return Err(ConfigError::DuplicateModule(name.to_owned()));
            }
            let dependencies = parse_references(&module.dependencies).map_err(|source| {
                ConfigError::InvalidDependency {
                    module: name.to_owned(),
                    source,
                }
            })?;
            modules.push(NormalizedModule {
                name: CartridgeName::new(name),
                style: module.style,
                dependencies,
            });
        }
        modules.sort_by(|a, b| a.name.cmp(&b.name));

        let mut baselines = BTreeMap::new();
        for (tier, lists) in [
            (Tier::Production, &self.baseline.production),
            (Tier::Test, &self.baseline.test),
            (Tier::Development, &self.baseline.development),
        ] {
            baselines.insert(tier, resolve_paths(lists, base_dir));
        }

        let cartridge_list = match &self.cartridge_list {
            None => None,
            Some(section) => Some(NormalizedCartridgeList {
                template: base_dir.join(section.template.trim()),
                output: base_dir.join(section.output.trim()),
                include: parse_references(&section.include).map_err(|source| {
                    ConfigError::InvalidListReference {
                        field: "include",
                        source,
                    }
                })?,
                dbinit: parse_references(&section.dbinit).map_err(|source| {
                    ConfigError::InvalidListReference {
                        field: "dbinit",
                        source,
                    }
                })?,
            }),
        };

        Ok(NormalizedConfig {
            repositories,
            timeout_secs: self.metadata.timeout_secs,
            output_dir: base_dir.join(self.output.dir.trim()),
            baselines,
            cartridge_list,
            modules,
        })
    }
}

impl NormalizedConfig {
    /// Path of the library manifest written for `tier`.
    pub fn manifest_path(&self, tier: Tier) -> PathBuf {
        self.output_dir.join(format!("libraries-{tier}.txt"))
    }

    pub fn baseline_paths(&self, tier: Tier) -> &[PathBuf] {
        self.baselines.get(&tier).map_or(&[], Vec::as_slice)
    }

    /// Declared style of every registry module, keyed by local name.
    pub fn module_styles(&self) -> BTreeMap<CartridgeName, Style> {
        self.modules
            .iter()
            .map(|m| (m.name.clone(), m.style))
            .collect()
    }
}

fn parse_repository(entry: &str, base_dir: &Path) -> Result<RepositorySpec, ConfigError> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyRepository);
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(RepositorySpec::Http(trimmed.trim_end_matches('/').to_owned()));
    }
    let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    Ok(RepositorySpec::Directory(base_dir.join(path)))
}

fn parse_references(
    values: &[String],
) -> Result<BTreeSet<ModuleReference>, crate::coordinate::CoordinateError> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ModuleReference::parse)
        .collect()
}

fn resolve_paths(values: &[String], base_dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| base_dir.join(v))
        .collect();
    out.sort();
    out.dedup();
    out
}
