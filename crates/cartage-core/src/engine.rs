use crate::aggregate::resolve_tiers;
use crate::cartridge_list::{extend, CartridgeListTemplate, ExtensionReport};
use crate::classify::{describe_modules, ClassificationStats, Classifier};
use crate::codec::{read_list, write_list};
use crate::conflict::VersionDrift;
use crate::exclude::{exclude, load_baseline};
use crate::CoreError;
use cartage_remote::{MetadataResolver, RepositoryChain};
use cartage_schema::{
    parse_config_file, CartridgeDescriptor, ModuleReference, NormalizedConfig, Style, Tier,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Runs the manifest pipeline for one project.
///
/// Every operation is a separate run with its own classification cache, so
/// nothing learned from package metadata outlives the call that fetched it.
pub struct Engine {
    config: NormalizedConfig,
    resolver: Box<dyn MetadataResolver>,
}

/// Final library manifest of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierManifest {
    pub tier: Tier,
    pub path: PathBuf,
    pub libraries: BTreeSet<String>,
    /// Ids dropped because a baseline list provides them.
    pub excluded: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tiers: Vec<TierManifest>,
    pub drifts: Vec<VersionDrift>,
    pub classification: ClassificationStats,
    pub modules: Vec<CartridgeDescriptor>,
}

impl RunReport {
    pub fn tier(&self, tier: Tier) -> Option<&TierManifest> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

/// Difference between a freshly computed manifest and the one on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierCheck {
    pub tier: Tier,
    pub path: PathBuf,
    pub missing: bool,
    /// Ids the fresh run produces that the file lacks.
    pub added: BTreeSet<String>,
    /// Ids in the file the fresh run no longer produces.
    pub removed: BTreeSet<String>,
}

impl TierCheck {
    pub fn has_drift(&self) -> bool {
        self.missing || !self.added.is_empty() || !self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub tiers: Vec<TierCheck>,
    pub has_drift: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedReference {
    pub reference: String,
    pub first_party: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    /// Tiers that would deploy this module.
    pub tiers: Vec<Tier>,
}

impl Engine {
    pub fn new(config: NormalizedConfig, resolver: Box<dyn MetadataResolver>) -> Self {
        Self { config, resolver }
    }

    /// Load `cartage.toml`, resolving relative paths against its directory and
    /// querying the configured repositories in order.
    pub fn from_config_file(path: &Path) -> Result<Self, CoreError> {
        let raw = parse_config_file(path)?;
        let base_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let config = raw.normalize(base_dir)?;
        let chain = RepositoryChain::from_specs(
            &config.repositories,
            Duration::from_secs(config.timeout_secs),
        );
        debug!(
            "loaded {} with {} modules and {} repositories",
            path.display(),
            config.modules.len(),
            chain.len()
        );
        Ok(Self::new(config, Box::new(chain)))
    }

    pub fn config(&self) -> &NormalizedConfig {
        &self.config
    }

    fn classifier(&self) -> Classifier<'_> {
        Classifier::new(&*self.resolver, self.config.module_styles())
    }

    /// Compute every tier manifest without writing anything.
    pub fn run(&self) -> Result<RunReport, CoreError> {
        let mut classifier = self.classifier();
        let modules = describe_modules(&self.config.modules, &mut classifier);
        let resolutions = resolve_tiers(&modules)?;

        let mut tiers = Vec::with_capacity(resolutions.len());
        let mut drifts = Vec::new();
        for resolution in resolutions {
            let baseline = load_baseline(self.config.baseline_paths(resolution.tier))?;
            let filtered = exclude(&resolution.libraries, [&baseline]);
            debug!(
                "{}: {} libraries after excluding {} baseline ids",
                resolution.tier,
                filtered.kept.len(),
                filtered.removed.len()
            );
            drifts.extend(resolution.drifts);
            tiers.push(TierManifest {
                tier: resolution.tier,
                path: self.config.manifest_path(resolution.tier),
                libraries: filtered.kept,
                excluded: filtered.removed,
            });
        }

        Ok(RunReport {
            tiers,
            drifts,
            classification: classifier.stats(),
            modules,
        })
    }

    /// Persist every tier manifest of `report`.
    pub fn write_manifests(&self, report: &RunReport) -> Result<Vec<PathBuf>, CoreError> {
        let mut written = Vec::with_capacity(report.tiers.len());
        for manifest in &report.tiers {
            write_list(&manifest.path, &manifest.libraries)?;
            info!(
                "{}: wrote {} libraries to {}",
                manifest.tier,
                manifest.libraries.len(),
                manifest.path.display()
            );
            written.push(manifest.path.clone());
        }
        Ok(written)
    }

    /// Recompute the manifests and compare them with the files on disk.
    pub fn check(&self) -> Result<CheckReport, CoreError> {
        let report = self.run()?;
        let mut tiers = Vec::with_capacity(report.tiers.len());
        for manifest in report.tiers {
            let missing = !manifest.path.exists();
            let on_disk = if missing {
                BTreeSet::new()
            } else {
                read_list(&manifest.path)?
            };
            let added = manifest.libraries.difference(&on_disk).cloned().collect();
            let removed = on_disk.difference(&manifest.libraries).cloned().collect();
            tiers.push(TierCheck {
                tier: manifest.tier,
                path: manifest.path,
                missing,
                added,
                removed,
            });
        }
        let has_drift = tiers.iter().any(TierCheck::has_drift);
        Ok(CheckReport { tiers, has_drift })
    }

    /// Extend the configured cartridge list template for `tier` and write it
    /// to the configured output.
    pub fn extend_cartridge_list(&self, tier: Tier) -> Result<ExtensionReport, CoreError> {
        let section = self
            .config
            .cartridge_list
            .as_ref()
            .ok_or(CoreError::NoCartridgeList)?;
        let mut template = CartridgeListTemplate::load(&section.template)?;
        let mut classifier = self.classifier();
        let mut report = extend(
            &mut template,
            tier,
            &section.include,
            &section.dbinit,
            &mut classifier,
        );
        template.write(&section.output)?;
        info!(
            "{tier}: added {} cartridges and {} dbinit entries to {}",
            report.cartridges.len(),
            report.dbinit.len(),
            section.output.display()
        );
        report.output = Some(section.output.clone());
        Ok(report)
    }

    /// Classify each reference against package metadata and the module registry.
    pub fn classify(&self, references: &[ModuleReference]) -> Vec<ClassifiedReference> {
        let mut classifier = self.classifier();
        references
            .iter()
            .map(|reference| {
                let classification = classifier.classify(reference);
                ClassifiedReference {
                    reference: reference.to_string(),
                    first_party: classification.is_cartridge(),
                    name: match &classification {
                        crate::Classification::FirstParty { name, .. } => Some(name.to_string()),
                        crate::Classification::Library => None,
                    },
                    style: classification.style(),
                    tiers: Tier::ORDERED
                        .into_iter()
                        .filter(|&t| classification.accepted_by(t))
                        .collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartage_remote::InMemoryRepository;
    use cartage_schema::{parse_config_str, ModuleCoordinate};

    fn engine(toml: &str, repo: InMemoryRepository, base: &Path) -> Engine {
        let config = parse_config_str(toml).unwrap().normalize(base).unwrap();
        Engine::new(config, Box::new(repo))
    }

    const CONFIG: &str = r#"
config_version = 1

[[module]]
name = "app_core"
style = "cartridge"
dependencies = ["com.google.guava:guava:31.1-jre", "org.slf4j:slf4j-api:2.0.7", "com.acme:ac_payment:2.1.0"]

[[module]]
name = "app_test"
style = "test"
dependencies = ["org.slf4j:slf4j-api:2.0.9", "junit:junit:4.13.2", "app_core"]
"#;

    fn repo() -> InMemoryRepository {
        let mut repo = InMemoryRepository::new();
        repo.insert_cartridge(
            &ModuleCoordinate::new("com.acme", "ac_payment", "2.1.0"),
            "ac_payment",
            Some("adapter"),
        );
        repo
    }

    #[test]
    fn run_computes_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(CONFIG, repo(), dir.path());
        let report = engine.run().unwrap();

        let production = report.tier(Tier::Production).unwrap();
        assert_eq!(
            production.libraries.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["com.google.guava:guava:31.1-jre", "org.slf4j:slf4j-api:2.0.7"]
        );
        let test = report.tier(Tier::Test).unwrap();
        assert_eq!(
            test.libraries.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["junit:junit:4.13.2"]
        );
        assert!(report.tier(Tier::Development).unwrap().libraries.is_empty());
        assert_eq!(report.classification.cartridges, 1);

        let core = report.modules.iter().find(|m| m.name == "app_core").unwrap();
        assert!(core.depends_on.contains("ac_payment"));
    }

    #[test]
    fn baseline_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("platform.txt"), "org.slf4j:slf4j-api:2.0.7\n").unwrap();
        let toml = CONFIG.replacen(
            "config_version = 1\n",
            "config_version = 1\n\n[baseline]\nproduction = [\"platform.txt\"]\n",
            1,
        );
        let engine = engine(&toml, repo(), dir.path());
        let report = engine.run().unwrap();
        let production = report.tier(Tier::Production).unwrap();
        assert!(!production.libraries.contains("org.slf4j:slf4j-api:2.0.7"));
        assert!(production.excluded.contains("org.slf4j:slf4j-api:2.0.7"));
        // The key stays claimed by production even though the id was excluded.
        assert!(report.tier(Tier::Test).unwrap().libraries.iter().all(|id| !id.starts_with("org.slf4j")));
    }

    #[test]
    fn write_then_check_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(CONFIG, repo(), dir.path());

        let before = engine.check().unwrap();
        assert!(before.has_drift);
        assert!(before.tiers.iter().all(|t| t.missing));

        let report = engine.run().unwrap();
        let written = engine.write_manifests(&report).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written[0].ends_with("build/cartage/libraries-production.txt"));

        let after = engine.check().unwrap();
        assert!(!after.has_drift, "{after:?}");
    }

    #[test]
    fn check_reports_stale_entries() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(CONFIG, repo(), dir.path());
        engine.write_manifests(&engine.run().unwrap()).unwrap();
        let path = engine.config().manifest_path(Tier::Test);
        std::fs::write(&path, "junit:junit:4.12\n").unwrap();

        let check = engine.check().unwrap();
        assert!(check.has_drift);
        let test = check.tiers.iter().find(|t| t.tier == Tier::Test).unwrap();
        assert!(test.added.contains("junit:junit:4.13.2"));
        assert!(test.removed.contains("junit:junit:4.12"));
    }

    #[test]
    fn extend_without_section_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(CONFIG, repo(), dir.path());
        let err = engine.extend_cartridge_list(Tier::Production).unwrap_err();
        assert!(err.to_string().starts_with("configuration error:"));
    }

    #[test]
    fn classify_reports_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(CONFIG, repo(), dir.path());
        let refs = [
            ModuleReference::parse("app_test").unwrap(),
            ModuleReference::parse("com.acme:ac_payment:2.1.0").unwrap(),
            ModuleReference::parse("junit:junit:4.13.2").unwrap(),
        ];
        let out = engine.classify(&refs);
        assert_eq!(out[0].style, Some(Style::Test));
        assert_eq!(out[0].tiers, vec![Tier::Test, Tier::Development]);
        assert_eq!(out[1].name.as_deref(), Some("ac_payment"));
        assert_eq!(out[1].tiers.len(), 3);
        assert!(!out[2].first_party);
        assert!(out[2].tiers.is_empty());
    }
}
