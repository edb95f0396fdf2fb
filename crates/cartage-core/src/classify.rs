//! Cartridge classification through package metadata.
//!
//! A coordinate is a first-party module when its package descriptor carries a
//! `cartridge.name` property. Lookups are memoized in a [`ClassificationCache`]
//! that lives for exactly one run. Every way a lookup can fail (missing or
//! unreadable descriptor, bad style, resolver timeout) degrades to
//! [`Classification::Library`] with a log line; classification is never fatal.

use cartage_remote::{MetadataResolver, ModuleMetadata};
use cartage_schema::{
    CartridgeDescriptor, CartridgeName, CoordinateError, ModuleCoordinate, ModuleReference,
    NormalizedModule, Style, Tier,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A first-party module. `style` is `None` only for bare local names the
    /// module registry does not know.
    FirstParty {
        name: CartridgeName,
        style: Option<Style>,
    },
    Library,
}

impl Classification {
    pub fn is_cartridge(&self) -> bool {
        matches!(self, Classification::FirstParty { .. })
    }

    pub fn style(&self) -> Option<Style> {
        match self {
            Classification::FirstParty { style, .. } => *style,
            Classification::Library => None,
        }
    }

    /// Whether a module classified this way is deployed in `tier`.
    ///
    /// Libraries are never accepted. A first-party module of unknown style is
    /// only deployable in the development tier.
    pub fn accepted_by(&self, tier: Tier) -> bool {
        match self {
            Classification::FirstParty {
                style: Some(style), ..
            } => tier.accepts(*style),
            Classification::FirstParty { style: None, .. } => tier == Tier::Development,
            Classification::Library => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationStats {
    /// Resolver queries issued.
    pub lookups: usize,
    pub cache_hits: usize,
    /// Lookups that failed and were treated as libraries.
    pub failures: usize,
    pub cartridges: usize,
}

/// Run-scoped memo of coordinate classifications.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    entries: HashMap<ModuleCoordinate, Classification>,
    stats: ClassificationStats,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coordinate: &ModuleCoordinate) -> Option<&Classification> {
        self.entries.get(coordinate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> ClassificationStats {
        self.stats
    }
}

/// Classifies module references against a metadata resolver and the project's
/// module registry.
pub struct Classifier<'a> {
    resolver: &'a dyn MetadataResolver,
    registry: BTreeMap<CartridgeName, Style>,
    cache: ClassificationCache,
}

impl<'a> Classifier<'a> {
    /// Create a classifier with an empty cache. `registry` maps local module
    /// names to their declared styles.
    pub fn new(resolver: &'a dyn MetadataResolver, registry: BTreeMap<CartridgeName, Style>) -> Self {
        Self {
            resolver,
            registry,
            cache: ClassificationCache::new(),
        }
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    pub fn stats(&self) -> ClassificationStats {
        self.cache.stats
    }

    pub fn classify(&mut self, reference: &ModuleReference) -> Classification {
        match reference {
            ModuleReference::Local(name) => Classification::FirstParty {
                name: name.clone(),
                style: self.registry.get(name).copied(),
            },
            ModuleReference::Remote(coordinate) => self.classify_coordinate(coordinate),
        }
    }

    pub fn is_cartridge(&mut self, coordinate: &ModuleCoordinate) -> bool {
        self.classify_coordinate(coordinate).is_cartridge()
    }

    pub fn style(&mut self, coordinate: &ModuleCoordinate) -> Option<Style> {
        self.classify_coordinate(coordinate).style()
    }

    pub fn classify_coordinate(&mut self, coordinate: &ModuleCoordinate) -> Classification {
        if let Some(hit) = self.cache.entries.get(coordinate) {
            self.cache.stats.cache_hits += 1;
            return hit.clone();
        }

        self.cache.stats.lookups += 1;
        let classification = match self.resolver.fetch(coordinate) {
            Ok(Some(meta)) => from_metadata(coordinate, &meta),
            Ok(None) => {
                debug!("no package metadata for {coordinate}; treating as library");
                Classification::Library
            }
            Err(e) => {
                self.cache.stats.failures += 1;
                warn!("metadata lookup for {coordinate} failed, treating as library: {e}");
                Classification::Library
            }
        };
        if classification.is_cartridge() {
            self.cache.stats.cartridges += 1;
        }
        trace!("{coordinate} classified as {classification:?}");
        self.cache
            .entries
            .insert(coordinate.clone(), classification.clone());
        classification
    }
}

fn from_metadata(coordinate: &ModuleCoordinate, meta: &ModuleMetadata) -> Classification {
    let Some(raw_name) = meta.cartridge_name() else {
        return Classification::Library;
    };
    let name = match raw_name.trim() {
        "" => coordinate.name.as_str(),
        trimmed => trimmed,
    };
    if !CartridgeName::is_valid(name) {
        warn!("{coordinate} declares invalid cartridge name '{raw_name}'; treating as library");
        return Classification::Library;
    }
    let style = match meta.cartridge_style() {
        None => Style::All,
        Some(raw) => match raw.parse::<Style>() {
            Ok(style) => style,
            Err(e) => {
                warn!("{coordinate}: {e}; treating as library");
                return Classification::Library;
            }
        },
    };
    Classification::FirstParty {
        name: CartridgeName::new(name),
        style: Some(style),
    }
}

/// `Ok(true)` for a `group:name:version` coordinate, `Ok(false)` for a bare
/// local name; any other token shape is an error naming the token.
pub fn is_module_reference(token: &str) -> Result<bool, CoordinateError> {
    ModuleReference::parse(token).map(|r| r.is_remote())
}

/// Build a descriptor per registry module, splitting each module's declared
/// dependencies into first-party modules and third-party libraries.
pub fn describe_modules(
    modules: &[NormalizedModule],
    classifier: &mut Classifier<'_>,
) -> Vec<CartridgeDescriptor> {
    modules
        .iter()
        .map(|module| {
            let mut descriptor = CartridgeDescriptor::new(module.name.clone(), module.style);
            for dependency in &module.dependencies {
                match (classifier.classify(dependency), dependency) {
                    (Classification::FirstParty { name, .. }, _) => {
                        descriptor.depends_on.insert(name);
                    }
                    (Classification::Library, ModuleReference::Remote(coordinate)) => {
                        descriptor.depends_on_libs.insert(coordinate.clone());
                    }
                    (Classification::Library, ModuleReference::Local(_)) => {}
                }
            }
            debug!(
                "module {}: {} first-party, {} libraries",
                descriptor.name,
                descriptor.depends_on.len(),
                descriptor.depends_on_libs.len()
            );
            descriptor
        })
        .collect()
}
