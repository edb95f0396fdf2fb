use crate::metadata::{CARTRIDGE_NAME_PROPERTY, CARTRIDGE_STYLE_PROPERTY};
use crate::{MetadataError, MetadataResolver, ModuleMetadata};
use cartage_schema::ModuleCoordinate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory descriptor source for tests and dry runs.
///
/// Coordinates registered with [`fail`](Self::fail) return an error on lookup,
/// which exercises the classifier's fail-open path.
#[derive(Default)]
pub struct InMemoryRepository {
    entries: BTreeMap<ModuleCoordinate, ModuleMetadata>,
    failing: BTreeSet<ModuleCoordinate>,
    lookups: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coordinate: ModuleCoordinate, metadata: ModuleMetadata) {
        self.entries.insert(coordinate, metadata);
    }

    /// Register a first-party module descriptor.
    pub fn insert_cartridge(&mut self, coordinate: &ModuleCoordinate, name: &str, style: Option<&str>) {
        let mut meta = ModuleMetadata::new().with_property(CARTRIDGE_NAME_PROPERTY, name);
        if let Some(style) = style {
            meta = meta.with_property(CARTRIDGE_STYLE_PROPERTY, style);
        }
        self.insert(coordinate.clone(), meta);
    }

    pub fn fail(&mut self, coordinate: ModuleCoordinate) {
        self.failing.insert(coordinate);
    }

    /// Number of `fetch` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl MetadataResolver for InMemoryRepository {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, coordinate: &ModuleCoordinate) -> Result<Option<ModuleMetadata>, MetadataError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(coordinate) {
            return Err(MetadataError::Timeout(format!("memory:{coordinate}")));
        }
        Ok(self.entries.get(coordinate).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_registered_entries() {
        let mut repo = InMemoryRepository::new();
        let c = ModuleCoordinate::new("g", "c", "1.0");
        repo.insert_cartridge(&c, "c", Some("test"));
        let meta = repo.fetch(&c).unwrap().unwrap();
        assert_eq!(meta.cartridge_style(), Some("test"));
        assert!(repo.fetch(&ModuleCoordinate::new("g", "x", "1.0")).unwrap().is_none());
        assert_eq!(repo.lookups(), 2);
    }

    #[test]
    fn failing_entries_error() {
        let mut repo = InMemoryRepository::new();
        let c = ModuleCoordinate::new("g", "c", "1.0");
        repo.fail(c.clone());
        assert!(matches!(repo.fetch(&c), Err(MetadataError::Timeout(_))));
    }
}
