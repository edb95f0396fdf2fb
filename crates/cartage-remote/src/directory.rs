use crate::metadata::descriptor_path;
use crate::{MetadataError, MetadataResolver, ModuleMetadata};
use cartage_schema::ModuleCoordinate;
use std::path::{Path, PathBuf};

/// Package descriptors laid out in a local directory, e.g. a repository
/// mirror or a build's local publication target.
pub struct DirectoryRepository {
    root: PathBuf,
    name: String,
}

impl DirectoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let name = root.to_string_lossy().into_owned();
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, coordinate: &ModuleCoordinate) -> PathBuf {
        self.root.join(descriptor_path(coordinate))
    }

    /// Write a descriptor into the repository layout, creating directories.
    pub fn publish(
        &self,
        coordinate: &ModuleCoordinate,
        metadata: &ModuleMetadata,
    ) -> Result<PathBuf, MetadataError> {
        let path = self.path(coordinate);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = metadata.to_bytes().map_err(|e| MetadataError::Parse {
            coordinate: coordinate.to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl MetadataResolver for DirectoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, coordinate: &ModuleCoordinate) -> Result<Option<ModuleMetadata>, MetadataError> {
        let path = self.path(coordinate);
        tracing::trace!("reading descriptor {}", path.display());
        match std::fs::read(&path) {
            Ok(data) => ModuleMetadata::from_bytes(coordinate, &data).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MetadataError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CARTRIDGE_NAME_PROPERTY;

    #[test]
    fn publish_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DirectoryRepository::new(dir.path());
        let coordinate = ModuleCoordinate::new("com.acme", "ac_payment", "2.1.0");
        let meta = ModuleMetadata::new().with_property(CARTRIDGE_NAME_PROPERTY, "ac_payment");

        let path = repo.publish(&coordinate, &meta).unwrap();
        assert!(path.ends_with("com/acme/ac_payment/2.1.0/ac_payment-2.1.0.json"));

        let fetched = repo.fetch(&coordinate).unwrap();
        assert_eq!(fetched, Some(meta));
    }

    #[test]
    fn missing_descriptor_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DirectoryRepository::new(dir.path());
        let fetched = repo
            .fetch(&ModuleCoordinate::new("org.slf4j", "slf4j-api", "2.0.9"))
            .unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn corrupt_descriptor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DirectoryRepository::new(dir.path());
        let coordinate = ModuleCoordinate::new("g", "n", "1.0");
        let path = repo.path(&coordinate);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            repo.fetch(&coordinate),
            Err(MetadataError::Parse { .. })
        ));
    }
}
