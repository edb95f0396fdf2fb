//! Package metadata lookup for classifying modules as cartridges.
//!
//! This crate provides the [`MetadataResolver`] seam used by the classifier,
//! the package descriptor format ([`ModuleMetadata`]), and the concrete
//! repositories: a local directory layout, an HTTP repository, an ordered chain
//! of repositories, and an in-memory fixture.

pub mod chain;
pub mod config;
pub mod directory;
pub mod http;
pub mod memory;
pub mod metadata;

pub use chain::{repository_from_spec, RepositoryChain};
pub use config::HttpConfig;
pub use directory::DirectoryRepository;
pub use http::HttpRepository;
pub use memory::InMemoryRepository;
pub use metadata::{
    descriptor_path, ModuleMetadata, CARTRIDGE_NAME_PROPERTY, CARTRIDGE_STYLE_PROPERTY,
};

use cartage_schema::ModuleCoordinate;
use thiserror::Error;

/// Environment variable holding a bearer token for HTTP repositories.
pub const TOKEN_ENV_VAR: &str = "CARTAGE_REPOSITORY_TOKEN";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("metadata request timed out: {0}")]
    Timeout(String),
    #[error("unparseable descriptor for {coordinate}: {reason}")]
    Parse { coordinate: String, reason: String },
}

/// Source of package descriptors for module coordinates.
///
/// `Ok(None)` means the repository does not carry the coordinate at all;
/// `Err` means the lookup itself failed.
pub trait MetadataResolver: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, coordinate: &ModuleCoordinate) -> Result<Option<ModuleMetadata>, MetadataError>;
}

impl<T: MetadataResolver + ?Sized> MetadataResolver for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, coordinate: &ModuleCoordinate) -> Result<Option<ModuleMetadata>, MetadataError> {
        (**self).fetch(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_resolver_delegates() {
        let mut repo = InMemoryRepository::new();
        repo.insert_cartridge(&ModuleCoordinate::new("g", "c", "1.0"), "c", Some("cartridge"));
        let boxed: Box<dyn MetadataResolver> = Box::new(repo);
        assert_eq!(boxed.name(), "memory");
        let meta = boxed
            .fetch(&ModuleCoordinate::new("g", "c", "1.0"))
            .unwrap()
            .unwrap();
        assert_eq!(meta.cartridge_name(), Some("c"));
    }

    #[test]
    fn error_display() {
        let err = MetadataError::Parse {
            coordinate: "g:n:1".to_owned(),
            reason: "expected value".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "unparseable descriptor for g:n:1: expected value"
        );
    }
}
