use crate::{
    DirectoryRepository, HttpConfig, HttpRepository, MetadataError, MetadataResolver,
    ModuleMetadata,
};
use cartage_schema::{ModuleCoordinate, RepositorySpec};
use std::time::Duration;

/// Build a resolver for one configured repository entry.
///
/// HTTP repositories pick up a bearer token from the environment.
pub fn repository_from_spec(spec: &RepositorySpec, timeout: Duration) -> Box<dyn MetadataResolver> {
    match spec {
        RepositorySpec::Http(url) => Box::new(HttpRepository::new(
            HttpConfig::new(url)
                .with_timeout(timeout)
                .with_token_from_env(),
        )),
        RepositorySpec::Directory(path) => Box::new(DirectoryRepository::new(path.clone())),
    }
}

/// Repositories consulted in order; the first one that carries a coordinate
/// answers for it.
///
/// A failing member does not hide later members. The lookup fails only when
/// no member carries the coordinate and at least one member failed.
pub struct RepositoryChain {
    members: Vec<Box<dyn MetadataResolver>>,
}

impl RepositoryChain {
    pub fn new(members: Vec<Box<dyn MetadataResolver>>) -> Self {
        Self { members }
    }

    pub fn from_specs(specs: &[RepositorySpec], timeout: Duration) -> Self {
        Self::new(
            specs
                .iter()
                .map(|s| repository_from_spec(s, timeout))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl MetadataResolver for RepositoryChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn fetch(&self, coordinate: &ModuleCoordinate) -> Result<Option<ModuleMetadata>, MetadataError> {
        let mut last_error = None;
        for member in &self.members {
            match member.fetch(coordinate) {
                Ok(Some(meta)) => {
                    tracing::trace!("{coordinate} found in {}", member.name());
                    return Ok(Some(meta));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("repository {} failed for {coordinate}: {e}", member.name());
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}
