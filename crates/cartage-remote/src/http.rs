use crate::metadata::descriptor_path;
use crate::{HttpConfig, MetadataError, MetadataResolver, ModuleMetadata};
use cartage_schema::ModuleCoordinate;
use std::io::Read;

/// HTTP repository of package descriptors.
///
/// Descriptors are fetched with `GET <url>/<descriptor_path>`; a 404 means the
/// repository does not carry the coordinate.
pub struct HttpRepository {
    config: HttpConfig,
    agent: ureq::Agent,
}

impl HttpRepository {
    pub fn new(config: HttpConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Self { config, agent }
    }

    pub fn url(&self, coordinate: &ModuleCoordinate) -> String {
        format!("{}/{}", self.config.url, descriptor_path(coordinate))
    }

    fn do_get(&self, url: &str) -> Result<Option<Vec<u8>>, MetadataError> {
        let mut req = self
            .agent
            .get(url)
            .header("Accept", "application/json");
        if let Some(ref token) = self.config.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        let resp = match req.call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(ureq::Error::StatusCode(code)) => {
                return Err(MetadataError::Http(format!("HTTP {code} for {url}")));
            }
            Err(ureq::Error::Timeout(t)) => {
                return Err(MetadataError::Timeout(format!("{url} ({t:?})")));
            }
            Err(e) => return Err(MetadataError::Http(e.to_string())),
        };

        let code = resp.status().as_u16();
        if code == 404 {
            return Ok(None);
        }
        if code >= 400 {
            return Err(MetadataError::Http(format!("HTTP {code} for {url}")));
        }

        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| MetadataError::Http(e.to_string()))?;
        Ok(Some(body))
    }
}

impl MetadataResolver for HttpRepository {
    fn name(&self) -> &str {
        &self.config.url
    }

    fn fetch(&self, coordinate: &ModuleCoordinate) -> Result<Option<ModuleMetadata>, MetadataError> {
        let url = self.url(coordinate);
        tracing::debug!("GET {url}");
        match self.do_get(&url)? {
            Some(body) => ModuleMetadata::from_bytes(coordinate, &body).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_descriptor_layout() {
        let repo = HttpRepository::new(HttpConfig::new("https://repo.example.com/releases/"));
        assert_eq!(
            repo.url(&ModuleCoordinate::new("com.acme", "ac_payment", "2.1.0")),
            "https://repo.example.com/releases/com/acme/ac_payment/2.1.0/ac_payment-2.1.0.json"
        );
        assert_eq!(repo.name(), "https://repo.example.com/releases");
    }

    #[test]
    fn connection_refused_returns_error() {
        let repo = HttpRepository::new(HttpConfig::new("http://127.0.0.1:1"));
        let result = repo.fetch(&ModuleCoordinate::new("g", "n", "1.0"));
        assert!(result.is_err());
    }
}
