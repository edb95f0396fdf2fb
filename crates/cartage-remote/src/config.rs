use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for an [`HttpRepository`](crate::HttpRepository).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl HttpConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            auth_token: None,
            timeout: default_timeout(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pick up a bearer token from [`TOKEN_ENV_VAR`](crate::TOKEN_ENV_VAR) when set.
    #[must_use]
    pub fn with_token_from_env(self) -> Self {
        match std::env::var(crate::TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => self.with_token(token.trim()),
            _ => self,
        }
    }
}
