//! Client configuration with builder pattern
//!
//! Holds everything needed to talk to one Gravity Forms site: the REST base
//! URL, the API key pair, the per-request timeout and the debug toggle.

use std::fmt;
use std::time::Duration;

use super::constants::DEFAULT_TIMEOUT_SECS;

/// API key pair, sent as HTTP Basic credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Immutable configuration for an [`ApiClient`](super::ApiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub debug: bool,
}

impl ClientConfig {
    /// Create a new builder for ClientConfig
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Load configuration from the environment (and `.env` if present)
    ///
    /// Reads `GF_API_URL`, `GF_API_KEY`, `GF_API_SECRET`, and optionally
    /// `GF_TIMEOUT_SECS` and `GF_DEBUG`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("GF_API_URL")?;
        let key = std::env::var("GF_API_KEY")?;
        let secret = std::env::var("GF_API_SECRET")?;

        let mut builder = Self::builder()
            .base_url(base_url)
            .credentials(key, secret);

        if let Ok(timeout) = std::env::var("GF_TIMEOUT_SECS") {
            let secs: u64 = timeout
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid GF_TIMEOUT_SECS '{}': {}", timeout, e))?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Ok(debug) = std::env::var("GF_DEBUG") {
            builder = builder.debug(matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }

        builder.build()
    }
}

/// Builder for ClientConfig
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    credentials: Option<Credentials>,
    timeout: Duration,
    debug: bool,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            debug: false,
        }
    }

    /// REST base URL, e.g. `https://example.com/wp-json/gf/v2`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(key, secret));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable request/response tracing through the `log` facade
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn build(self) -> anyhow::Result<ClientConfig> {
        let base_url = self
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Missing API base URL"))?;

        let credentials = self
            .credentials
            .ok_or_else(|| anyhow::anyhow!("Missing API credentials"))?;
        if credentials.key.is_empty() {
            anyhow::bail!("Missing API key");
        }

        Ok(ClientConfig {
            base_url,
            credentials,
            timeout: self.timeout,
            debug: self.debug,
        })
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder()
            .base_url("https://example.com/wp-json/gf/v2/")
            .credentials("ck_key", "cs_secret")
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://example.com/wp-json/gf/v2");
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!(!config.debug);
        assert_eq!(config.credentials.key, "ck_key");
    }

    #[test]
    fn test_builder_requires_url_and_key() {
        assert!(ClientConfig::builder().credentials("k", "s").build().is_err());
        assert!(ClientConfig::builder().base_url("   ").credentials("k", "s").build().is_err());
        assert!(ClientConfig::builder().base_url("https://x").build().is_err());
        assert!(
            ClientConfig::builder()
                .base_url("https://x")
                .credentials("", "s")
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let rendered = format!("{:?}", Credentials::new("ck_key", "cs_very_secret"));
        assert!(rendered.contains("ck_key"));
        assert!(!rendered.contains("cs_very_secret"));
    }
}
