//! Client configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields a client talking to the production Twitch endpoints:
//!
//! ```toml
//! max_retries = 5
//! request_timeout_ms = 10000
//!
//! [token_cache]
//! backend = "file"
//! path = "/var/cache/my-bot/tokens.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::dispatch::{DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES, RetryPolicy};
use crate::error::{Error, Result};
use crate::oauth::{TWITCH_AUTHORIZE_URL, TWITCH_TOKEN_URL, TWITCH_VALIDATE_URL};
use crate::store::{FileStore, StoreBackend};
use crate::token_manager::DEFAULT_VALIDATION_INTERVAL_SECS;

/// Ten years; longer intervals are clamped.
const MAX_VALIDATION_INTERVAL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Helix API base URL.
pub const TWITCH_API_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Where cached tokens are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum TokenCacheConfig {
    Memory,
    /// JSON file; the platform cache directory when `path` is unset.
    File {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Keyring,
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self::File { path: None }
    }
}

impl TokenCacheConfig {
    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Memory => StoreBackend::Memory,
            Self::File { path: Some(path) } => StoreBackend::File(path.clone()),
            Self::File { path: None } => StoreBackend::File(
                FileStore::default_path().unwrap_or_else(|| PathBuf::from(".twitchkit/tokens.json")),
            ),
            Self::Keyring => StoreBackend::Keyring,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub token_url: String,
    pub validate_url: String,
    pub authorize_url: String,

    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,

    /// Exponential backoff base. Must be greater than 1.
    pub backoff_base: f64,

    /// Length of one backoff unit in milliseconds.
    pub backoff_unit_ms: u64,

    /// Per-attempt timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,

    /// Seconds between token validation checks.
    pub validation_interval_secs: u64,

    pub token_cache: TokenCacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: TWITCH_API_BASE_URL.to_string(),
            token_url: TWITCH_TOKEN_URL.to_string(),
            validate_url: TWITCH_VALIDATE_URL.to_string(),
            authorize_url: TWITCH_AUTHORIZE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_unit_ms: 1000,
            request_timeout_ms: Some(30_000),
            validation_interval_secs: DEFAULT_VALIDATION_INTERVAL_SECS as u64,
            token_cache: TokenCacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load `config.toml` from the platform config directory, or defaults if
    /// there is none.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded client configuration");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| Error::config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "raibid-labs", "twitchkit").map(|d| d.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_base_url", &self.api_base_url),
            ("token_url", &self.token_url),
            ("validate_url", &self.validate_url),
            ("authorize_url", &self.authorize_url),
        ] {
            Url::parse(value).map_err(|e| Error::config(format!("{name} {value:?} is not a URL: {e}")))?;
        }
        self.retry_policy()?;
        if self.validation_interval_secs == 0 {
            return Err(Error::config("validation_interval_secs must be positive"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.max_retries,
            self.backoff_base,
            Duration::from_millis(self.backoff_unit_ms),
        )
    }

    pub fn validation_interval(&self) -> chrono::Duration {
        let secs = self.validation_interval_secs.min(MAX_VALIDATION_INTERVAL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Point the token, validate and authorize URLs at another identity
    /// server, keeping Twitch's `/oauth2/...` layout.
    pub fn with_identity_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.token_url = format!("{base}/oauth2/token");
        self.validate_url = format!("{base}/oauth2/validate");
        self.authorize_url = format!("{base}/oauth2/authorize");
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, base: f64, unit: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_unit_ms = u64::try_from(unit.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_validation_interval_secs(mut self, secs: u64) -> Self {
        self.validation_interval_secs = secs;
        self
    }

    pub fn with_token_cache(mut self, cache: TokenCacheConfig) -> Self {
        self.token_cache = cache;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_base_url, "https://api.twitch.tv/helix");
        assert_eq!(config.retry_policy().unwrap().max_retries, 3);
        assert_eq!(config.validation_interval(), chrono::Duration::hours(1));
    }

    #[test]
    fn parses_cache_backend() {
        let config = ClientConfig::from_toml_str(
            r#"
            max_retries = 5

            [token_cache]
            backend = "file"
            path = "/tmp/tokens.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_retries, 5);
        assert_eq!(
            config.token_cache.backend(),
            StoreBackend::File(PathBuf::from("/tmp/tokens.json"))
        );

        let config = ClientConfig::from_toml_str("[token_cache]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.token_cache.backend(), StoreBackend::Memory);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ClientConfig::from_toml_str("backoff_base = 1.0").is_err());
        assert!(ClientConfig::from_toml_str("token_url = \"nope\"").is_err());
        assert!(ClientConfig::from_toml_str("validation_interval_secs = 0").is_err());
        assert!(ClientConfig::from_toml_str("unknown_key = 1").is_err());
    }

    #[test]
    fn identity_override_rewrites_oauth_urls() {
        let config = ClientConfig::default().with_identity_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.token_url, "http://127.0.0.1:8080/oauth2/token");
        assert_eq!(config.validate_url, "http://127.0.0.1:8080/oauth2/validate");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_timeout_ms = 5000\n").unwrap();

        let config = ClientConfig::load_from_path(&path).unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));

        assert!(ClientConfig::load_from_path(&dir.path().join("missing.toml")).is_err());
    }
}
