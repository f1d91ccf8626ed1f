//! Secret storage abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`SecretStore`] - Trait for secret storage backends
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`FileStore`] - JSON file implementation, the default token cache
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select a backend from configuration
//!
//! # Storage Key Convention
//!
//! Token records are stored under `twitchkit/{capability}/{client_id}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use twitchkit_core::store::{MemoryStore, Secret, SecretStore};
//!
//! let store = MemoryStore::new();
//! store.set("twitchkit/app_access_token/abc", &Secret::new("{...}")).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod file;
mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the buffer is zeroed when the secret is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for secret store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

/// Abstraction over secret storage backends.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError>;

    /// Store a secret at the given key.
    ///
    /// Overwrites any existing value.
    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Delete a secret by key.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists without retrieving the value.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Which backend should hold cached tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local only; tokens are re-acquired after a restart.
    Memory,
    /// A JSON file at the given path.
    File(PathBuf),
    /// The OS keyring.
    Keyring,
}

/// Create a secret store for the requested backend.
///
/// Falls back to [`MemoryStore`] with a warning when the requested backend
/// cannot be opened, so a broken cache never prevents the client from
/// acquiring tokens.
pub async fn create_store(backend: &StoreBackend) -> Arc<dyn SecretStore> {
    match backend {
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory token storage");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File(path) => match FileStore::open(path.clone()).await {
            Ok(store) => {
                tracing::debug!(path = %path.display(), "Using file token storage");
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Token cache file unavailable, falling back to memory store. \
                     Tokens will not persist across restarts."
                );
                Arc::new(MemoryStore::new())
            }
        },
        StoreBackend::Keyring => keyring_or_memory(),
    }
}

#[cfg(feature = "keyring-store")]
fn keyring_or_memory() -> Arc<dyn SecretStore> {
    match KeyringStore::try_new("twitchkit") {
        Ok(store) => {
            tracing::info!("Using OS keyring for token storage");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "Keyring unavailable ({}), falling back to memory store. \
                 Tokens will not persist across restarts.",
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg(not(feature = "keyring-store"))]
fn keyring_or_memory() -> Arc<dyn SecretStore> {
    tracing::warn!(
        "Keyring storage requested but keyring-store feature not enabled. \
         Using memory store. Tokens will not persist across restarts."
    );
    Arc::new(MemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_secret_display_redacted() {
        let secret = Secret::new("super-secret");
        let display = format!("{}", secret);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_secret_into_inner() {
        let secret = Secret::new("abc");
        assert_eq!(secret.into_inner(), "abc");
    }

    #[tokio::test]
    async fn test_create_store_memory() {
        let store = create_store(&StoreBackend::Memory).await;

        let secret = Secret::new("test");
        store.set("test-key", &secret).await.unwrap();
        let retrieved = store.get("test-key").await.unwrap();
        assert_eq!(retrieved.unwrap().expose(), "test");
    }

    #[tokio::test]
    async fn test_create_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = create_store(&StoreBackend::File(path.clone())).await;

        store.set("k", &Secret::new("v")).await.unwrap();
        assert!(path.exists());
    }
}
