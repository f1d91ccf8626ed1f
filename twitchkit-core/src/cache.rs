//! Persistent token cache.
//!
//! Wraps a [`SecretStore`] and stores one [`CachedTokenRecord`] per
//! credential. Reads never fail: a missing, unreadable or corrupt record is
//! a miss. Writes log and move on.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::Credential;
use crate::store::{Secret, SecretStore, StoreError};
use crate::token::{AccessToken, CachedTokenRecord};

#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn SecretStore>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}

impl TokenCache {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Cached token for `credential`, or `None` on any kind of miss.
    pub async fn load(&self, credential: &Credential) -> Option<AccessToken> {
        let key = credential.cache_key();

        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "no cached token");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "token cache unreadable, treating as miss");
                return None;
            }
        };

        match CachedTokenRecord::decode(raw.expose()) {
            Ok(token) => {
                debug!(key = %key, expires_at = %token.expires_at(), "loaded cached token");
                Some(token)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "discarding corrupt cached token");
                None
            }
        }
    }

    /// Persist `token`. Failures are logged, never returned.
    pub async fn save(&self, credential: &Credential, token: &AccessToken) {
        let key = credential.cache_key();

        let raw = match CachedTokenRecord::encode(token) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode token for cache");
                return;
            }
        };

        if let Err(e) = self.store.set(&key, &Secret::new(raw)).await {
            warn!(key = %key, error = %e, "failed to persist token");
        }
    }

    /// Remove the cached token for `credential`. Unlike reads and writes,
    /// a failure here is returned to the caller.
    pub async fn clear(&self, credential: &Credential) -> Result<(), StoreError> {
        let key = credential.cache_key();
        self.store.delete(&key).await?;
        debug!(key = %key, "cleared cached token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::scope::ScopeSet;
    use crate::store::MemoryStore;
    use crate::token::TokenType;

    fn credential() -> Credential {
        Credential::app("client", "secret", ScopeSet::empty())
    }

    fn token() -> AccessToken {
        AccessToken::with_lifetime(
            Secret::new("abc"),
            TokenType::Bearer,
            Utc::now(),
            Duration::hours(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_load() {
        let cache = TokenCache::new(Arc::new(MemoryStore::new()));
        let token = token();

        cache.save(&credential(), &token).await;
        let loaded = cache.load(&credential()).await.unwrap();

        assert_eq!(loaded.value().expose(), "abc");
        assert_eq!(loaded.expires_at().timestamp(), token.expires_at().timestamp());
    }

    #[tokio::test]
    async fn corrupt_record_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(&credential().cache_key(), &Secret::new("{\"value\":\"abc\"}"))
            .await
            .unwrap();

        let cache = TokenCache::new(store);
        assert!(cache.load(&credential()).await.is_none());
    }

    #[tokio::test]
    async fn records_are_keyed_per_credential() {
        let cache = TokenCache::new(Arc::new(MemoryStore::new()));
        cache.save(&credential(), &token()).await;

        let other = Credential::app("other-client", "secret", ScopeSet::empty());
        assert!(cache.load(&other).await.is_none());

        cache.clear(&credential()).await.unwrap();
        assert!(cache.load(&credential()).await.is_none());
    }
}
