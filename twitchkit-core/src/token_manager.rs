//! Token lifecycle management.
//!
//! [`TokenLifecycleManager`] owns the access token for one credential. On
//! every call it makes sure the token is present, unexpired and recently
//! validated, acquiring or refreshing it as needed.
//!
//! # Lifecycle
//!
//! - The first call loads the cached record. A usable cached token is
//!   validated right away, since another process issued it.
//! - An expired token is refreshed unconditionally.
//! - Otherwise the token is validated at most once per validation interval.
//!   A 401 triggers reacquisition; an inconclusive check keeps the token and
//!   retries validation on the next call.
//! - Signed credentials mint a new JWT locally whenever the previous one
//!   expires and are never cached or validated.
//!
//! The whole check runs under an async mutex, so concurrent callers share a
//! single in-flight acquisition.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::TokenCache;
use crate::error::{Error, Result};
use crate::model::{Capability, CodeExchange, Credential, UserCredential};
use crate::oauth::{Grant, TokenEndpoint, Validation, sign_extension_token};
use crate::token::AccessToken;

/// Default time between validation checks.
pub const DEFAULT_VALIDATION_INTERVAL_SECS: i64 = 60 * 60;

#[derive(Default)]
struct TokenState {
    token: Option<AccessToken>,
    /// `None` means validation is due on the next call.
    next_validation_at: Option<DateTime<Utc>>,
    /// The authorization code has been sent to the token endpoint.
    code_consumed: bool,
}

impl TokenState {
    fn validation_due(&self, now: DateTime<Utc>) -> bool {
        self.next_validation_at.is_none_or(|at| now >= at)
    }
}

pub struct TokenLifecycleManager {
    credential: Arc<Credential>,
    endpoint: TokenEndpoint,
    cache: TokenCache,
    validation_interval: Duration,
    state: Mutex<TokenState>,
}

impl fmt::Debug for TokenLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenLifecycleManager")
            .field("capability", &self.credential.capability())
            .field("client_id", &self.credential.client_id())
            .field("validation_interval", &self.validation_interval)
            .finish_non_exhaustive()
    }
}

impl TokenLifecycleManager {
    pub fn new(
        credential: Arc<Credential>,
        endpoint: TokenEndpoint,
        cache: TokenCache,
        validation_interval: Duration,
    ) -> Self {
        Self {
            credential,
            endpoint,
            cache,
            validation_interval,
            state: Mutex::new(TokenState::default()),
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// A token that is present, unexpired and validated within the current
    /// window.
    pub async fn ensure_valid_token(&self) -> Result<AccessToken> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if state.token.is_none() {
            match self.load_cached().await {
                Some(cached) if !cached.is_expired_at(now) => {
                    debug!(expires_at = %cached.expires_at(), "using cached token");
                    state.token = Some(cached);
                    state.next_validation_at = None;
                }
                Some(expired) => {
                    debug!(expired_at = %expired.expires_at(), "cached token has expired");
                    let fresh = self.acquire(&mut state, Some(&expired)).await?;
                    self.install(&mut state, fresh, now).await;
                }
                None => {
                    let fresh = self.acquire(&mut state, None).await?;
                    self.install(&mut state, fresh, now).await;
                }
            }
        }

        let Some(token) = state.token.clone() else {
            return Err(Error::auth_acquisition("no token available"));
        };

        if token.is_expired_at(now) {
            info!(expired_at = %token.expires_at(), "access token expired, refreshing");
            let fresh = self.acquire(&mut state, Some(&token)).await?;
            return Ok(self.install(&mut state, fresh, now).await);
        }

        if self.credential.capability() == Capability::SignedToken || !state.validation_due(now) {
            return Ok(token);
        }

        match self.endpoint.validate(&token).await {
            Validation::Valid => {
                debug!("access token validated");
                state.next_validation_at = Some(now + self.validation_interval);
                Ok(token)
            }
            Validation::Invalid => {
                info!("access token rejected by validation, reacquiring");
                let fresh = self.acquire(&mut state, Some(&token)).await?;
                Ok(self.install(&mut state, fresh, now).await)
            }
            Validation::Indeterminate(reason) => {
                warn!(reason = %reason, "token validation inconclusive, keeping current token");
                state.next_validation_at = None;
                Ok(token)
            }
        }
    }

    /// The held token, if any, without checking it.
    pub async fn current_token(&self) -> Option<AccessToken> {
        self.state.lock().await.token.clone()
    }

    /// Mark the held token as suspect so the next call validates it.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if state.token.is_some() {
            debug!("access token invalidated");
            state.next_validation_at = None;
        }
    }

    /// Drop the held token and its cached record. The next call acquires a
    /// new one.
    pub async fn forget(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.token = None;
        state.next_validation_at = None;
        if self.credential.capability() != Capability::SignedToken {
            self.cache.clear(&self.credential).await?;
        }
        info!("cached access token cleared");
        Ok(())
    }

    async fn load_cached(&self) -> Option<AccessToken> {
        match self.credential.as_ref() {
            Credential::Signed(_) => None,
            credential => self.cache.load(credential).await,
        }
    }

    /// Store a freshly acquired token and start a new validation window.
    async fn install(&self, state: &mut TokenState, token: AccessToken, now: DateTime<Utc>) -> AccessToken {
        if self.credential.capability() != Capability::SignedToken {
            self.cache.save(&self.credential, &token).await;
        }
        state.token = Some(token.clone());
        state.next_validation_at = Some(now + self.validation_interval);
        token
    }

    async fn acquire(&self, state: &mut TokenState, previous: Option<&AccessToken>) -> Result<AccessToken> {
        match self.credential.as_ref() {
            Credential::App(app) => {
                self.endpoint
                    .request_token(&app.client_id, &app.client_secret, &app.scopes, Grant::ClientCredentials)
                    .await
            }
            Credential::User(user) => self.acquire_user(state, user, previous).await,
            Credential::Signed(signed) => {
                let token = sign_extension_token(signed, Utc::now())?;
                debug!(expires_at = %token.expires_at(), "minted extension JWT");
                Ok(token)
            }
        }
    }

    async fn acquire_user(
        &self,
        state: &mut TokenState,
        user: &UserCredential,
        previous: Option<&AccessToken>,
    ) -> Result<AccessToken> {
        if let Some(refresh_token) = previous.and_then(AccessToken::refresh_token) {
            let refreshed = self
                .endpoint
                .request_token(
                    &user.client_id,
                    &user.client_secret,
                    &user.scopes,
                    Grant::RefreshToken { refresh_token },
                )
                .await;

            match refreshed {
                Ok(token) if token.refresh_token().is_none() => {
                    return Ok(token.with_refresh_token(Some(refresh_token.clone())));
                }
                Ok(token) => return Ok(token),
                Err(e) if self.unused_code(state, user).is_some() => {
                    warn!(error = %e, "refresh failed, falling back to authorization code");
                }
                Err(e) => return Err(e),
            }
        }

        let Some(code) = self.unused_code(state, user) else {
            return Err(Error::auth_acquisition(
                "no refresh token and no unused authorization code; complete the authorization flow again",
            ));
        };

        // Codes are single use, even when the exchange fails.
        state.code_consumed = true;
        self.endpoint
            .request_token(
                &user.client_id,
                &user.client_secret,
                &user.scopes,
                Grant::AuthorizationCode {
                    code,
                    redirect_uri: &user.redirect_uri,
                },
            )
            .await
    }

    fn unused_code<'a>(&self, state: &TokenState, user: &'a UserCredential) -> Option<&'a crate::store::Secret> {
        match &user.exchange {
            CodeExchange::Code(code) if !state.code_consumed => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeSet;
    use crate::store::MemoryStore;
    use crate::token::TokenType;
    use crate::transport::ReqwestTransport;

    fn manager(credential: Credential, store: Arc<MemoryStore>) -> TokenLifecycleManager {
        // Nothing listens here; any network access fails fast.
        let transport = Arc::new(ReqwestTransport::new(Some(std::time::Duration::from_secs(1))).unwrap());
        let endpoint = TokenEndpoint::new(
            transport,
            "http://127.0.0.1:1/oauth2/token",
            "http://127.0.0.1:1/oauth2/validate",
        )
        .unwrap();
        TokenLifecycleManager::new(
            Arc::new(credential),
            endpoint,
            TokenCache::new(store),
            Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn signed_credential_mints_without_network_or_cache() {
        let store = Arc::new(MemoryStore::new());
        let credential = Credential::signed("ext", "42", "ZXh0ZW5zaW9uLXNlY3JldA==", ScopeSet::empty());
        let manager = manager(credential, store.clone());

        let first = manager.ensure_valid_token().await.unwrap();
        let second = manager.ensure_valid_token().await.unwrap();

        assert_eq!(first.token_type(), TokenType::Jwt);
        assert_eq!(first, second);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn user_without_code_or_refresh_token_fails() {
        let credential = Credential::user("id", "secret", ScopeSet::empty(), "http://localhost", None);
        let manager = manager(credential, Arc::new(MemoryStore::new()));

        let err = manager.ensure_valid_token().await.unwrap_err();
        assert!(matches!(err, Error::AuthAcquisition { .. }));
        assert!(manager.current_token().await.is_none());
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_acquisition_error() {
        let credential = Credential::app("id", "secret", ScopeSet::empty());
        let manager = manager(credential, Arc::new(MemoryStore::new()));

        let err = manager.ensure_valid_token().await.unwrap_err();
        assert!(matches!(err, Error::AuthAcquisition { .. }));
    }

    #[tokio::test]
    async fn invalidate_without_token_is_noop() {
        let credential = Credential::app("id", "secret", ScopeSet::empty());
        let manager = manager(credential, Arc::new(MemoryStore::new()));
        manager.invalidate().await;
        assert!(manager.current_token().await.is_none());
    }
}
