//! The authenticated Helix session.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> twitchkit_core::Result<()> {
//! use twitchkit_core::{
//!     CapabilityRequirement, Credential, HelixClient, HttpMethod, QueryParams, ScopeSet,
//! };
//!
//! let credential = Credential::app("client-id", "client-secret", ScopeSet::empty());
//! let client = HelixClient::builder(credential).build().await?;
//!
//! let query = QueryParams::new().list("login", ["twitchdev"]);
//! let users = client
//!     .request(HttpMethod::Get, "/users", CapabilityRequirement::AppOrUser, &query, None)
//!     .await?;
//! println!("{:?}", users.data());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cache::TokenCache;
use crate::config::ClientConfig;
use crate::dispatch::{Payload, QueryParams, RequestDispatcher};
use crate::endpoint::EndpointSpec;
use crate::error::{Error, ErrorKind, Result};
use crate::gate::ensure_capability;
use crate::model::{CapabilityRequirement, Credential};
use crate::oauth::TokenEndpoint;
use crate::store::{SecretStore, create_store};
use crate::token::AccessToken;
use crate::token_manager::TokenLifecycleManager;
use crate::transport::{HttpMethod, HttpTransport, RequestBody, ReqwestTransport};

/// Builder for [`HelixClient`].
pub struct HelixClientBuilder {
    credential: Credential,
    config: ClientConfig,
    store: Option<Arc<dyn SecretStore>>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl HelixClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Token cache backend. Defaults to the backend named in the config.
    pub fn store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// HTTP transport for both API and token requests. Defaults to
    /// [`ReqwestTransport`] with the configured timeout.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub async fn build(self) -> Result<HelixClient> {
        self.config.validate()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new(self.config.request_timeout())
                    .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?,
            ),
        };

        let store = match self.store {
            Some(store) => store,
            None => create_store(&self.config.token_cache.backend()).await,
        };

        let credential = Arc::new(self.credential);
        let endpoint = TokenEndpoint::new(
            transport.clone(),
            &self.config.token_url,
            &self.config.validate_url,
        )?;
        let tokens = TokenLifecycleManager::new(
            credential.clone(),
            endpoint,
            TokenCache::new(store),
            self.config.validation_interval(),
        );
        let dispatcher = RequestDispatcher::new(
            transport,
            self.config.api_base_url.clone(),
            self.config.retry_policy()?,
        );

        debug!(
            capability = %credential.capability(),
            api = %self.config.api_base_url,
            "built Helix client"
        );

        Ok(HelixClient {
            credential,
            config: self.config,
            tokens,
            dispatcher,
        })
    }
}

/// An authenticated Helix session for one credential.
///
/// Safe to share across tasks; token refreshes are serialized internally.
#[derive(Debug)]
pub struct HelixClient {
    credential: Arc<Credential>,
    config: ClientConfig,
    tokens: TokenLifecycleManager,
    dispatcher: RequestDispatcher,
}

impl HelixClient {
    pub fn builder(credential: Credential) -> HelixClientBuilder {
        HelixClientBuilder {
            credential,
            config: ClientConfig::default(),
            store: None,
            transport: None,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The held access token, without validating or refreshing it.
    pub async fn current_token(&self) -> Option<AccessToken> {
        self.tokens.current_token().await
    }

    /// A valid access token, acquiring or refreshing as needed.
    pub async fn access_token(&self) -> Result<AccessToken> {
        self.tokens.ensure_valid_token().await
    }

    /// Forget the held token and delete its cached record, e.g. after the
    /// user revoked the app. Store failures are returned.
    pub async fn clear_cached_token(&self) -> Result<()> {
        self.tokens.forget().await
    }

    /// Authorization URL for a user credential.
    #[cfg(feature = "oauth")]
    pub fn authorize_url(&self, force_verify: bool) -> Result<crate::oauth::AuthorizationRequest> {
        match self.credential.as_ref() {
            Credential::User(user) => crate::oauth::authorize_url(
                &self.config.authorize_url,
                &self.config.token_url,
                user,
                force_verify,
            ),
            other => Err(Error::config(format!(
                "authorization URLs only apply to user credentials, not {}",
                other.capability()
            ))),
        }
    }

    /// Send an authenticated request.
    ///
    /// Checks `requirement` against the credential before touching the
    /// network. A 401 response marks the held token for revalidation.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        requirement: CapabilityRequirement,
        query: &QueryParams,
        body: Option<Value>,
    ) -> Result<Payload> {
        ensure_capability(path, requirement, self.credential.capability())?;

        let token = self.tokens.ensure_valid_token().await?;
        let spec = self
            .dispatcher
            .build_request(method, path, query, body.map(RequestBody::Json))?;

        let headers = vec![
            ("Authorization".to_string(), token.bearer_header()),
            ("Client-Id".to_string(), self.credential.client_id().to_string()),
        ];

        let result = self.dispatcher.dispatch(&spec, &headers).await;
        if let Err(err) = &result {
            if err.kind() == Some(ErrorKind::Unauthorized) {
                self.tokens.invalidate().await;
            }
        }
        result
    }

    /// Call a declared endpoint.
    ///
    /// Scopes, parameters and body are checked against `endpoint` before any
    /// network access.
    pub async fn call(
        &self,
        endpoint: &EndpointSpec,
        query: &QueryParams,
        body: Option<Value>,
    ) -> Result<Payload> {
        endpoint.check_scopes(self.credential.scopes())?;
        endpoint.check_params(query)?;
        let body = endpoint.prepare_body(body)?;
        ensure_capability(endpoint.name, endpoint.requirement, self.credential.capability())?;

        self.request(endpoint.method, endpoint.path, endpoint.requirement, query, body)
            .await
    }
}
