//! # twitchkit core
//!
//! Authenticated request layer for the Twitch Helix API.
//!
//! This crate provides:
//! - Credentials for the three Twitch auth flows (app, user, extension JWT)
//! - Token acquisition, caching, validation and refresh
//! - A retrying request dispatcher with a typed error taxonomy
//! - [`HelixClient`], which ties them together behind `request` and `call`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use twitchkit_core::{Credential, HelixClient, QueryParams, ScopeSet};
//! use twitchkit_helix::GET_USERS;
//!
//! let credential = Credential::app(client_id, client_secret, ScopeSet::empty());
//! let client = HelixClient::builder(credential).build().await?;
//! let users = client
//!     .call(&GET_USERS, &QueryParams::new().list("login", ["twitchdev"]), None)
//!     .await?;
//! ```

pub mod cache;
pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod gate;
pub mod model;
pub mod oauth;
pub mod scope;
pub mod store;
pub mod token;
pub mod token_manager;
pub mod transport;

// Re-export commonly used types at crate root
pub use model::{
    AppCredential,
    Capability,
    CapabilityRequirement,
    CodeExchange,
    Credential,
    SignedIdentityCredential,
    UserCredential,
};

pub use scope::ScopeSet;

pub use store::{
    FileStore,
    MemoryStore,
    Secret,
    SecretStore,
    StoreBackend,
    StoreError,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use token::{AccessToken, CachedTokenRecord, TokenType};

pub use cache::TokenCache;

pub use token_manager::TokenLifecycleManager;

pub use gate::{capability_satisfies, ensure_capability};

pub use transport::{
    HttpMethod,
    HttpRequest,
    HttpResponse,
    HttpTransport,
    RequestBody,
    ReqwestTransport,
    TransportError,
};

pub use dispatch::{Payload, QueryParams, QueryValue, RequestDispatcher, RequestSpec, RetryPolicy};

pub use classify::classify;

pub use endpoint::EndpointSpec;

pub use config::{ClientConfig, TokenCacheConfig};

pub use client::{HelixClient, HelixClientBuilder};

pub use error::{Error, ErrorEnvelope, ErrorKind, Result};
