//! Domain model types for twitchkit.
//!
//! This module defines the credential types a client session is built from:
//! - [`Capability`] - The class of token a credential can produce
//! - [`CapabilityRequirement`] - What an endpoint demands of the caller
//! - [`Credential`] - One of the three Twitch authentication flows
//!
//! Each credential variant carries only the fields its flow needs, so the
//! rest of the crate dispatches on the variant instead of inspecting types at
//! runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scope::ScopeSet;
use crate::store::Secret;

/// The class of access token a credential produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// App access token from the client credentials flow.
    AppAccessToken,

    /// User access token from the authorization code flow.
    UserOAuthToken,

    /// Locally signed extension JWT.
    SignedToken,
}

impl Capability {
    /// Get the capability as a string for storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppAccessToken => "app_access_token",
            Self::UserOAuthToken => "user_oauth_token",
            Self::SignedToken => "signed_token",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability an endpoint requires. Every call declares exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityRequirement {
    /// Only an app access token.
    App,

    /// Only a user access token.
    User,

    /// Only a signed extension JWT.
    Signed,

    /// Either an app or a user access token.
    AppOrUser,
}

impl fmt::Display for CapabilityRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::App => "an app access token",
            Self::User => "a user OAuth token",
            Self::Signed => "a signed JWT",
            Self::AppOrUser => "an app access token or user OAuth token",
        };
        f.write_str(s)
    }
}

/// Client credentials flow: an app token with no user context.
#[derive(Debug, Clone)]
pub struct AppCredential {
    pub client_id: String,
    pub client_secret: Secret,
    pub scopes: ScopeSet,
}

/// Where a user credential is in the authorization code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeExchange {
    /// The user has not completed the authorization redirect yet. Tokens can
    /// only come from the cache (via their refresh token).
    AwaitingCode,

    /// An authorization code received on the redirect, not yet exchanged.
    Code(Secret),
}

/// Authorization code flow: a token acting on behalf of a user.
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub client_id: String,
    pub client_secret: Secret,
    pub scopes: ScopeSet,
    pub redirect_uri: String,
    pub exchange: CodeExchange,
}

/// Extension JWT flow: tokens are signed locally with the extension secret.
#[derive(Debug, Clone)]
pub struct SignedIdentityCredential {
    /// Extension client id, sent as the `Client-Id` header.
    pub client_id: String,

    /// User id of the extension owner, placed in the `user_id` claim.
    pub owner_user_id: String,

    /// Base64-encoded extension secret.
    pub signing_key: Secret,

    pub scopes: ScopeSet,

    /// How long each minted JWT stays valid.
    pub lifetime: chrono::Duration,
}

/// Default lifetime of a minted extension JWT.
pub const DEFAULT_SIGNED_TOKEN_LIFETIME_SECS: i64 = 3 * 60;

/// One of the three supported authentication modes.
///
/// Created once per client session and never mutated; the token it produces
/// is owned by the token manager.
#[derive(Debug, Clone)]
pub enum Credential {
    App(AppCredential),
    User(UserCredential),
    Signed(SignedIdentityCredential),
}

impl Credential {
    /// Client credentials flow.
    pub fn app(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: ScopeSet,
    ) -> Self {
        Self::App(AppCredential {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
            scopes,
        })
    }

    /// Authorization code flow. Pass `None` for `code` when tokens will come
    /// from the cache only.
    pub fn user(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: ScopeSet,
        redirect_uri: impl Into<String>,
        code: Option<String>,
    ) -> Self {
        Self::User(UserCredential {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
            scopes,
            redirect_uri: redirect_uri.into(),
            exchange: match code {
                Some(code) => CodeExchange::Code(Secret::new(code)),
                None => CodeExchange::AwaitingCode,
            },
        })
    }

    /// Extension JWT flow with the default token lifetime.
    pub fn signed(
        client_id: impl Into<String>,
        owner_user_id: impl Into<String>,
        signing_key: impl Into<String>,
        scopes: ScopeSet,
    ) -> Self {
        Self::Signed(SignedIdentityCredential {
            client_id: client_id.into(),
            owner_user_id: owner_user_id.into(),
            signing_key: Secret::new(signing_key),
            scopes,
            lifetime: chrono::Duration::seconds(DEFAULT_SIGNED_TOKEN_LIFETIME_SECS),
        })
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::App(_) => Capability::AppAccessToken,
            Self::User(_) => Capability::UserOAuthToken,
            Self::Signed(_) => Capability::SignedToken,
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            Self::App(c) => &c.client_id,
            Self::User(c) => &c.client_id,
            Self::Signed(c) => &c.client_id,
        }
    }

    pub fn scopes(&self) -> &ScopeSet {
        match self {
            Self::App(c) => &c.scopes,
            Self::User(c) => &c.scopes,
            Self::Signed(c) => &c.scopes,
        }
    }

    /// Key under which this credential's token is cached.
    pub fn cache_key(&self) -> String {
        format!("twitchkit/{}/{}", self.capability(), self.client_id())
    }
}
