//! Access tokens and their persisted form.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::store::Secret;

/// Current [`CachedTokenRecord`] layout.
pub const RECORD_FORMAT_VERSION: u32 = 1;

/// How the token is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// OAuth bearer token from the token endpoint.
    Bearer,
    /// Locally signed extension JWT.
    Jwt,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::Jwt => "jwt",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("bearer") {
            Some(Self::Bearer)
        } else if s.eq_ignore_ascii_case("jwt") {
            Some(Self::Jwt)
        } else {
            None
        }
    }
}

/// A bearer credential with a known lifetime.
///
/// Tokens are immutable: a refresh produces a new `AccessToken` that replaces
/// the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: Secret,
    token_type: TokenType,
    scopes: Vec<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    refresh_token: Option<Secret>,
}

impl AccessToken {
    /// Create a token. Fails unless `expires_at` is after `issued_at`.
    pub fn new(
        value: Secret,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self> {
        if expires_at <= issued_at {
            return Err(Error::auth_acquisition(format!(
                "token expires at {expires_at}, which is not after its issue time {issued_at}"
            )));
        }
        Ok(Self {
            value,
            token_type,
            scopes: Vec::new(),
            issued_at,
            expires_at,
            refresh_token: None,
        })
    }

    /// Create a token that lives for `expires_in` from `issued_at`.
    pub fn with_lifetime(
        value: Secret,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> Result<Self> {
        let expires_at = issued_at.checked_add_signed(expires_in).ok_or_else(|| {
            Error::auth_acquisition(format!("token lifetime {expires_in} is out of range"))
        })?;
        Self::new(value, token_type, issued_at, expires_at)
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<Secret>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn value(&self) -> &Secret {
        &self.value
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn refresh_token(&self) -> Option<&Secret> {
        self.refresh_token.as_ref()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Value for the `Authorization` header of a Helix request.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.value.expose())
    }
}

/// Why a cached record was rejected. Never surfaced; every variant is a miss.
#[derive(Debug, Error)]
pub(crate) enum CacheError {
    #[error("record is not valid: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record format version {found} is not supported")]
    Version { found: u32 },

    #[error("record is inconsistent: {0}")]
    Inconsistent(String),
}

/// Serialized form of an [`AccessToken`].
///
/// Every field is required (including `refresh_token`, which may be `null`)
/// and unknown fields are rejected, so a truncated or foreign record fails
/// to decode instead of producing a partial token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CachedTokenRecord {
    pub format_version: u32,
    pub value: String,
    /// Lifetime in seconds at issue time.
    pub expires_in: i64,
    pub scope: Vec<String>,
    pub token_type: String,
    pub bearer: bool,
    /// Unix seconds.
    pub expires_at: i64,
    /// Unix seconds.
    pub issued_at: i64,
    #[serde(deserialize_with = "Option::deserialize")]
    pub refresh_token: Option<String>,
}

impl CachedTokenRecord {
    pub fn from_token(token: &AccessToken) -> Self {
        let issued_at = token.issued_at.timestamp();
        let expires_at = token.expires_at.timestamp();
        Self {
            format_version: RECORD_FORMAT_VERSION,
            value: token.value.expose().to_string(),
            expires_in: expires_at - issued_at,
            scope: token.scopes.clone(),
            token_type: token.token_type.as_str().to_string(),
            bearer: token.token_type == TokenType::Bearer,
            expires_at,
            issued_at,
            refresh_token: token.refresh_token.as_ref().map(|s| s.expose().to_string()),
        }
    }

    pub(crate) fn decode(raw: &str) -> std::result::Result<AccessToken, CacheError> {
        let record: Self = serde_json::from_str(raw)?;
        record.into_token()
    }

    pub(crate) fn encode(token: &AccessToken) -> std::result::Result<String, CacheError> {
        Ok(serde_json::to_string(&Self::from_token(token))?)
    }

    fn into_token(self) -> std::result::Result<AccessToken, CacheError> {
        if self.format_version != RECORD_FORMAT_VERSION {
            return Err(CacheError::Version {
                found: self.format_version,
            });
        }
        if self.value.is_empty() {
            return Err(CacheError::Inconsistent("empty token value".into()));
        }

        let token_type = TokenType::parse(&self.token_type).ok_or_else(|| {
            CacheError::Inconsistent(format!("unknown token type {}", self.token_type))
        })?;
        if self.bearer != (token_type == TokenType::Bearer) {
            return Err(CacheError::Inconsistent(
                "bearer flag disagrees with token type".into(),
            ));
        }

        if self.expires_at.checked_sub(self.issued_at) != Some(self.expires_in) {
            return Err(CacheError::Inconsistent(
                "expires_in disagrees with timestamps".into(),
            ));
        }

        let issued_at = timestamp(self.issued_at)?;
        let expires_at = timestamp(self.expires_at)?;

        let token = AccessToken::new(Secret::new(self.value), token_type, issued_at, expires_at)
            .map_err(|e| CacheError::Inconsistent(e.to_string()))?;

        Ok(token
            .with_scopes(self.scope)
            .with_refresh_token(self.refresh_token.map(Secret::new)))
    }
}

fn timestamp(secs: i64) -> std::result::Result<DateTime<Utc>, CacheError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| CacheError::Inconsistent(format!("timestamp {secs} out of range")))
}
