//! Client for the Twitch token and validation endpoints.
//!
//! Token requests are single-shot: an unreachable endpoint or a non-2xx
//! response becomes [`Error::AuthAcquisition`] immediately. Validation never
//! fails outright; it reports [`Validation::Indeterminate`] instead so the
//! caller can keep its token and re-check later.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::classify::error_message;
use crate::error::{Error, Result};
use crate::scope::ScopeSet;
use crate::store::Secret;
use crate::token::{AccessToken, TokenType};
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, RequestBody};

/// Scopes come back as an array from Twitch, but as a space-delimited string
/// from some proxies and older deployments.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
enum ScopeField {
    List(Vec<String>),
    Delimited(String),
}

impl ScopeField {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(scopes) => scopes,
            Self::Delimited(s) => s.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// Successful token endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
    #[serde(default)]
    scope: Option<ScopeField>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

impl TokenResponse {
    /// Granted scopes, if the endpoint reported them.
    pub fn scopes(&self) -> Option<Vec<String>> {
        self.scope.clone().map(ScopeField::into_vec)
    }

    /// Build an [`AccessToken`] issued at `now`. Falls back to `requested`
    /// when the response carries no scope field.
    pub fn into_token(self, now: DateTime<Utc>, requested: &ScopeSet) -> Result<AccessToken> {
        if !self.token_type.eq_ignore_ascii_case("bearer") {
            return Err(Error::auth_acquisition(format!(
                "unexpected token type {}",
                self.token_type
            )));
        }

        let scopes = self
            .scope
            .map(ScopeField::into_vec)
            .unwrap_or_else(|| requested.to_vec());

        let lifetime = Duration::try_seconds(self.expires_in).ok_or_else(|| {
            Error::auth_acquisition(format!("expires_in {} is out of range", self.expires_in))
        })?;

        Ok(AccessToken::with_lifetime(
            Secret::new(self.access_token),
            TokenType::Bearer,
            now,
            lifetime,
        )?
        .with_scopes(scopes)
        .with_refresh_token(self.refresh_token.map(Secret::new)))
    }
}

/// How a token is requested.
#[derive(Clone, Copy)]
pub enum Grant<'a> {
    ClientCredentials,
    AuthorizationCode {
        code: &'a Secret,
        redirect_uri: &'a str,
    },
    RefreshToken {
        refresh_token: &'a Secret,
    },
}

impl Grant<'_> {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }
}

impl fmt::Debug for Grant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.grant_type())
    }
}

/// Result of a validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// 200
    Valid,
    /// 401
    Invalid,
    /// Anything else, including transport failures.
    Indeterminate(String),
}

/// Talks to the token and validation endpoints.
#[derive(Clone)]
pub struct TokenEndpoint {
    transport: Arc<dyn HttpTransport>,
    token_url: Url,
    validate_url: Url,
}

impl fmt::Debug for TokenEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEndpoint")
            .field("token_url", &self.token_url.as_str())
            .field("validate_url", &self.validate_url.as_str())
            .finish_non_exhaustive()
    }
}

impl TokenEndpoint {
    pub fn new(transport: Arc<dyn HttpTransport>, token_url: &str, validate_url: &str) -> Result<Self> {
        let token_url = Url::parse(token_url)
            .map_err(|e| Error::config(format!("invalid token URL {token_url}: {e}")))?;
        let validate_url = Url::parse(validate_url)
            .map_err(|e| Error::config(format!("invalid validate URL {validate_url}: {e}")))?;
        Ok(Self {
            transport,
            token_url,
            validate_url,
        })
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// POST a grant to the token endpoint.
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &Secret,
        scopes: &ScopeSet,
        grant: Grant<'_>,
    ) -> Result<AccessToken> {
        let mut form = vec![
            ("client_id".to_string(), client_id.to_string()),
            ("client_secret".to_string(), client_secret.expose().to_string()),
            ("grant_type".to_string(), grant.grant_type().to_string()),
        ];

        match grant {
            Grant::ClientCredentials => {
                if let Some(scope) = scopes.to_param() {
                    form.push(("scope".to_string(), scope));
                }
            }
            Grant::AuthorizationCode { code, redirect_uri } => {
                form.push(("code".to_string(), code.expose().to_string()));
                form.push(("redirect_uri".to_string(), redirect_uri.to_string()));
            }
            Grant::RefreshToken { refresh_token } => {
                form.push(("refresh_token".to_string(), refresh_token.expose().to_string()));
            }
        }

        debug!(grant = ?grant, url = %self.token_url, "requesting token");

        let request = HttpRequest::new(HttpMethod::Post, self.token_url.clone())
            .body(RequestBody::Form(form));

        let response = self.transport.execute(request).await.map_err(|e| {
            Error::auth_acquisition(format!("token endpoint unreachable: {e}"))
        })?;

        if !response.is_success() {
            return Err(Error::auth_acquisition(format!(
                "token endpoint returned {}: {}",
                response.status,
                error_message(response.status, &response.body)
            )));
        }

        let parsed: TokenResponse = serde_json::from_slice(&response.body)
            .map_err(|e| Error::auth_acquisition(format!("malformed token response: {e}")))?;

        let token = parsed.into_token(Utc::now(), scopes)?;
        info!(
            grant = ?grant,
            expires_at = %token.expires_at(),
            "acquired access token"
        );
        Ok(token)
    }

    /// Check a token against the validation endpoint.
    pub async fn validate(&self, token: &AccessToken) -> Validation {
        let request = HttpRequest::new(HttpMethod::Get, self.validate_url.clone())
            .header("Authorization", format!("OAuth {}", token.value().expose()));

        match self.transport.execute(request).await {
            Ok(response) if response.status == 200 => Validation::Valid,
            Ok(response) if response.status == 401 => Validation::Invalid,
            Ok(response) => Validation::Indeterminate(format!(
                "validation returned {}: {}",
                response.status,
                error_message(response.status, &response.body)
            )),
            Err(e) => Validation::Indeterminate(e.to_string()),
        }
    }
}
