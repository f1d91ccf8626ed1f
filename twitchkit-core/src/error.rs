//! Top-level error types for twitchkit.

use std::fmt;

use thiserror::Error;

use crate::model::{Capability, CapabilityRequirement};
use crate::store::StoreError;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classification of a failed Helix response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 429
    TooManyRequests,
    /// Persistent 500, or any other unclassified non-2xx status.
    RemoteService,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::TooManyRequests => "too many requests",
            Self::RemoteService => "remote service error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed response: the original status, the decoded message, and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} ({status}): {message}")]
pub struct ErrorEnvelope {
    pub status: u16,
    pub message: String,
    pub kind: ErrorKind,
}

/// Top-level error type encompassing all twitchkit errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The active credential cannot make this call. Raised before any
    /// network access.
    #[error("{endpoint} requires {required}, but the client holds a {held}")]
    AuthorizationPrecondition {
        endpoint: String,
        required: CapabilityRequirement,
        held: Capability,
    },

    /// The credential was not granted a scope the endpoint needs.
    #[error("{endpoint} requires the <{scope}> scope")]
    MissingScope { endpoint: String, scope: String },

    /// A scope name Twitch does not recognise.
    #[error("scope <{scope}> is not supported by Twitch")]
    UnsupportedScope { scope: String },

    /// Parameters or body do not match the endpoint declaration.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The token endpoint was unreachable or rejected the credentials.
    #[error("token acquisition failed: {message}")]
    AuthAcquisition { message: String },

    /// Transport failure that survived every retry.
    #[error("network error after {attempts} attempt(s): {message}")]
    Network { attempts: u32, message: String },

    /// Non-success response from the API.
    #[error("{0}")]
    Api(#[from] ErrorEnvelope),

    /// A success response whose body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// Invalid client configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Error from an explicit token store operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// Kind of an API failure, `None` for every other error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api(envelope) => Some(envelope.kind),
            _ => None,
        }
    }

    /// HTTP status of an API failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(envelope) => Some(envelope.status),
            _ => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn auth_acquisition(message: impl Into<String>) -> Self {
        Self::AuthAcquisition {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_display_includes_status_and_message() {
        let err = Error::from(ErrorEnvelope {
            status: 401,
            message: "Invalid OAuth token".to_string(),
            kind: ErrorKind::Unauthorized,
        });
        assert_eq!(err.to_string(), "unauthorized (401): Invalid OAuth token");
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn non_api_errors_have_no_kind() {
        let err = Error::Network {
            attempts: 4,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.kind(), None);
        assert!(err.to_string().contains("4 attempt"));
    }
}
