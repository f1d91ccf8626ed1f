//! Twitch OAuth flows.
//!
//! - [`grant`] - Token endpoint client: client credentials, authorization
//!   code and refresh grants, plus token validation
//! - [`jwt`] - Locally signed extension JWTs
//! - [`authorize`] - Authorization URL for the user flow (with the `oauth`
//!   feature)

pub mod grant;
pub mod jwt;

#[cfg(feature = "oauth")]
pub mod authorize;

pub use grant::{Grant, TokenEndpoint, TokenResponse, Validation};
pub use jwt::sign_extension_token;

#[cfg(feature = "oauth")]
pub use authorize::{AuthorizationRequest, authorize_url};

/// Twitch token endpoint.
pub const TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Twitch token validation endpoint.
pub const TWITCH_VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";

/// Twitch authorization endpoint for the user flow.
pub const TWITCH_AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
