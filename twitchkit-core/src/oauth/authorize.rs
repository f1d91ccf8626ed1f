//! Authorization URL for the user (authorization code) flow.
//!
//! The user visits the URL, approves the requested scopes, and Twitch
//! redirects to the credential's redirect URI with `code` and `state`. The
//! code is then passed to [`Credential::user`](crate::Credential::user).

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope, TokenUrl};
use url::Url;

use crate::error::{Error, Result};
use crate::model::UserCredential;

/// An authorization URL and the CSRF state embedded in it.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    /// Compare against the `state` query parameter on the redirect.
    pub state: String,
}

/// Build the authorize URL for `credential`.
///
/// With `force_verify`, Twitch asks the user to re-approve even if they
/// already authorized the application.
pub fn authorize_url(
    authorize_endpoint: &str,
    token_endpoint: &str,
    credential: &UserCredential,
    force_verify: bool,
) -> Result<AuthorizationRequest> {
    let auth_url = AuthUrl::new(authorize_endpoint.to_string())
        .map_err(|e| Error::config(format!("invalid authorize URL: {e}")))?;
    let token_url = TokenUrl::new(token_endpoint.to_string())
        .map_err(|e| Error::config(format!("invalid token URL: {e}")))?;
    let redirect_url = RedirectUrl::new(credential.redirect_uri.clone())
        .map_err(|e| Error::config(format!("invalid redirect URI: {e}")))?;

    let client = BasicClient::new(
        ClientId::new(credential.client_id.clone()),
        None,
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect_url);

    let mut request = client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(credential.scopes.iter().map(|s| Scope::new(s.to_string())));

    if force_verify {
        request = request.add_extra_param("force_verify", "true");
    }

    let (url, state) = request.url();

    Ok(AuthorizationRequest {
        url,
        state: state.secret().to_string(),
    })
}
