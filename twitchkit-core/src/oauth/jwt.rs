//! Extension JWTs signed with the extension's shared secret.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::SignedIdentityCredential;
use crate::store::Secret;
use crate::token::{AccessToken, TokenType};

/// Role Twitch expects for requests signed by the extension backend.
pub const EXTERNAL_ROLE: &str = "external";

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtensionClaims {
    pub exp: i64,
    pub iat: i64,
    pub user_id: String,
    pub role: String,
}

/// Mint an HS256 JWT for `credential`, valid from `now` for its lifetime.
pub fn sign_extension_token(
    credential: &SignedIdentityCredential,
    now: DateTime<Utc>,
) -> Result<AccessToken> {
    let expires_at = now + credential.lifetime;

    let claims = ExtensionClaims {
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
        user_id: credential.owner_user_id.clone(),
        role: EXTERNAL_ROLE.to_string(),
    };

    let key = EncodingKey::from_base64_secret(credential.signing_key.expose())
        .map_err(|e| Error::auth_acquisition(format!("extension secret is not valid base64: {e}")))?;

    let jwt = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| Error::auth_acquisition(format!("failed to sign extension JWT: {e}")))?;

    Ok(
        AccessToken::new(Secret::new(jwt), TokenType::Jwt, now, expires_at)?
            .with_scopes(credential.scopes.to_vec()),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{DecodingKey, Validation};

    use super::*;
    use crate::model::Credential;
    use crate::scope::ScopeSet;

    // base64 of "extension-secret"
    const SECRET_B64: &str = "ZXh0ZW5zaW9uLXNlY3JldA==";

    fn credential() -> SignedIdentityCredential {
        match Credential::signed("ext-client", "12345", SECRET_B64, ScopeSet::empty()) {
            Credential::Signed(c) => c,
            _ => unreachable!(),
        }
    }

    #[test]
    fn signs_verifiable_claims() {
        let now = Utc::now();
        let token = sign_extension_token(&credential(), now).unwrap();

        assert_eq!(token.token_type(), TokenType::Jwt);
        assert_eq!(token.expires_at() - token.issued_at(), Duration::seconds(180));

        let decoded = jsonwebtoken::decode::<ExtensionClaims>(
            token.value().expose(),
            &DecodingKey::from_base64_secret(SECRET_B64).unwrap(),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(decoded.claims.user_id, "12345");
        assert_eq!(decoded.claims.role, "external");
        assert_eq!(decoded.claims.exp, (now + Duration::seconds(180)).timestamp());
    }

    #[test]
    fn invalid_secret_is_acquisition_error() {
        let mut cred = credential();
        cred.signing_key = Secret::new("not base64 !!");
        let err = sign_extension_token(&cred, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::AuthAcquisition { .. }));
    }
}
