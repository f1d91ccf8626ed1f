//! Capability checks performed before any network access.

use crate::error::{Error, Result};
use crate::model::{Capability, CapabilityRequirement};

/// Whether a credential holding `held` may make a call declaring `required`.
pub fn capability_satisfies(required: CapabilityRequirement, held: Capability) -> bool {
    match required {
        CapabilityRequirement::App => held == Capability::AppAccessToken,
        CapabilityRequirement::User => held == Capability::UserOAuthToken,
        CapabilityRequirement::Signed => held == Capability::SignedToken,
        CapabilityRequirement::AppOrUser => matches!(
            held,
            Capability::AppAccessToken | Capability::UserOAuthToken
        ),
    }
}

/// Fail with [`Error::AuthorizationPrecondition`] unless `held` satisfies
/// `required`.
pub fn ensure_capability(
    endpoint: &str,
    required: CapabilityRequirement,
    held: Capability,
) -> Result<()> {
    if capability_satisfies(required, held) {
        Ok(())
    } else {
        Err(Error::AuthorizationPrecondition {
            endpoint: endpoint.to_string(),
            required,
            held,
        })
    }
}
