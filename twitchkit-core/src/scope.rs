//! OAuth scopes recognised by Twitch.
//!
//! Credentials are built with a [`ScopeSet`], which rejects scope names
//! Twitch does not know about and warns about legacy v5 scopes.

use std::fmt;

use crate::error::{Error, Result};

/// Scopes accepted by the Helix API.
pub const SUPPORTED_SCOPES: &[&str] = &[
    "analytics:read:extensions",
    "analytics:read:games",
    "bits:read",
    "channel:bot",
    "channel:edit:commercial",
    "channel:manage:ads",
    "channel:manage:broadcast",
    "channel:manage:extensions",
    "channel:manage:guest_star",
    "channel:manage:moderators",
    "channel:manage:polls",
    "channel:manage:predictions",
    "channel:manage:raids",
    "channel:manage:redemptions",
    "channel:manage:schedule",
    "channel:manage:videos",
    "channel:manage:vips",
    "channel:moderate",
    "channel:read:ads",
    "channel:read:charity",
    "channel:read:editors",
    "channel:read:goals",
    "channel:read:guest_star",
    "channel:read:hype_train",
    "channel:read:polls",
    "channel:read:predictions",
    "channel:read:redemptions",
    "channel:read:stream_key",
    "channel:read:subscriptions",
    "channel:read:vips",
    "chat:edit",
    "chat:read",
    "clips:edit",
    "moderation:read",
    "moderator:manage:announcements",
    "moderator:manage:automod",
    "moderator:manage:automod_settings",
    "moderator:manage:banned_users",
    "moderator:manage:blocked_terms",
    "moderator:manage:chat_messages",
    "moderator:manage:chat_settings",
    "moderator:manage:shield_mode",
    "moderator:manage:shoutouts",
    "moderator:read:automod_settings",
    "moderator:read:blocked_terms",
    "moderator:read:chat_settings",
    "moderator:read:chatters",
    "moderator:read:followers",
    "moderator:read:shield_mode",
    "moderator:read:shoutouts",
    "openid",
    "user:bot",
    "user:edit",
    "user:edit:broadcast",
    "user:manage:blocked_users",
    "user:manage:chat_color",
    "user:manage:whispers",
    "user:read:blocked_users",
    "user:read:broadcast",
    "user:read:chat",
    "user:read:email",
    "user:read:follows",
    "user:read:moderated_channels",
    "user:read:subscriptions",
    "user:write:chat",
    "whispers:edit",
    "whispers:read",
];

/// Scopes from the retired v5 API. Still accepted by the token endpoint.
pub const LEGACY_V5_SCOPES: &[&str] = &[
    "channel_check_subscription",
    "channel_commercial",
    "channel_editor",
    "channel_feed_edit",
    "channel_feed_read",
    "channel_read",
    "channel_stream",
    "channel_subscriptions",
    "collections_edit",
    "communities_edit",
    "communities_moderate",
    "user_blocks_edit",
    "user_blocks_read",
    "user_follows_edit",
    "user_read",
    "user_subscriptions",
    "viewing_activity_read",
];

pub fn is_supported(scope: &str) -> bool {
    SUPPORTED_SCOPES.contains(&scope)
}

pub fn is_legacy(scope: &str) -> bool {
    LEGACY_V5_SCOPES.contains(&scope)
}

/// An ordered, de-duplicated set of validated scope names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    /// Validate and collect scopes.
    ///
    /// Unknown scopes fail with [`Error::UnsupportedScope`]. Legacy v5 scopes
    /// are kept but logged.
    pub fn new<I, S>(scopes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Vec::new();
        let mut legacy = Vec::new();

        for scope in scopes {
            let scope = scope.into();
            if !is_supported(&scope) && !is_legacy(&scope) {
                return Err(Error::UnsupportedScope { scope });
            }
            if is_legacy(&scope) {
                legacy.push(scope.clone());
            }
            if !set.contains(&scope) {
                set.push(scope);
            }
        }

        if !legacy.is_empty() {
            tracing::warn!(
                scopes = ?legacy,
                "scopes belong to the legacy v5 API, switch to their Helix equivalents"
            );
        }

        Ok(Self(set))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Space-delimited form used by the token and authorize endpoints.
    ///
    /// `None` when the set is empty, so the parameter can be left out.
    pub fn to_param(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.join(" "))
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_helix_scopes() {
        let set = ScopeSet::new(["bits:read", "chat:read"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("bits:read"));
        assert_eq!(set.to_param().as_deref(), Some("bits:read chat:read"));
    }

    #[test]
    fn rejects_unknown_scope() {
        let err = ScopeSet::new(["bits:read", "bits:write"]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedScope { scope } if scope == "bits:write"));
    }

    #[test]
    fn accepts_legacy_scopes() {
        let set = ScopeSet::new(["user_read"]).unwrap();
        assert!(set.contains("user_read"));
    }

    #[test]
    fn deduplicates_preserving_order() {
        let set = ScopeSet::new(["chat:read", "bits:read", "chat:read"]).unwrap();
        assert_eq!(set.to_vec(), vec!["chat:read", "bits:read"]);
    }

    #[test]
    fn empty_set_has_no_param() {
        assert_eq!(ScopeSet::empty().to_param(), None);
    }

    #[test]
    fn supported_list_has_no_duplicates() {
        let mut sorted = SUPPORTED_SCOPES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), SUPPORTED_SCOPES.len());
    }
}
