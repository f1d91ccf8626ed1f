//! # twitchkit helix
//!
//! Declarative table of Twitch Helix endpoints.
//!
//! Each endpoint is an [`EndpointSpec`] constant naming its method, path,
//! required capability and scopes, and accepted parameters. Pass one to
//! [`HelixClient::call`](twitchkit_core::HelixClient::call):
//!
//! ```rust,ignore
//! use twitchkit_core::QueryParams;
//! use twitchkit_helix::GET_CHANNEL_EDITORS;
//!
//! let editors = client
//!     .call(&GET_CHANNEL_EDITORS, &QueryParams::new().scalar("broadcaster_id", "141981764"), None)
//!     .await?;
//! ```

mod endpoints;

pub use endpoints::*;
pub use twitchkit_core::EndpointSpec;

/// Every endpoint in the table.
pub const ALL: &[EndpointSpec] = &[
    GET_EXTENSION_ANALYTICS,
    GET_GAME_ANALYTICS,
    GET_BITS_LEADERBOARD,
    GET_CHEERMOTES,
    GET_EXTENSION_TRANSACTIONS,
    GET_CHANNEL_INFORMATION,
    MODIFY_CHANNEL_INFORMATION,
    START_COMMERCIAL,
    GET_CHANNEL_EDITORS,
    GET_FOLLOWED_CHANNELS,
    GET_CHANNEL_FOLLOWERS,
    CREATE_CUSTOM_REWARDS,
    DELETE_CUSTOM_REWARD,
    GET_CUSTOM_REWARD,
    GET_CUSTOM_REWARD_REDEMPTION,
    GET_CHATTERS,
    GET_CHANNEL_EMOTES,
    GET_GLOBAL_EMOTES,
    GET_CHANNEL_CHAT_BADGES,
    SEND_CHAT_ANNOUNCEMENT,
    CREATE_CLIP,
    GET_CLIPS,
    GET_DROPS_ENTITLEMENTS,
    GET_EXTENSION_LIVE_CHANNELS,
    GET_EXTENSION_CONFIGURATION_SEGMENT,
    SET_EXTENSION_CONFIGURATION_SEGMENT,
    SEND_EXTENSION_CHAT_MESSAGE,
    GET_TOP_GAMES,
    GET_GAMES,
    GET_BANNED_USERS,
    BAN_USER,
    GET_MODERATORS,
    SEARCH_CATEGORIES,
    SEARCH_CHANNELS,
    GET_STREAMS,
    GET_FOLLOWED_STREAMS,
    GET_STREAM_KEY,
    CREATE_STREAM_MARKER,
    GET_STREAM_MARKERS,
    GET_BROADCASTER_SUBSCRIPTIONS,
    GET_CHANNEL_TEAMS,
    GET_USERS,
    UPDATE_USER,
    GET_USER_BLOCK_LIST,
    GET_USER_EXTENSIONS,
    GET_VIDEOS,
    DELETE_VIDEOS,
];

pub fn all() -> &'static [EndpointSpec] {
    ALL
}

/// Look up an endpoint by its `name`.
pub fn find(name: &str) -> Option<&'static EndpointSpec> {
    ALL.iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use twitchkit_core::scope;

    use super::*;

    #[test]
    fn names_are_unique() {
        let mut seen = HashSet::new();
        for endpoint in all() {
            assert!(seen.insert(endpoint.name), "duplicate endpoint {}", endpoint.name);
        }
    }

    #[test]
    fn method_and_path_are_unique() {
        let mut seen = HashSet::new();
        for endpoint in all() {
            assert!(
                seen.insert((endpoint.method, endpoint.path)),
                "{} {} declared twice",
                endpoint.method,
                endpoint.path
            );
        }
    }

    #[test]
    fn scopes_are_known() {
        for endpoint in all() {
            for scope in endpoint.required_scopes {
                assert!(scope::is_supported(scope), "{}: unknown scope {scope}", endpoint.name);
            }
        }
    }

    #[test]
    fn paths_are_rooted() {
        for endpoint in all() {
            assert!(endpoint.path.starts_with('/'), "{}", endpoint.name);
            assert!(!endpoint.path.contains('?'), "{}", endpoint.name);
        }
    }

    #[test]
    fn paired_params_are_declared() {
        for endpoint in all() {
            for (a, b) in endpoint.paired_params {
                assert!(endpoint.accepts_param(a), "{}: {a}", endpoint.name);
                assert!(endpoint.accepts_param(b), "{}: {b}", endpoint.name);
            }
        }
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find("get_channel_editors"), Some(&GET_CHANNEL_EDITORS));
        assert_eq!(find("get_channel_editors").unwrap().path, "/channels/editors");
        assert!(find("no_such_endpoint").is_none());
    }
}
