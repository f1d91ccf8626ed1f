//! Helix endpoint declarations, grouped as in the Twitch API reference.

use twitchkit_core::{CapabilityRequirement::*, EndpointSpec, HttpMethod::*};

// Analytics

pub const GET_EXTENSION_ANALYTICS: EndpointSpec =
    EndpointSpec::new("get_extension_analytics", Get, "/analytics/extensions", User)
        .scopes(&["analytics:read:extensions"])
        .optional(&["extension_id", "type", "started_at", "ended_at", "after", "first"])
        .paired(&[("started_at", "ended_at")]);

pub const GET_GAME_ANALYTICS: EndpointSpec =
    EndpointSpec::new("get_game_analytics", Get, "/analytics/games", User)
        .scopes(&["analytics:read:games"])
        .optional(&["game_id", "type", "started_at", "ended_at", "after", "first"])
        .paired(&[("started_at", "ended_at")]);

// Bits

pub const GET_BITS_LEADERBOARD: EndpointSpec =
    EndpointSpec::new("get_bits_leaderboard", Get, "/bits/leaderboard", User)
        .scopes(&["bits:read"])
        .optional(&["count", "period", "started_at", "user_id"]);

pub const GET_CHEERMOTES: EndpointSpec =
    EndpointSpec::new("get_cheermotes", Get, "/bits/cheermotes", AppOrUser)
        .optional(&["broadcaster_id"]);

pub const GET_EXTENSION_TRANSACTIONS: EndpointSpec =
    EndpointSpec::new("get_extension_transactions", Get, "/extensions/transactions", App)
        .required(&["extension_id"])
        .optional(&["id", "after", "first"]);

// Channels

pub const GET_CHANNEL_INFORMATION: EndpointSpec =
    EndpointSpec::new("get_channel_information", Get, "/channels", AppOrUser)
        .required(&["broadcaster_id"]);

pub const MODIFY_CHANNEL_INFORMATION: EndpointSpec =
    EndpointSpec::new("modify_channel_information", Patch, "/channels", User)
        .scopes(&["channel:manage:broadcast"])
        .required(&["broadcaster_id"])
        .body(
            &[],
            &[
                "game_id",
                "broadcaster_language",
                "title",
                "delay",
                "tags",
                "content_classification_labels",
                "is_branded_content",
            ],
        );

pub const START_COMMERCIAL: EndpointSpec =
    EndpointSpec::new("start_commercial", Post, "/channels/commercial", User)
        .scopes(&["channel:edit:commercial"])
        .body(&["broadcaster_id", "length"], &[]);

pub const GET_CHANNEL_EDITORS: EndpointSpec =
    EndpointSpec::new("get_channel_editors", Get, "/channels/editors", User)
        .scopes(&["channel:read:editors"])
        .required(&["broadcaster_id"]);

pub const GET_FOLLOWED_CHANNELS: EndpointSpec =
    EndpointSpec::new("get_followed_channels", Get, "/channels/followed", User)
        .scopes(&["user:read:follows"])
        .required(&["user_id"])
        .optional(&["broadcaster_id", "first", "after"]);

pub const GET_CHANNEL_FOLLOWERS: EndpointSpec =
    EndpointSpec::new("get_channel_followers", Get, "/channels/followers", User)
        .scopes(&["moderator:read:followers"])
        .required(&["broadcaster_id"])
        .optional(&["user_id", "first", "after"]);

// Channel points

pub const CREATE_CUSTOM_REWARDS: EndpointSpec =
    EndpointSpec::new("create_custom_rewards", Post, "/channel_points/custom_rewards", User)
        .scopes(&["channel:manage:redemptions"])
        .required(&["broadcaster_id"])
        .body(
            &["title", "cost"],
            &[
                "prompt",
                "is_enabled",
                "background_color",
                "is_user_input_required",
                "is_max_per_stream_enabled",
                "max_per_stream",
                "is_max_per_user_per_stream_enabled",
                "max_per_user_per_stream",
                "is_global_cooldown_enabled",
                "global_cooldown_seconds",
                "should_redemptions_skip_request_queue",
            ],
        );

pub const DELETE_CUSTOM_REWARD: EndpointSpec =
    EndpointSpec::new("delete_custom_reward", Delete, "/channel_points/custom_rewards", User)
        .scopes(&["channel:manage:redemptions"])
        .required(&["broadcaster_id", "id"]);

pub const GET_CUSTOM_REWARD: EndpointSpec =
    EndpointSpec::new("get_custom_reward", Get, "/channel_points/custom_rewards", User)
        .scopes(&["channel:read:redemptions"])
        .required(&["broadcaster_id"])
        .optional(&["id", "only_manageable_rewards"]);

pub const GET_CUSTOM_REWARD_REDEMPTION: EndpointSpec = EndpointSpec::new(
    "get_custom_reward_redemption",
    Get,
    "/channel_points/custom_rewards/redemptions",
    User,
)
.scopes(&["channel:read:redemptions"])
.required(&["broadcaster_id", "reward_id"])
.optional(&["status", "id", "sort", "after", "first"]);

// Chat

pub const GET_CHATTERS: EndpointSpec =
    EndpointSpec::new("get_chatters", Get, "/chat/chatters", User)
        .scopes(&["moderator:read:chatters"])
        .required(&["broadcaster_id", "moderator_id"])
        .optional(&["first", "after"]);

pub const GET_CHANNEL_EMOTES: EndpointSpec =
    EndpointSpec::new("get_channel_emotes", Get, "/chat/emotes", AppOrUser)
        .required(&["broadcaster_id"]);

pub const GET_GLOBAL_EMOTES: EndpointSpec =
    EndpointSpec::new("get_global_emotes", Get, "/chat/emotes/global", AppOrUser);

pub const GET_CHANNEL_CHAT_BADGES: EndpointSpec =
    EndpointSpec::new("get_channel_chat_badges", Get, "/chat/badges", AppOrUser)
        .required(&["broadcaster_id"]);

pub const SEND_CHAT_ANNOUNCEMENT: EndpointSpec =
    EndpointSpec::new("send_chat_announcement", Post, "/chat/announcements", User)
        .scopes(&["moderator:manage:announcements"])
        .required(&["broadcaster_id", "moderator_id"])
        .body(&["message"], &["color"]);

// Clips

pub const CREATE_CLIP: EndpointSpec = EndpointSpec::new("create_clip", Post, "/clips", User)
    .scopes(&["clips:edit"])
    .required(&["broadcaster_id"])
    .optional(&["has_delay"]);

pub const GET_CLIPS: EndpointSpec = EndpointSpec::new("get_clips", Get, "/clips", AppOrUser)
    .optional(&[
        "broadcaster_id",
        "game_id",
        "id",
        "started_at",
        "ended_at",
        "first",
        "before",
        "after",
        "is_featured",
    ]);

// Entitlements

pub const GET_DROPS_ENTITLEMENTS: EndpointSpec =
    EndpointSpec::new("get_drops_entitlements", Get, "/entitlements/drops", AppOrUser)
        .optional(&["id", "user_id", "game_id", "fulfillment_status", "after", "first"]);

// Extensions

pub const GET_EXTENSION_LIVE_CHANNELS: EndpointSpec =
    EndpointSpec::new("get_extension_live_channels", Get, "/extensions/live", AppOrUser)
        .required(&["extension_id"])
        .optional(&["first", "after"]);

pub const GET_EXTENSION_CONFIGURATION_SEGMENT: EndpointSpec = EndpointSpec::new(
    "get_extension_configuration_segment",
    Get,
    "/extensions/configurations",
    Signed,
)
.required(&["extension_id", "segment"])
.optional(&["broadcaster_id"]);

pub const SET_EXTENSION_CONFIGURATION_SEGMENT: EndpointSpec = EndpointSpec::new(
    "set_extension_configuration_segment",
    Put,
    "/extensions/configurations",
    Signed,
)
.body(&["extension_id", "segment"], &["broadcaster_id", "content", "version"]);

pub const SEND_EXTENSION_CHAT_MESSAGE: EndpointSpec =
    EndpointSpec::new("send_extension_chat_message", Post, "/extensions/chat", Signed)
        .required(&["broadcaster_id"])
        .body(&["text", "extension_id", "extension_version"], &[]);

// Games

pub const GET_TOP_GAMES: EndpointSpec =
    EndpointSpec::new("get_top_games", Get, "/games/top", AppOrUser)
        .optional(&["first", "after", "before"]);

pub const GET_GAMES: EndpointSpec = EndpointSpec::new("get_games", Get, "/games", AppOrUser)
    .optional(&["id", "name", "igdb_id"]);

// Moderation

pub const GET_BANNED_USERS: EndpointSpec =
    EndpointSpec::new("get_banned_users", Get, "/moderation/banned", User)
        .scopes(&["moderation:read"])
        .required(&["broadcaster_id"])
        .optional(&["user_id", "first", "after", "before"]);

pub const BAN_USER: EndpointSpec = EndpointSpec::new("ban_user", Post, "/moderation/bans", User)
    .scopes(&["moderator:manage:banned_users"])
    .required(&["broadcaster_id", "moderator_id"])
    .body(&["data"], &[]);

pub const GET_MODERATORS: EndpointSpec =
    EndpointSpec::new("get_moderators", Get, "/moderation/moderators", User)
        .scopes(&["moderation:read"])
        .required(&["broadcaster_id"])
        .optional(&["user_id", "first", "after"]);

// Search

pub const SEARCH_CATEGORIES: EndpointSpec =
    EndpointSpec::new("search_categories", Get, "/search/categories", AppOrUser)
        .required(&["query"])
        .optional(&["first", "after"]);

pub const SEARCH_CHANNELS: EndpointSpec =
    EndpointSpec::new("search_channels", Get, "/search/channels", AppOrUser)
        .required(&["query"])
        .optional(&["live_only", "first", "after"]);

// Streams

pub const GET_STREAMS: EndpointSpec = EndpointSpec::new("get_streams", Get, "/streams", AppOrUser)
    .optional(&[
        "user_id",
        "user_login",
        "game_id",
        "type",
        "language",
        "first",
        "before",
        "after",
    ]);

pub const GET_FOLLOWED_STREAMS: EndpointSpec =
    EndpointSpec::new("get_followed_streams", Get, "/streams/followed", User)
        .scopes(&["user:read:follows"])
        .required(&["user_id"])
        .optional(&["first", "after"]);

pub const GET_STREAM_KEY: EndpointSpec =
    EndpointSpec::new("get_stream_key", Get, "/streams/key", User)
        .scopes(&["channel:read:stream_key"])
        .required(&["broadcaster_id"]);

pub const CREATE_STREAM_MARKER: EndpointSpec =
    EndpointSpec::new("create_stream_marker", Post, "/streams/markers", User)
        .scopes(&["channel:manage:broadcast"])
        .body(&["user_id"], &["description"]);

pub const GET_STREAM_MARKERS: EndpointSpec =
    EndpointSpec::new("get_stream_markers", Get, "/streams/markers", User)
        .scopes(&["user:read:broadcast"])
        .optional(&["user_id", "video_id", "first", "before", "after"]);

// Subscriptions

pub const GET_BROADCASTER_SUBSCRIPTIONS: EndpointSpec =
    EndpointSpec::new("get_broadcaster_subscriptions", Get, "/subscriptions", User)
        .scopes(&["channel:read:subscriptions"])
        .required(&["broadcaster_id"])
        .optional(&["user_id", "first", "after", "before"]);

// Teams

pub const GET_CHANNEL_TEAMS: EndpointSpec =
    EndpointSpec::new("get_channel_teams", Get, "/teams/channel", AppOrUser)
        .required(&["broadcaster_id"]);

// Users

pub const GET_USERS: EndpointSpec = EndpointSpec::new("get_users", Get, "/users", AppOrUser)
    .optional(&["id", "login"]);

pub const UPDATE_USER: EndpointSpec = EndpointSpec::new("update_user", Put, "/users", User)
    .scopes(&["user:edit"])
    .optional(&["description"]);

pub const GET_USER_BLOCK_LIST: EndpointSpec =
    EndpointSpec::new("get_user_block_list", Get, "/users/blocks", User)
        .scopes(&["user:read:blocked_users"])
        .required(&["broadcaster_id"])
        .optional(&["first", "after"]);

pub const GET_USER_EXTENSIONS: EndpointSpec =
    EndpointSpec::new("get_user_extensions", Get, "/users/extensions/list", User)
        .scopes(&["user:read:broadcast"]);

// Videos

pub const GET_VIDEOS: EndpointSpec = EndpointSpec::new("get_videos", Get, "/videos", AppOrUser)
    .optional(&[
        "id", "user_id", "game_id", "language", "period", "sort", "type", "first", "after",
        "before",
    ]);

pub const DELETE_VIDEOS: EndpointSpec =
    EndpointSpec::new("delete_videos", Delete, "/videos", User)
        .scopes(&["channel:manage:videos"])
        .required(&["id"]);
