//! Wire types for the Slack Web API methods the crate calls.

use serde::Deserialize;

/// Identity of a message accepted by Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    /// Slack message timestamp (`"1722860000.000100"`), the message's id
    /// within its channel.
    pub ts: String,
}

/// One reaction name with everyone who used it.
#[derive(Debug, Clone, Deserialize)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub users: Vec<String>,
}

/// A channel history entry with its current reactions.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub ts: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

// Response envelopes, private to the HTTP client. Slack returns payload
// fields at the top level next to `ok`/`error`, so each envelope mirrors
// just the fields we read.

#[derive(Debug, Deserialize)]
pub(super) struct PostMessageResponse {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReactionsGetResponse {
    pub message: ReactedMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReactedMessage {
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserInfoResponse {
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserInfo {
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UserProfile {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthTestResponse {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PermalinkResponse {
    pub permalink: String,
}
