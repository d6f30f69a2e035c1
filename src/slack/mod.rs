//! Slack Web API surface.
//!
//! A thin wrapper over the handful of Web API methods the poll lifecycle
//! needs: posting messages, attaching reactions, reading reactions and
//! channel history, and resolving user identities. The [`SlackApi`] trait
//! is the seam between the poll logic and the wire; the HTTP client in
//! `client` is the only non-test implementation.

mod client;
mod types;

pub use client::SlackClient;
pub use types::{HistoryMessage, PostedMessage, Reaction};

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

/// Result type for Slack operations.
pub type SlackResult<T> = Result<T, SlackError>;

/// Errors from the Slack Web API layer.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("network error: {0}")]
    Network(String),

    /// The platform rejected the call; the payload is Slack's
    /// machine-readable error code (e.g. `channel_not_found`).
    #[error("api error: {0}")]
    Api(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl SlackError {
    /// Machine-readable error code, when the platform supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            SlackError::Api(code) => Some(code),
            _ => None,
        }
    }
}

/// Primitive operations the poll lifecycle needs from Slack.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Post a plain message, returning its channel/timestamp identity.
    async fn post_message(&self, channel: &str, text: &str) -> SlackResult<PostedMessage>;

    /// Attach a named reaction as the bot. An `already_reacted` response
    /// from the platform is reported as success.
    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> SlackResult<()>;

    /// Current reactions on a single message.
    async fn get_reactions(&self, channel: &str, ts: &str) -> SlackResult<Vec<Reaction>>;

    /// Channel messages no older than `oldest` (a Slack `ts` value),
    /// oldest-first, with their current reactions.
    async fn list_history(&self, channel: &str, oldest: &str) -> SlackResult<Vec<HistoryMessage>>;

    /// Display name for a user: profile display name, falling back to the
    /// real name, falling back to the raw id.
    async fn resolve_display_name(&self, user_id: &str) -> SlackResult<String>;

    /// The bot's own user id. Implementations memoize this for the process
    /// lifetime on first success.
    async fn self_user_id(&self) -> SlackResult<String>;

    /// Shareable permalink for a message.
    async fn message_permalink(&self, channel: &str, ts: &str) -> SlackResult<String>;
}

/// Whether `value` has the shape of a Slack conversation id: `C0123ABCD`
/// (public), `G…` (private group) or `D…` (DM).
pub fn is_channel_id(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[CDG][A-Z0-9]{6,}$").expect("channel id regex"))
        .is_match(value)
}
