//! HTTP implementation of [`SlackApi`] over the Slack Web API.

use super::types::{
    AuthTestResponse, HistoryMessage, HistoryResponse, PermalinkResponse, PostMessageResponse,
    PostedMessage, Reaction, ReactionsGetResponse, UserInfoResponse,
};
use super::{SlackApi, SlackError, SlackResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const API_BASE: &str = "https://slack.com/api";

/// Page size for `conversations.history`.
const HISTORY_PAGE_LIMIT: usize = 200;

/// Upper bound on history pages fetched per scan. The `oldest` bound does
/// the real work; this is a backstop against runaway cursors.
const MAX_HISTORY_PAGES: usize = 20;

/// Slack Web API client authenticated with a bot token (`xoxb-…`).
pub struct SlackClient {
    http: reqwest::Client,
    bot_token: String,
    /// Own user id, resolved once via `auth.test` and kept for the process
    /// lifetime. Failures are not cached; the next call retries.
    self_id: OnceCell<String>,
}

impl SlackClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            bot_token: bot_token.into(),
            self_id: OnceCell::new(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{API_BASE}/{method}")
    }

    /// Write-style call: POST with a JSON body.
    async fn call_json<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> SlackResult<T> {
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::Network(e.to_string()))?;

        Self::decode(method, response).await
    }

    /// Read-style call: GET with query parameters.
    async fn call_query<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> SlackResult<T> {
        let response = self
            .http
            .get(self.url(method))
            .bearer_auth(&self.bot_token)
            .query(params)
            .send()
            .await
            .map_err(|e| SlackError::Network(e.to_string()))?;

        Self::decode(method, response).await
    }

    async fn decode<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> SlackResult<T> {
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SlackError::Parse(e.to_string()))?;

        if json.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let code = json
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown_error");
            debug!(method, code, "slack api call rejected");
            return Err(SlackError::Api(code.to_string()));
        }

        serde_json::from_value(json).map_err(|e| SlackError::Parse(format!("{method}: {e}")))
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> SlackResult<PostedMessage> {
        let body = serde_json::json!({
            "channel": channel,
            "text": text,
        });
        let resp: PostMessageResponse = self.call_json("chat.postMessage", body).await?;
        Ok(PostedMessage {
            channel: resp.channel,
            ts: resp.ts,
        })
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> SlackResult<()> {
        let body = serde_json::json!({
            "channel": channel,
            "timestamp": ts,
            "name": name,
        });
        match self.call_json::<serde_json::Value>("reactions.add", body).await {
            Ok(_) => Ok(()),
            // The bot has already reacted; the affordance is present.
            Err(SlackError::Api(code)) if code == "already_reacted" => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn get_reactions(&self, channel: &str, ts: &str) -> SlackResult<Vec<Reaction>> {
        let resp: ReactionsGetResponse = self
            .call_query(
                "reactions.get",
                &[("channel", channel), ("timestamp", ts), ("full", "true")],
            )
            .await?;
        Ok(resp.message.reactions)
    }

    async fn list_history(&self, channel: &str, oldest: &str) -> SlackResult<Vec<HistoryMessage>> {
        let limit = HISTORY_PAGE_LIMIT.to_string();
        let mut messages = Vec::new();
        let mut next_cursor: Option<String> = None;

        for page in 0.. {
            if page >= MAX_HISTORY_PAGES {
                warn!(
                    channel,
                    pages = MAX_HISTORY_PAGES,
                    "history scan hit the page cap; older messages were not scanned"
                );
                break;
            }

            let cursor = next_cursor.take().unwrap_or_default();
            let mut params = vec![
                ("channel", channel),
                ("oldest", oldest),
                ("inclusive", "true"),
                ("limit", limit.as_str()),
            ];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.as_str()));
            }

            let resp: HistoryResponse = self.call_query("conversations.history", &params).await?;
            messages.extend(resp.messages);

            next_cursor = resp
                .response_metadata
                .map(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            if !resp.has_more || next_cursor.is_none() {
                break;
            }
        }

        // The API pages newest-first; callers want chronological order.
        messages.reverse();
        Ok(messages)
    }

    async fn resolve_display_name(&self, user_id: &str) -> SlackResult<String> {
        let resp: UserInfoResponse = self.call_query("users.info", &[("user", user_id)]).await?;
        let name = if !resp.user.profile.display_name.is_empty() {
            resp.user.profile.display_name
        } else {
            resp.user.real_name
        };
        if name.is_empty() {
            Ok(user_id.to_string())
        } else {
            Ok(name)
        }
    }

    async fn self_user_id(&self) -> SlackResult<String> {
        let id = self
            .self_id
            .get_or_try_init(|| async {
                let resp: AuthTestResponse =
                    self.call_json("auth.test", serde_json::json!({})).await?;
                Ok::<_, SlackError>(resp.user_id)
            })
            .await?;
        Ok(id.clone())
    }

    async fn message_permalink(&self, channel: &str, ts: &str) -> SlackResult<String> {
        let resp: PermalinkResponse = self
            .call_query(
                "chat.getPermalink",
                &[("channel", channel), ("message_ts", ts)],
            )
            .await?;
        Ok(resp.permalink)
    }
}
