//! In-memory Slack double for unit tests.
//!
//! Behaves like a single workspace: posted messages get increasing `ts`
//! values, reactions accumulate per message, and the bot reacts under
//! [`BOT_USER`]. Failure switches let tests exercise the degradation
//! paths without a network.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::slack::{HistoryMessage, PostedMessage, Reaction, SlackApi, SlackError, SlackResult};

/// The double's own bot identity, as returned by `self_user_id`.
pub(crate) const BOT_USER: &str = "UBOT0001";

struct FakeMessage {
    channel: String,
    ts: String,
    text: String,
    /// Raw (name, user) pairs in arrival order; duplicates allowed, the
    /// way a noisy platform listing might repeat a user.
    reactions: Vec<(String, String)>,
}

#[derive(Default)]
struct FakeState {
    messages: Vec<FakeMessage>,
    seq: u64,
    post_calls: usize,
    fail_post_on_call: Option<usize>,
    fail_reactions: bool,
    fail_auth: bool,
    fail_permalinks: bool,
    users: BTreeMap<String, String>,
}

pub(crate) struct FakeSlack {
    state: Mutex<FakeState>,
    base_ts: i64,
}

impl FakeSlack {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            base_ts: chrono::Utc::now().timestamp() - 60,
        }
    }

    pub fn with_users(users: &[(&str, &str)]) -> Self {
        let fake = Self::new();
        {
            let mut state = fake.state.lock().unwrap();
            for (id, name) in users {
                state.users.insert(id.to_string(), name.to_string());
            }
        }
        fake
    }

    /// Make the n-th `post_message` call (1-based) fail.
    pub fn fail_post_on_call(&self, n: usize) {
        self.state.lock().unwrap().fail_post_on_call = Some(n);
    }

    pub fn fail_reactions(&self) {
        self.state.lock().unwrap().fail_reactions = true;
    }

    pub fn fail_auth(&self) {
        self.state.lock().unwrap().fail_auth = true;
    }

    pub fn fail_permalinks(&self) {
        self.state.lock().unwrap().fail_permalinks = true;
    }

    /// A user reacts to a message. Duplicates are recorded as-is.
    pub fn react(&self, ts: &str, name: &str, user: &str) {
        let mut state = self.state.lock().unwrap();
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.ts == ts)
            .expect("react: unknown message ts");
        message.reactions.push((name.to_string(), user.to_string()));
    }

    pub fn posted_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn post_call_count(&self) -> usize {
        self.state.lock().unwrap().post_calls
    }

    pub fn reactions_on(&self, ts: &str) -> Vec<Reaction> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .iter()
            .find(|m| m.ts == ts)
            .map(|m| group_reactions(&m.reactions))
            .unwrap_or_default()
    }
}

/// Group raw (name, user) pairs into per-name listings, preserving
/// first-seen name order and any duplicate users.
fn group_reactions(raw: &[(String, String)]) -> Vec<Reaction> {
    let mut grouped: Vec<Reaction> = Vec::new();
    for (name, user) in raw {
        match grouped.iter_mut().find(|r| &r.name == name) {
            Some(reaction) => reaction.users.push(user.clone()),
            None => grouped.push(Reaction {
                name: name.clone(),
                users: vec![user.clone()],
            }),
        }
    }
    grouped
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn post_message(&self, channel: &str, text: &str) -> SlackResult<PostedMessage> {
        let mut state = self.state.lock().unwrap();
        state.post_calls += 1;
        if state.fail_post_on_call == Some(state.post_calls) {
            return Err(SlackError::Api("fatal_error".to_string()));
        }

        state.seq += 1;
        let ts = format!("{}.{:06}", self.base_ts + state.seq as i64, state.seq);
        state.messages.push(FakeMessage {
            channel: channel.to_string(),
            ts: ts.clone(),
            text: text.to_string(),
            reactions: Vec::new(),
        });
        Ok(PostedMessage {
            channel: channel.to_string(),
            ts,
        })
    }

    async fn add_reaction(&self, _channel: &str, ts: &str, name: &str) -> SlackResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reactions {
            return Err(SlackError::Api("too_many_reactions".to_string()));
        }
        let Some(message) = state.messages.iter_mut().find(|m| m.ts == ts) else {
            return Err(SlackError::Api("message_not_found".to_string()));
        };
        let pair = (name.to_string(), BOT_USER.to_string());
        // Mirrors the client contract: reacting twice is still success.
        if !message.reactions.contains(&pair) {
            message.reactions.push(pair);
        }
        Ok(())
    }

    async fn get_reactions(&self, channel: &str, ts: &str) -> SlackResult<Vec<Reaction>> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .iter()
            .find(|m| m.channel == channel && m.ts == ts)
            .map(|m| group_reactions(&m.reactions))
            .ok_or_else(|| SlackError::Api("message_not_found".to_string()))
    }

    async fn list_history(&self, channel: &str, oldest: &str) -> SlackResult<Vec<HistoryMessage>> {
        let oldest: f64 = oldest
            .parse()
            .map_err(|_| SlackError::Api("invalid_ts_oldest".to_string()))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.channel == channel)
            .filter(|m| m.ts.parse::<f64>().map(|ts| ts >= oldest).unwrap_or(false))
            .map(|m| HistoryMessage {
                ts: m.ts.clone(),
                text: m.text.clone(),
                reactions: group_reactions(&m.reactions),
            })
            .collect())
    }

    async fn resolve_display_name(&self, user_id: &str) -> SlackResult<String> {
        let state = self.state.lock().unwrap();
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| SlackError::Api("user_not_found".to_string()))
    }

    async fn self_user_id(&self) -> SlackResult<String> {
        let state = self.state.lock().unwrap();
        if state.fail_auth {
            return Err(SlackError::Api("not_authed".to_string()));
        }
        Ok(BOT_USER.to_string())
    }

    async fn message_permalink(&self, channel: &str, ts: &str) -> SlackResult<String> {
        let state = self.state.lock().unwrap();
        if state.fail_permalinks {
            return Err(SlackError::Api("message_not_found".to_string()));
        }
        Ok(format!(
            "https://example.slack.com/archives/{}/p{}",
            channel,
            ts.replace('.', "")
        ))
    }
}
