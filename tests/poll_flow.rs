//! End-to-end poll lifecycle against an in-memory Slack double.
//!
//! Exercises the public API the way the presentation layer uses it:
//! publish a poll, let users react, pull tallies in both anchor and
//! discovery mode (including after a simulated restart), and announce the
//! decision.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use huddle::config::PollSettings;
use huddle::poll::PollEngine;
use huddle::slack::{HistoryMessage, PostedMessage, Reaction, SlackApi, SlackError, SlackResult};
use huddle::store::MeetingStore;
use huddle::Error;

const CHANNEL: &str = "C0123ABCD";
const BOT: &str = "UBOT0001";

struct Message {
    channel: String,
    ts: String,
    text: String,
    reactions: Vec<(String, String)>,
}

#[derive(Default)]
struct Workspace {
    messages: Vec<Message>,
    seq: u64,
    post_calls: usize,
    users: BTreeMap<String, String>,
}

/// Minimal Slack workspace double: growing message list, reactions,
/// user directory, and a fixed bot identity.
struct FakeWorkspace {
    state: Mutex<Workspace>,
    base_ts: i64,
}

impl FakeWorkspace {
    fn new(users: &[(&str, &str)]) -> Self {
        let mut state = Workspace::default();
        for (id, name) in users {
            state.users.insert(id.to_string(), name.to_string());
        }
        Self {
            state: Mutex::new(state),
            base_ts: chrono::Utc::now().timestamp() - 60,
        }
    }

    fn react(&self, ts: &str, name: &str, user: &str) {
        let mut state = self.state.lock().unwrap();
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.ts == ts)
            .expect("react: unknown ts");
        message.reactions.push((name.to_string(), user.to_string()));
    }

    fn post_calls(&self) -> usize {
        self.state.lock().unwrap().post_calls
    }
}

fn group(raw: &[(String, String)]) -> Vec<Reaction> {
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
impl SlackApi for FakeWorkspace {
    async fn post_message(&self, channel: &str, text: &str) -> SlackResult<PostedMessage> {
        let mut state = self.state.lock().unwrap();
        state.post_calls += 1;
        state.seq += 1;
        let ts = format!("{}.{:06}", self.base_ts + state.seq as i64, state.seq);
        state.messages.push(Message {
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
        let Some(message) = state.messages.iter_mut().find(|m| m.ts == ts) else {
            return Err(SlackError::Api("message_not_found".to_string()));
        };
        let pair = (name.to_string(), BOT.to_string());
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
            .map(|m| group(&m.reactions))
            .ok_or_else(|| SlackError::Api("message_not_found".to_string()))
    }

    async fn list_history(&self, channel: &str, oldest: &str) -> SlackResult<Vec<HistoryMessage>> {
        let oldest: f64 = oldest.parse().unwrap_or(0.0);
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.channel == channel)
            .filter(|m| m.ts.parse::<f64>().map(|ts| ts >= oldest).unwrap_or(false))
            .map(|m| HistoryMessage {
                ts: m.ts.clone(),
                text: m.text.clone(),
                reactions: group(&m.reactions),
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
        Ok(BOT.to_string())
    }

    async fn message_permalink(&self, channel: &str, ts: &str) -> SlackResult<String> {
        Ok(format!(
            "https://example.slack.com/archives/{}/p{}",
            channel,
            ts.replace('.', "")
        ))
    }
}

fn workspace() -> Arc<FakeWorkspace> {
    Arc::new(FakeWorkspace::new(&[
        ("U00001", "alice"),
        ("U00002", "bob"),
        ("U00003", "carol"),
    ]))
}

#[tokio::test]
async fn test_publish_then_tally_both_modes_end_to_end() {
    let slack = workspace();
    let store = MeetingStore::in_memory().await.unwrap();
    let engine = PollEngine::new(slack.clone(), store.clone(), PollSettings::default());

    let published = engine
        .publish(
            CHANNEL,
            "Sync",
            &["Mon 10:00".to_string(), "Tue 14:00".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(published.anchors.len(), 2);

    // Fresh poll: same length and order as the input, all buckets empty.
    let (_, fresh) = engine.tally_meeting(published.meeting.id).await.unwrap();
    assert_eq!(fresh.len(), 2);
    assert!(fresh.iter().all(|t| t.affirmative.is_empty() && t.negative.is_empty()));

    // Votes arrive, interleaved with unrelated conversation.
    slack.react(&published.anchors[0].message_ts, "white_check_mark", "U00001");
    slack.react(&published.anchors[0].message_ts, "white_check_mark", "U00002");
    slack.react(&published.anchors[1].message_ts, "x", "U00003");
    slack.post_message(CHANNEL, "anyone up for lunch?").await.unwrap();

    let (_, tallies) = engine.tally_meeting(published.meeting.id).await.unwrap();
    assert_eq!(tallies[0].text, "Mon 10:00");
    assert_eq!(tallies[0].affirmative, vec!["alice", "bob"]);
    assert!(tallies[0].negative.is_empty());
    assert_eq!(tallies[1].text, "Tue 14:00");
    assert!(tallies[1].affirmative.is_empty());
    assert_eq!(tallies[1].negative, vec!["carol"]);

    // Discovery mode over the same channel agrees exactly.
    let discovered = engine.tally_discovered(CHANNEL, "Sync", None).await.unwrap();
    assert_eq!(discovered, tallies);
}

#[tokio::test]
async fn test_tally_survives_process_restart() {
    let slack = workspace();
    let store = MeetingStore::in_memory().await.unwrap();

    let meeting_id = {
        let engine = PollEngine::new(slack.clone(), store.clone(), PollSettings::default());
        let published = engine
            .publish(CHANNEL, "Standup", &["Wed 09:00".to_string()])
            .await
            .unwrap();
        slack.react(&published.anchors[0].message_ts, "white_check_mark", "U00001");
        published.meeting.id
    };

    // A new engine over the same store (a restarted process) tallies from
    // the persisted anchors alone.
    let engine = PollEngine::new(slack.clone(), store, PollSettings::default());
    let (meeting, tallies) = engine.tally_meeting(meeting_id).await.unwrap();
    assert_eq!(meeting.title, "Standup");
    assert_eq!(tallies[0].affirmative, vec!["alice"]);
}

#[tokio::test]
async fn test_empty_option_list_never_reaches_slack() {
    let slack = workspace();
    let store = MeetingStore::in_memory().await.unwrap();
    let engine = PollEngine::new(slack.clone(), store, PollSettings::default());

    let err = engine.publish(CHANNEL, "Sync", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(slack.post_calls(), 0);
}

#[tokio::test]
async fn test_announce_returns_locator() {
    let slack = workspace();
    let store = MeetingStore::in_memory().await.unwrap();
    let engine = PollEngine::new(slack.clone(), store, PollSettings::default());

    let url = url::Url::parse("https://meet.example.com/sync").unwrap();
    let locator = engine
        .announce(CHANNEL, "Mon 10:00", Some(&url))
        .await
        .unwrap();

    assert_eq!(locator.channel_id, CHANNEL);
    assert!(locator.permalink.as_deref().unwrap().contains("example.slack.com"));

    let state_text = {
        let state = slack.state.lock().unwrap();
        state.messages.last().unwrap().text.clone()
    };
    assert!(state_text.contains("Mon 10:00"));
    assert!(state_text.ends_with("Meeting URL: https://meet.example.com/sync"));
}
