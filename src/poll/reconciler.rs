//! Vote reconciliation.
//!
//! Tallies are always recomputed from the live reaction state; nothing
//! here caches across calls, because reactions can change at any moment.
//!
//! Two functionally equivalent modes: anchor-driven (exact message ids
//! loaded from the store) and discovery-driven (re-scan channel history
//! and re-parse the candidate lines, for when no anchor record survived).

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::VoteReactions;
use crate::error::Error;
use crate::poll::encoding::parse_option_line;
use crate::slack::{self, Reaction, SlackApi, SlackError};
use crate::store::{Anchor, MeetingOption};

/// Per-candidate vote tally with resolved display names.
///
/// Name lists are ordered by user id, so reconciliations over an unchanged
/// reaction state compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    /// 1-based candidate position.
    pub position: usize,

    /// Candidate label as published.
    pub text: String,

    /// Users who signalled "available".
    pub affirmative: Vec<String>,

    /// Users who signalled "unavailable".
    pub negative: Vec<String>,
}

/// Anchor-mode reconciliation: read each option's message directly.
///
/// Output is in option order. An option whose message can no longer be
/// read (deleted, or never anchored) yields an empty tally rather than
/// failing the whole call; transport failures still propagate.
pub async fn tally_anchors(
    slack: &dyn SlackApi,
    reactions: &VoteReactions,
    options: &[MeetingOption],
    anchors: &[Anchor],
) -> Result<Vec<VoteTally>, Error> {
    let bot_id = self_id(slack).await;

    let mut tallies = Vec::with_capacity(options.len());
    for option in options {
        let anchor = anchors.iter().find(|a| a.option_id == option.id);
        let raw = match anchor {
            Some(anchor) => match slack.get_reactions(&anchor.channel_id, &anchor.message_ts).await
            {
                Ok(raw) => raw,
                Err(err @ SlackError::Api(_)) => {
                    warn!(
                        option = option.id,
                        ts = %anchor.message_ts,
                        %err,
                        "anchored message unreadable; reporting empty tally"
                    );
                    Vec::new()
                }
                Err(err) => return Err(Error::platform("reading reactions", err)),
            },
            None => {
                warn!(option = option.id, "no anchor recorded; reporting empty tally");
                Vec::new()
            }
        };

        let (yes, no) = partition_votes(&raw, reactions, bot_id.as_deref());
        tallies.push(VoteTally {
            position: option.position as usize,
            text: option.text.clone(),
            affirmative: resolve_names(slack, &yes).await,
            negative: resolve_names(slack, &no).await,
        });
    }
    Ok(tallies)
}

/// Discovery-mode reconciliation: scan channel history within the lookback
/// window and re-parse candidate lines for `title`.
///
/// Messages that do not parse are other conversation and are skipped.
/// Output follows the messages' chronological order, which for a
/// sequentially published poll is the candidate order. An empty result
/// means no poll was found in the window; that is not an error.
pub async fn tally_history(
    slack: &dyn SlackApi,
    reactions: &VoteReactions,
    channel: &str,
    title: &str,
    lookback_hours: u32,
) -> Result<Vec<VoteTally>, Error> {
    if title.trim().is_empty() {
        return Err(Error::Validation("poll title must not be empty".to_string()));
    }
    if !slack::is_channel_id(channel) {
        return Err(Error::Configuration(format!(
            "'{channel}' does not look like a Slack channel id (expected e.g. C0123ABCD)"
        )));
    }

    let oldest_at = Utc::now() - Duration::hours(i64::from(lookback_hours));
    let oldest = format!("{}.000000", oldest_at.timestamp());
    let history = slack
        .list_history(channel, &oldest)
        .await
        .map_err(|e| Error::platform("scanning channel history", e))?;

    let bot_id = self_id(slack).await;

    let mut tallies = Vec::new();
    for message in &history {
        let Some((position, text)) = parse_option_line(title, &message.text) else {
            continue;
        };
        let (yes, no) = partition_votes(&message.reactions, reactions, bot_id.as_deref());
        tallies.push(VoteTally {
            position,
            text: text.to_string(),
            affirmative: resolve_names(slack, &yes).await,
            negative: resolve_names(slack, &no).await,
        });
    }

    debug!(
        channel,
        title,
        matched = tallies.len(),
        scanned = history.len(),
        "history tally complete"
    );
    Ok(tallies)
}

/// The bot's own identity, for self-exclusion. Failure to resolve means
/// nothing is excluded, not a failed reconciliation.
async fn self_id(slack: &dyn SlackApi) -> Option<String> {
    match slack.self_user_id().await {
        Ok(id) => Some(id),
        Err(err) => {
            warn!(%err, "could not resolve own identity; tallies may include the bot");
            None
        }
    }
}

/// Split raw reactions into affirmative/negative voter sets.
///
/// Users are deduplicated within each bucket, the bot itself is dropped,
/// and a user who reacted both ways counts as unavailable only (negative
/// wins; the rule is order-independent, so the tally does not depend on
/// the platform's reaction listing order).
fn partition_votes(
    raw: &[Reaction],
    rules: &VoteReactions,
    bot_id: Option<&str>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut affirmative = BTreeSet::new();
    let mut negative = BTreeSet::new();

    for reaction in raw {
        let bucket = if rules.is_affirmative(&reaction.name) {
            &mut affirmative
        } else if rules.is_negative(&reaction.name) {
            &mut negative
        } else {
            continue;
        };
        for user in &reaction.users {
            bucket.insert(user.clone());
        }
    }

    if let Some(bot) = bot_id {
        affirmative.remove(bot);
        negative.remove(bot);
    }

    let affirmative = &affirmative - &negative;
    (affirmative, negative)
}

/// Resolve user ids to display names, in user-id order. A failed lookup
/// falls back to the raw id.
async fn resolve_names(slack: &dyn SlackApi, users: &BTreeSet<String>) -> Vec<String> {
    let mut names = Vec::with_capacity(users.len());
    for user in users {
        match slack.resolve_display_name(user).await {
            Ok(name) => names.push(name),
            Err(err) => {
                debug!(user = user.as_str(), %err, "name lookup failed; using raw id");
                names.push(user.clone());
            }
        }
    }
    names
}
