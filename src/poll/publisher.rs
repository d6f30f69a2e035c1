//! Poll publisher.
//!
//! Turns a meeting title and its ordered options into channel messages: one
//! intro line, then exactly one message per option with the two voting
//! reactions pre-attached. Posting is sequential, so the candidate index
//! embedded in each message always matches its position.

use tracing::{debug, info, warn};

use crate::config::VoteReactions;
use crate::error::Error;
use crate::poll::encoding::encode_option_line;
use crate::slack::{self, SlackApi};
use crate::store::{Anchor, MeetingOption};

/// Post a poll for `title` to `channel`.
///
/// Returns one [`Anchor`] per option, in option order. If posting fails
/// partway, the already-posted messages stay up (message deletion is not
/// assumed available) and [`Error::PartialPublish`] reports how many
/// options made it out; no further options are attempted.
pub async fn publish_poll(
    slack: &dyn SlackApi,
    reactions: &VoteReactions,
    channel: &str,
    title: &str,
    options: &[MeetingOption],
) -> Result<Vec<Anchor>, Error> {
    if title.trim().is_empty() {
        return Err(Error::Validation("poll title must not be empty".to_string()));
    }
    if options.is_empty() {
        return Err(Error::Validation(
            "poll needs at least one option".to_string(),
        ));
    }
    if let Some(option) = options.iter().find(|o| o.text.trim().is_empty()) {
        return Err(Error::Validation(format!(
            "option {} has empty text",
            option.position
        )));
    }
    if !slack::is_channel_id(channel) {
        return Err(Error::Configuration(format!(
            "'{channel}' does not look like a Slack channel id (expected e.g. C0123ABCD)"
        )));
    }

    info!(channel, title, options = options.len(), "publishing poll");

    let intro = intro_line(title, reactions);
    slack
        .post_message(channel, &intro)
        .await
        .map_err(|e| Error::platform("posting the poll intro", e))?;

    let total = options.len();
    let mut anchors = Vec::with_capacity(total);
    for (posted, option) in options.iter().enumerate() {
        let line = encode_option_line(title, option.position as usize, &option.text);
        let message = match slack.post_message(channel, &line).await {
            Ok(message) => message,
            Err(source) => {
                return Err(Error::PartialPublish {
                    posted,
                    total,
                    source,
                });
            }
        };
        debug!(ts = %message.ts, position = option.position, "candidate posted");

        attach_vote_reactions(slack, reactions, channel, &message.ts).await;

        anchors.push(Anchor {
            option_id: option.id,
            channel_id: message.channel,
            message_ts: message.ts,
        });
    }

    info!(channel, title, "poll published");
    Ok(anchors)
}

/// Pre-attach the two voting reactions. A failure here leaves the message
/// usable (voters can still react), so it is logged and skipped.
async fn attach_vote_reactions(
    slack: &dyn SlackApi,
    reactions: &VoteReactions,
    channel: &str,
    ts: &str,
) {
    for name in [&reactions.affirmative, &reactions.negative] {
        if let Err(err) = slack.add_reaction(channel, ts, name).await {
            warn!(ts, name = name.as_str(), %err, "could not pre-attach reaction");
        }
    }
}

fn intro_line(title: &str, reactions: &VoteReactions) -> String {
    format!(
        "📊 *{}* (:{}: = available / :{}: = unavailable)",
        title, reactions.affirmative, reactions.negative
    )
}
