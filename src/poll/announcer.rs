//! Final decision announcement.
//!
//! One fixed-template confirmation message per finalized meeting. There is
//! no retry here; whether to retry a failed announcement is the caller's
//! decision.

use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::error::Error;
use crate::slack::{self, SlackApi};

/// Where the confirmation message landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageLocator {
    pub channel_id: String,
    pub message_ts: String,

    /// Shareable link, when Slack supplied one.
    pub permalink: Option<String>,
}

/// Post the confirmation for the chosen time, optionally with a meeting
/// URL line. The permalink lookup afterwards is best-effort; only the
/// announcement itself failing is an error.
pub async fn announce_final(
    slack: &dyn SlackApi,
    channel: &str,
    chosen_text: &str,
    meeting_url: Option<&Url>,
) -> Result<MessageLocator, Error> {
    if chosen_text.trim().is_empty() {
        return Err(Error::Validation(
            "chosen option text must not be empty".to_string(),
        ));
    }
    if !slack::is_channel_id(channel) {
        return Err(Error::Configuration(format!(
            "'{channel}' does not look like a Slack channel id (expected e.g. C0123ABCD)"
        )));
    }

    let mut text = format!("📣 Meeting time confirmed: *{chosen_text}*");
    if let Some(url) = meeting_url {
        text.push_str(&format!("\nMeeting URL: {url}"));
    }

    let message = slack
        .post_message(channel, &text)
        .await
        .map_err(|e| Error::platform("posting the final decision", e))?;

    let permalink = match slack.message_permalink(&message.channel, &message.ts).await {
        Ok(link) => Some(link),
        Err(err) => {
            warn!(%err, "no permalink for the announcement");
            None
        }
    };

    info!(channel, ts = %message.ts, "final decision announced");
    Ok(MessageLocator {
        channel_id: message.channel,
        message_ts: message.ts,
        permalink,
    })
}
