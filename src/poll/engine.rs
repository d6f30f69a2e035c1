//! High-level poll lifecycle over the store and the Slack client.
//!
//! The presentation layer talks to [`PollEngine`] only. It persists
//! meeting, option, and anchor records around publishing, and loads them
//! back for anchor-mode tallying, so no in-memory state from the
//! publishing process is ever required later. Discovery-mode tallying and
//! announcements pass straight through to their components.

use std::sync::Arc;

use url::Url;

use crate::config::PollSettings;
use crate::error::Error;
use crate::poll::announcer::{self, MessageLocator};
use crate::poll::publisher;
use crate::poll::reconciler::{self, VoteTally};
use crate::slack::{self, SlackApi};
use crate::store::{Anchor, Meeting, MeetingOption, MeetingStore};

/// A freshly published poll: the durable records plus the live anchors.
#[derive(Debug, Clone)]
pub struct PublishedPoll {
    pub meeting: Meeting,
    pub options: Vec<MeetingOption>,
    pub anchors: Vec<Anchor>,
}

pub struct PollEngine {
    slack: Arc<dyn SlackApi>,
    store: MeetingStore,
    settings: PollSettings,
}

impl PollEngine {
    pub fn new(slack: Arc<dyn SlackApi>, store: MeetingStore, settings: PollSettings) -> Self {
        Self {
            slack,
            store,
            settings,
        }
    }

    /// Persist a meeting with its candidates, then publish the poll.
    ///
    /// Anchors are written to the store before this returns, so a later
    /// process can tally in anchor mode with no state from this one. If
    /// publishing stops partway the anchors are not saved; the posted
    /// messages remain recoverable through discovery-mode tallying.
    pub async fn publish(
        &self,
        channel: &str,
        title: &str,
        option_texts: &[String],
    ) -> Result<PublishedPoll, Error> {
        // Validate before touching the store, so a bad request leaves no
        // half-created meeting behind.
        if title.trim().is_empty() {
            return Err(Error::Validation("poll title must not be empty".to_string()));
        }
        if option_texts.is_empty() {
            return Err(Error::Validation(
                "poll needs at least one option".to_string(),
            ));
        }
        if option_texts.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Validation(
                "option text must not be empty".to_string(),
            ));
        }
        if !slack::is_channel_id(channel) {
            return Err(Error::Configuration(format!(
                "'{channel}' does not look like a Slack channel id (expected e.g. C0123ABCD)"
            )));
        }

        let meeting = self.store.create_meeting(title, channel).await?;
        let options = self.store.add_options(meeting.id, option_texts).await?;

        let anchors = publisher::publish_poll(
            self.slack.as_ref(),
            &self.settings.reactions,
            channel,
            title,
            &options,
        )
        .await?;

        self.store.save_anchors(&anchors).await?;

        Ok(PublishedPoll {
            meeting,
            options,
            anchors,
        })
    }

    /// Anchor-mode tally for a stored meeting.
    pub async fn tally_meeting(&self, meeting_id: i64) -> Result<(Meeting, Vec<VoteTally>), Error> {
        let meeting = self.store.get_meeting(meeting_id).await?;
        let options = self.store.list_options(meeting_id).await?;
        let anchors = self.store.anchors_for_meeting(meeting_id).await?;

        let tallies = reconciler::tally_anchors(
            self.slack.as_ref(),
            &self.settings.reactions,
            &options,
            &anchors,
        )
        .await?;

        Ok((meeting, tallies))
    }

    /// Discovery-mode tally: rescan channel history and re-parse candidate
    /// lines, for polls whose anchor records are unavailable.
    pub async fn tally_discovered(
        &self,
        channel: &str,
        title: &str,
        lookback_hours: Option<u32>,
    ) -> Result<Vec<VoteTally>, Error> {
        let hours = lookback_hours.unwrap_or(self.settings.lookback_hours);
        reconciler::tally_history(
            self.slack.as_ref(),
            &self.settings.reactions,
            channel,
            title,
            hours,
        )
        .await
    }

    /// Announce the chosen time. Finalizing a meeting is terminal; a new
    /// poll needs a new meeting.
    pub async fn announce(
        &self,
        channel: &str,
        chosen_text: &str,
        meeting_url: Option<&Url>,
    ) -> Result<MessageLocator, Error> {
        announcer::announce_final(self.slack.as_ref(), channel, chosen_text, meeting_url).await
    }
}
