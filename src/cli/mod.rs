//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `publish` -- persist a meeting with its candidates and post the poll
//! - `tally` -- pull the current vote tallies (anchor or discovery mode)
//! - `announce` -- post the final decision message
//! - `meetings` -- list stored meetings
//!
//! The handlers are the presentation stand-in: they collect arguments,
//! call the poll engine, and print. No poll state lives here.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

/// Slack reaction-poll meeting scheduler.
#[derive(Parser, Debug)]
#[command(
    name = "huddle",
    version = env!("CARGO_PKG_VERSION"),
    about = "Publish meeting-time polls to Slack and tally reaction votes"
)]
pub struct Cli {
    /// SQLite database path (default: platform data dir).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a meeting with candidate times and post the poll to Slack.
    Publish {
        /// Channel id (e.g. C0123ABCD); falls back to the configured
        /// default channel.
        #[arg(short, long)]
        channel: Option<String>,

        /// Poll title.
        #[arg(short, long)]
        title: String,

        /// Candidate label; repeat once per candidate, in display order.
        #[arg(long = "option", value_name = "TEXT")]
        options: Vec<String>,
    },

    /// Pull the current vote tallies for a poll.
    Tally {
        /// Stored meeting id (anchor mode).
        #[arg(short, long, conflicts_with_all = ["title", "channel", "lookback_hours"])]
        meeting: Option<i64>,

        /// Poll title to scan channel history for (discovery mode).
        #[arg(short, long)]
        title: Option<String>,

        /// Channel to scan in discovery mode; falls back to the configured
        /// default channel.
        #[arg(short, long)]
        channel: Option<String>,

        /// Hours of history to scan in discovery mode (default: from
        /// config).
        #[arg(long)]
        lookback_hours: Option<u32>,
    },

    /// Announce the chosen meeting time.
    Announce {
        /// Channel id; falls back to the configured default channel.
        #[arg(short, long)]
        channel: Option<String>,

        /// The chosen candidate text, exactly as published.
        #[arg(short, long)]
        text: String,

        /// Meeting URL appended to the announcement.
        #[arg(long)]
        url: Option<Url>,
    },

    /// List stored meetings.
    Meetings,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use std::sync::Arc;

use crate::config::{self, Config};
use crate::credentials;
use crate::error::Error;
use crate::poll::{PollEngine, VoteTally};
use crate::slack::SlackClient;
use crate::store::MeetingStore;

/// Entry point used by `main` after argument parsing.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load()?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path());
    let store = MeetingStore::open(&db_path).await?;

    match cli.command {
        Command::Meetings => handle_meetings(&store).await,
        Command::Publish {
            channel,
            title,
            options,
        } => {
            let channel = require_channel(channel, &config)?;
            let engine = build_engine(&config, store).await?;
            handle_publish(&engine, &channel, &title, &options).await
        }
        Command::Tally {
            meeting,
            title,
            channel,
            lookback_hours,
        } => {
            let engine = build_engine(&config, store).await?;
            match (meeting, title) {
                (Some(meeting_id), None) => handle_tally_meeting(&engine, meeting_id).await,
                (None, Some(title)) => {
                    let channel = require_channel(channel, &config)?;
                    handle_tally_discovery(&engine, &channel, &title, lookback_hours).await
                }
                _ => Err(Error::Validation(
                    "pass --meeting <id>, or --title (with --channel) for discovery mode"
                        .to_string(),
                )
                .into()),
            }
        }
        Command::Announce { channel, text, url } => {
            let channel = require_channel(channel, &config)?;
            let engine = build_engine(&config, store).await?;
            handle_announce(&engine, &channel, &text, url.as_ref()).await
        }
    }
}

/// Resolve the bot token and assemble the engine.
async fn build_engine(config: &Config, store: MeetingStore) -> Result<PollEngine, Error> {
    let providers = credentials::default_providers(config);
    let token = credentials::resolve_bot_token(&providers).await?;
    let slack = Arc::new(SlackClient::new(token));
    Ok(PollEngine::new(slack, store, config.poll.clone()))
}

fn require_channel(arg: Option<String>, config: &Config) -> Result<String, Error> {
    arg.or_else(|| config.slack.default_channel.clone())
        .ok_or_else(|| {
            Error::Configuration("no channel given and no default channel configured".to_string())
        })
}

async fn handle_publish(
    engine: &PollEngine,
    channel: &str,
    title: &str,
    options: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let published = engine.publish(channel, title, options).await?;

    println!(
        "Published meeting {} ({} candidates) to {}",
        published.meeting.id,
        published.options.len(),
        channel
    );
    for (option, anchor) in published.options.iter().zip(&published.anchors) {
        println!(
            "  {}. {}  (ts {})",
            option.position, option.text, anchor.message_ts
        );
    }
    println!(
        "Tally later with: huddle tally --meeting {}",
        published.meeting.id
    );
    Ok(())
}

async fn handle_tally_meeting(
    engine: &PollEngine,
    meeting_id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let (meeting, tallies) = engine.tally_meeting(meeting_id).await?;
    println!("{} (in {})", meeting.title, meeting.channel_id);
    print_tallies(&tallies);
    Ok(())
}

async fn handle_tally_discovery(
    engine: &PollEngine,
    channel: &str,
    title: &str,
    lookback_hours: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tallies = engine.tally_discovered(channel, title, lookback_hours).await?;
    println!("{} (in {})", title, channel);
    print_tallies(&tallies);
    Ok(())
}

async fn handle_announce(
    engine: &PollEngine,
    channel: &str,
    text: &str,
    url: Option<&Url>,
) -> Result<(), Box<dyn std::error::Error>> {
    let locator = engine.announce(channel, text, url).await?;
    match &locator.permalink {
        Some(link) => println!("Announced: {link}"),
        None => println!(
            "Announced in {} at ts {}",
            locator.channel_id, locator.message_ts
        ),
    }
    Ok(())
}

async fn handle_meetings(store: &MeetingStore) -> Result<(), Box<dyn std::error::Error>> {
    let meetings = store.list_meetings().await?;
    if meetings.is_empty() {
        println!("No meetings stored yet.");
        return Ok(());
    }
    for meeting in meetings {
        println!(
            "{:>4}  {}  {}  {}",
            meeting.id,
            meeting.created_at.format("%Y-%m-%d %H:%M"),
            meeting.channel_id,
            meeting.title
        );
    }
    Ok(())
}

fn print_tallies(tallies: &[VoteTally]) {
    if tallies.is_empty() {
        println!("No poll messages found.");
        return;
    }
    for tally in tallies {
        println!("{}. {}", tally.position, tally.text);
        println!(
            "   available ({}): {}",
            tally.affirmative.len(),
            join_names(&tally.affirmative)
        );
        println!(
            "   unavailable ({}): {}",
            tally.negative.len(),
            join_names(&tally.negative)
        );
    }
}

fn join_names(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
