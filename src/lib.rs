//! huddle: Slack reaction-poll meeting scheduling.
//!
//! Publishes meeting-time candidates to a Slack channel as a lightweight
//! reaction poll (one message per candidate, two pre-attached voting
//! reactions), re-derives per-candidate vote tallies from the live reaction
//! state on demand, and announces the chosen time.
//!
//! Meetings, candidates, and the option→message anchors recorded at publish
//! time all live in SQLite, and every candidate message embeds a parseable
//! `{title} candidate {n}: {text}` line, so tallying works across process
//! restarts with or without the stored anchors.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod poll;
pub mod slack;
pub mod store;

pub use error::Error;
