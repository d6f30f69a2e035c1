//! Poll lifecycle: publish, reconcile, announce.
//!
//! A poll is one meeting title plus an ordered list of candidate times.
//! Publishing posts one message per candidate and pre-attaches the two
//! voting reactions; reconciling re-reads the live reaction state and
//! produces per-candidate tallies; announcing posts the chosen time.
//!
//! Every candidate message carries a parseable `{title} candidate {n}:
//! {text}` line (see `encoding`), so tallies can be rebuilt from channel
//! history alone when the stored anchors are unavailable.

pub mod announcer;
pub mod encoding;
pub mod engine;
pub mod publisher;
pub mod reconciler;

#[cfg(test)]
pub(crate) mod testing;

pub use announcer::{announce_final, MessageLocator};
pub use engine::{PollEngine, PublishedPoll};
pub use publisher::publish_poll;
pub use reconciler::{tally_anchors, tally_history, VoteTally};
