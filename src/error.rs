//! Crate-wide error taxonomy.
//!
//! Four families: configuration (bad credentials or channel identifiers,
//! caught before any network call where feasible), validation (bad caller
//! input, never reaches Slack), platform (Slack Web API failures carrying
//! their machine-readable code), and storage (SQLite failures). A publish
//! that stops partway gets its own variant so the caller can see how many
//! option messages already went out.

use thiserror::Error;

use crate::slack::SlackError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration (token, channel id). Not
    /// retryable; fix the setup and rerun.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input, rejected before any external call.
    #[error("validation error: {0}")]
    Validation(String),

    /// A Slack Web API call failed.
    #[error("slack error while {operation}: {source}")]
    Platform {
        /// What the crate was doing when the call failed.
        operation: &'static str,
        #[source]
        source: SlackError,
    },

    /// Publishing stopped partway: `posted` of `total` option messages were
    /// already accepted by Slack. Nothing is rolled back; the posted
    /// messages stay up and remain recoverable via discovery-mode tallying.
    #[error("published {posted} of {total} options before failure: {source}")]
    PartialPublish {
        posted: usize,
        total: usize,
        #[source]
        source: SlackError,
    },

    /// Durable store failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Platform error tagged with the operation that failed.
    pub fn platform(operation: &'static str, source: SlackError) -> Self {
        Error::Platform { operation, source }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(msg) => Error::Validation(msg),
            StoreError::UnknownMeeting(id) => Error::Validation(format!("meeting {id} not found")),
            StoreError::Storage(msg) => Error::Storage(msg),
        }
    }
}
