// Error types for history retrieval and the fetch dispatcher.

use std::time::Duration;

use thiserror::Error;

/// Why one entrant's history could not be turned into an entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (connection, TLS, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// The per-fetch deadline elapsed.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The response body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The worker task panicked or was cancelled before finishing.
    #[error("fetch task did not complete: {0}")]
    Task(String),
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Transport failures, timeouts, throttling (429) and server errors
    /// (5xx) are transient. Client errors and decode failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) | FetchError::Task(_) => false,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// A fetch failure scoped to a single entrant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub entry_num: u64,
    pub error: FetchError,
}

/// Returned by the dispatcher when it gives up on a whole league.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Fail-fast mode: the first entry failure cancelled every other worker.
    #[error("fetch for entry {entry_num} failed, remaining fetches cancelled")]
    Aborted {
        entry_num: u64,
        #[source]
        source: FetchError,
    },
}
