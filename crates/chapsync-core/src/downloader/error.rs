//! Error types for the resolve call and page transfers.

use crate::control::Cancelled;

/// Failure of a single page transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u32),
    /// Creating or writing the destination file failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// Curl reported an error (timeout, connection, TLS, ...).
    #[error("{0}")]
    Transport(#[from] curl::Error),
    /// Shutdown was signalled before the transfer got a slot.
    #[error("closed")]
    Closed,
}

impl From<Cancelled> for TransferError {
    fn from(_: Cancelled) -> Self {
        TransferError::Closed
    }
}

impl TransferError {
    pub fn is_closed(&self) -> bool {
        matches!(self, TransferError::Closed)
    }
}

/// Failure of the distribution-resolution call. Always terminal for the chapter.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{0}")]
    Transport(#[from] curl::Error),
    /// Non-2xx status; the response body is kept for the log.
    #[error("HTTP {code}: {body}")]
    Status { code: u32, body: String },
    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("empty base URL")]
    EmptyBaseUrl,
    #[error("resolve task: {0}")]
    Task(String),
}
