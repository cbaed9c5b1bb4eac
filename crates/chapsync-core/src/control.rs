//! Process-wide cancellation.
//!
//! One `CancellationToken` is created at startup and handed by reference to
//! every blocking call (rate gate, transfer slots, worker loop). Once
//! cancelled it stays cancelled; there is no reset.

pub use tokio_util::sync::CancellationToken;

/// Returned by a wait that gave up because the shutdown signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "closed")
    }
}

impl std::error::Error for Cancelled {}
