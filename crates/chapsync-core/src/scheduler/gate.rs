//! Rate gate for the distribution-resolution call.
//!
//! The upstream endpoint allows one call per second; the gate paces callers
//! at half that. All workers share one gate, so at most one resolve call
//! starts per tick regardless of how many chapters are in flight.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::control::{CancellationToken, Cancelled};

/// Interval between resolve calls.
pub const RESOLVE_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct RateGate {
    ticker: Option<Mutex<Interval>>,
}

impl RateGate {
    /// A gate that admits one caller per `period`. The first tick is one period from now.
    pub fn new(period: Duration) -> Self {
        let mut ticker = interval_at(Instant::now() + period, period);
        // At most one token is banked while nobody is waiting.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker: Some(Mutex::new(ticker)),
        }
    }

    /// A gate that never blocks. Used when a single explicit chapter is requested.
    pub fn unpaced() -> Self {
        Self { ticker: None }
    }

    pub fn is_paced(&self) -> bool {
        self.ticker.is_some()
    }

    /// Waits for the next tick. Returns `Cancelled` as soon as `cancel` fires,
    /// without consuming a tick.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let Some(ticker) = &self.ticker else {
            return Ok(());
        };
        let mut ticker = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            guard = ticker.lock() => guard,
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            _ = ticker.tick() => Ok(()),
        }
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(RESOLVE_INTERVAL)
    }
}
