//! Global transfer-slot pool shared across chapters.
//!
//! Every page transfer holds one slot for its duration, so the total number
//! of in-flight page downloads stays under `capacity` no matter how many
//! chapters are being processed at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::control::{CancellationToken, Cancelled};

#[derive(Debug)]
pub struct TransferSlots {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_use: Arc<AtomicUsize>,
    peak_in_use: AtomicUsize,
}

impl TransferSlots {
    /// Create a pool with the given number of slots (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_use: Arc::new(AtomicUsize::new(0)),
            peak_in_use: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Highest number of slots held at once since creation.
    pub fn peak_in_use(&self) -> usize {
        self.peak_in_use.load(Ordering::Relaxed)
    }

    /// Waits for a free slot, or returns `Cancelled` if `cancel` fires first
    /// (no slot is taken in that case). The slot is released when the
    /// returned guard is dropped.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<TransferSlot, Cancelled> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                // The semaphore is never closed.
                permit.map_err(|_| Cancelled)?
            }
        };

        let current = self.in_use.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_use.fetch_max(current, Ordering::Relaxed);

        Ok(TransferSlot {
            _permit: permit,
            in_use: Arc::clone(&self.in_use),
        })
    }
}

/// One held transfer slot. Released on drop.
#[derive(Debug)]
pub struct TransferSlot {
    _permit: OwnedSemaphorePermit,
    in_use: Arc<AtomicUsize>,
}

impl Drop for TransferSlot {
    fn drop(&mut self) {
        self.in_use.fetch_sub(1, Ordering::Relaxed);
    }
}
