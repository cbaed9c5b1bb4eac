//! Chapter scheduling.
//!
//! Worker pool → chapter processor → (rate gate, transfer slots) → page
//! transfers → archive. The gate and the slot pool are process-wide and
//! shared by every worker through `Arc`.

mod chapter;
mod gate;
mod pool;
mod slots;

pub use chapter::{ChapterError, ChapterOutcome, ChapterProcessor};
pub use gate::{RateGate, RESOLVE_INTERVAL};
pub use pool::WorkerPool;
pub use slots::{TransferSlot, TransferSlots};
