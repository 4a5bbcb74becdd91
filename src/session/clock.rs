//! Monotonic synchronization counter shared by every logger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counts fixed ticks so rows from different loggers can be aligned.
///
/// The driving loop calls [`SessionClock::tick`] exactly once per fixed
/// tick, whether or not any logger is recording. The counter never resets.
#[derive(Debug, Default)]
pub struct SessionClock {
    sync_id: AtomicU64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one fixed tick and return the new value.
    pub fn tick(&self) -> u64 {
        self.sync_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.sync_id.load(Ordering::SeqCst)
    }
}

/// Thread-safe shared session clock.
pub type SharedSessionClock = Arc<SessionClock>;

pub fn create_shared_clock() -> SharedSessionClock {
    Arc::new(SessionClock::new())
}
