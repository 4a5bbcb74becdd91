//! Session identity and the shared handles every component is built with.

use crate::gaze::hub::{create_shared_hub, create_shared_hub_with_sentinel, SharedGazeHub};
use crate::session::clock::{create_shared_clock, SharedSessionClock};
use crate::stats::{create_shared_stats, SharedRecordingStats};
use chrono::{DateTime, Local};
use glam::Vec3;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Identity of one recording session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: Uuid,
    pub subject_id: String,
    pub activity: String,
    pub log_root: PathBuf,
    pub started_at: DateTime<Local>,
}

impl Session {
    pub fn new(
        subject_id: impl Into<String>,
        activity: impl Into<String>,
        log_root: PathBuf,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            activity: activity.into(),
            log_root,
            started_at: Local::now(),
        }
    }
}

/// Handles shared by the sampler, the loggers and the session manager.
///
/// Cloning is cheap; every clone refers to the same clock, hub, stats and
/// session slot.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub clock: SharedSessionClock,
    pub hub: SharedGazeHub,
    pub stats: SharedRecordingStats,
    session: Arc<RwLock<Option<Session>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::from_parts(create_shared_clock(), create_shared_hub(), create_shared_stats())
    }

    /// Context whose hub reports `sentinel` until the first gaze is published.
    ///
    /// Pass the configured out-of-sight value so rows logged before the first
    /// sample use the same marker as later misses.
    pub fn with_sentinel(sentinel: Vec3) -> Self {
        Self::from_parts(
            create_shared_clock(),
            create_shared_hub_with_sentinel(sentinel),
            create_shared_stats(),
        )
    }

    pub fn from_parts(
        clock: SharedSessionClock,
        hub: SharedGazeHub,
        stats: SharedRecordingStats,
    ) -> Self {
        Self {
            clock,
            hub,
            stats,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// The active session, if one was started.
    pub fn session(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn sync_id(&self) -> u64 {
        self.clock.current()
    }

    pub(crate) fn set_session(&self, session: Option<Session>) {
        let mut guard = match self.session.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = session;
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_starts_with_configured_sentinel() {
        let sentinel = Vec3::new(-5.0, -5.0, -5.0);
        let ctx = SessionContext::with_sentinel(sentinel);
        let target = ctx.hub.latest_target();
        assert_eq!(target.position, sentinel);
        assert!(!target.hit);
        assert!(ctx.session().is_none());
    }

    #[test]
    fn test_clones_share_session_slot() {
        let ctx = SessionContext::new();
        let other = ctx.clone();
        ctx.set_session(Some(Session::new("P01", "lab", PathBuf::from("logs"))));
        assert_eq!(other.session().unwrap().subject_id, "P01");
        other.set_session(None);
        assert!(ctx.session().is_none());
    }
}
