//! Atomic counters for the sampler and loggers, with optional persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct RecordingStats {
    /// Tracker polls attempted
    tracker_polls: AtomicU64,
    /// Polls that returned no tracker state
    poll_failures: AtomicU64,
    /// Ticks that produced a new fused gaze
    samples_fused: AtomicU64,
    /// Ticks rejected for invalid eyes or low confidence
    samples_rejected: AtomicU64,
    /// Rows appended to logger buffers
    lines_logged: AtomicU64,
    /// Buffer flushes that touched disk
    flushes: AtomicU64,
    /// Bytes appended to session files
    bytes_written: AtomicU64,
    started_at: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl RecordingStats {
    pub fn new() -> Self {
        Self {
            tracker_polls: AtomicU64::new(0),
            poll_failures: AtomicU64::new(0),
            samples_fused: AtomicU64::new(0),
            samples_rejected: AtomicU64::new(0),
            lines_logged: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Stats that accumulate across runs in a JSON file.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            warn!("Could not load previous recording stats: {e}");
        }

        stats
    }

    pub fn record_poll(&self) {
        self.tracker_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_failure(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample_fused(&self) {
        self.samples_fused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample_rejected(&self) {
        self.samples_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_line_logged(&self) {
        self.lines_logged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self, bytes: u64) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tracker_polls: self.tracker_polls.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
            samples_fused: self.samples_fused.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            lines_logged: self.lines_logged.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            started_at: self.started_at,
            running_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Share of polls that produced a fused sample, in `[0, 1]`.
    pub fn acceptance_rate(&self) -> f64 {
        let stats = self.snapshot();
        if stats.tracker_polls == 0 {
            return 0.0;
        }
        stats.samples_fused as f64 / stats.tracker_polls as f64
    }

    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Recording Statistics:\n\
             - Tracker polls: {}\n\
             - Poll failures: {}\n\
             - Fused samples: {}\n\
             - Rejected samples: {}\n\
             - Acceptance rate: {:.1}%\n\
             - Lines logged: {}\n\
             - Flushes: {} ({} bytes)\n\
             - Running time: {} seconds",
            stats.tracker_polls,
            stats.poll_failures,
            stats.samples_fused,
            stats.samples_rejected,
            self.acceptance_rate() * 100.0,
            stats.lines_logged,
            stats.flushes,
            stats.bytes_written,
            stats.running_secs
        )
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.snapshot();
            let persisted = PersistedStats {
                tracker_polls: stats.tracker_polls,
                poll_failures: stats.poll_failures,
                samples_fused: stats.samples_fused,
                samples_rejected: stats.samples_rejected,
                lines_logged: stats.lines_logged,
                flushes: stats.flushes,
                bytes_written: stats.bytes_written,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.tracker_polls
                    .store(persisted.tracker_polls, Ordering::Relaxed);
                self.poll_failures
                    .store(persisted.poll_failures, Ordering::Relaxed);
                self.samples_fused
                    .store(persisted.samples_fused, Ordering::Relaxed);
                self.samples_rejected
                    .store(persisted.samples_rejected, Ordering::Relaxed);
                self.lines_logged
                    .store(persisted.lines_logged, Ordering::Relaxed);
                self.flushes.store(persisted.flushes, Ordering::Relaxed);
                self.bytes_written
                    .store(persisted.bytes_written, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        for counter in [
            &self.tracker_polls,
            &self.poll_failures,
            &self.samples_fused,
            &self.samples_rejected,
            &self.lines_logged,
            &self.flushes,
            &self.bytes_written,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for RecordingStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub tracker_polls: u64,
    pub poll_failures: u64,
    pub samples_fused: u64,
    pub samples_rejected: u64,
    pub lines_logged: u64,
    pub flushes: u64,
    pub bytes_written: u64,
    pub started_at: DateTime<Utc>,
    pub running_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    tracker_polls: u64,
    poll_failures: u64,
    samples_fused: u64,
    samples_rejected: u64,
    lines_logged: u64,
    flushes: u64,
    bytes_written: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared recording stats.
pub type SharedRecordingStats = Arc<RecordingStats>;

pub fn create_shared_stats() -> SharedRecordingStats {
    Arc::new(RecordingStats::new())
}

pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedRecordingStats {
    Arc::new(RecordingStats::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = RecordingStats::new();
        stats.record_poll();
        stats.record_poll();
        stats.record_sample_fused();
        stats.record_sample_rejected();
        stats.record_flush(42);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.tracker_polls, 2);
        assert_eq!(snapshot.samples_fused, 1);
        assert_eq!(snapshot.samples_rejected, 1);
        assert_eq!(snapshot.flushes, 1);
        assert_eq!(snapshot.bytes_written, 42);
        assert!((stats.acceptance_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let stats = RecordingStats::new();
        stats.record_line_logged();
        stats.record_poll_failure();
        stats.reset();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.lines_logged, 0);
        assert_eq!(snapshot.poll_failures, 0);
        assert_eq!(stats.acceptance_rate(), 0.0);
    }

    #[test]
    fn test_persistence_accumulates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stats").join("recording_stats.json");

        let first = RecordingStats::with_persistence(path.clone());
        first.record_line_logged();
        first.record_line_logged();
        first.save().unwrap();

        let second = RecordingStats::with_persistence(path);
        second.record_line_logged();
        assert_eq!(second.snapshot().lines_logged, 3);
    }

    #[test]
    fn test_summary_format() {
        let summary = RecordingStats::new().summary();
        assert!(summary.contains("Fused samples"));
        assert!(summary.contains("Acceptance rate"));
    }
}
