//! Recording statistics for the gaze session recorder.
//!
//! Counters describing how much gaze data was accepted or rejected and
//! how much was written, so a researcher can judge the quality of a
//! session without opening its files.

pub mod recording;

pub use recording::{
    create_shared_stats, create_shared_stats_with_persistence, RecordingStats,
    SharedRecordingStats, StatsSnapshot,
};
