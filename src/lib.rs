//! Gaze Session Recorder - bilateral eye-tracking fusion and synchronized
//! session logging for behavioral experiments.
//!
//! Two per-eye gaze samples are fused into one gaze ray, cast into a scene
//! to find what the subject is looking at, and recorded together with quiz
//! answers and ratings into timestamped CSV files that share a sync counter.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Gaze Session Recorder                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌───────────┐                │
//! │  │  Tracker  │──▶│  Sampler  │──▶│  GazeHub  │                │
//! │  │ (L + R)   │   │ (fuse+ray)│   │ (latest)  │                │
//! │  └───────────┘   └───────────┘   └───────────┘                │
//! │                                        │                      │
//! │  ┌───────────┐                         ▼                      │
//! │  │  Session  │──tick──▶ sync_id ──▶ Loggers ──▶ CSV files     │
//! │  │   Clock   │                   (gaze/quiz/rating)           │
//! │  └───────────┘                                                │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gaze_session_recorder::{session::SessionManager, Config, SessionContext};
//! use std::time::Duration;
//!
//! let config = Config::default();
//! let ctx = SessionContext::new();
//! let mut manager = SessionManager::with_default_loggers(ctx, &config);
//!
//! manager.start_session("P01", "reading").expect("session already active");
//! manager.fixed_tick();
//! manager.update(Duration::from_millis(20));
//! manager.end_session();
//! ```

pub mod config;
pub mod gaze;
pub mod session;
pub mod stats;
pub mod tracker;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, GazeConfig, LoggerConfig, LoggersConfig};
pub use gaze::{
    ConfidencePolicy, FusedGaze, GazeDataHub, GazeSampler, ReferenceFrameMode,
    ReferenceFrameTransformer, StaticScene, TargetPoint,
};
pub use session::{
    DataLogger, LoggerError, SessionClock, SessionContext, SessionError, SessionManager,
};
pub use stats::{RecordingStats, SharedRecordingStats};
pub use tracker::{EyeTracker, SimulatedTracker, TrackerError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
