//! Eye tracker sources for the gaze pipeline.
//!
//! The sampler pulls one [`EyeGazesState`] per render tick through the
//! [`EyeTracker`] trait. Device discovery and permissions live with the
//! host; this module only defines the polling seam plus two sources that
//! need no hardware.

pub mod channel;
pub mod simulated;
pub mod types;

pub use channel::{channel_tracker, ChannelTracker, TrackerFeed};
pub use simulated::{SimulatedTracker, SimulatedTrackerConfig};
pub use types::{Eye, EyeGazesState, PerEyeSample, Pose};

use thiserror::Error;

/// Reasons a tracker poll produced no state for this tick.
///
/// None of these are fatal; the sampler holds its last fused value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("eye tracker has no state for this tick")]
    NoData,
    #[error("eye tracker is not running")]
    NotRunning,
    #[error("eye tracker feed disconnected")]
    Disconnected,
}

/// A source of bilateral eye gaze state, polled once per tick.
pub trait EyeTracker {
    fn poll(&mut self) -> Result<EyeGazesState, TrackerError>;
}

impl<T: EyeTracker + ?Sized> EyeTracker for Box<T> {
    fn poll(&mut self) -> Result<EyeGazesState, TrackerError> {
        (**self).poll()
    }
}
