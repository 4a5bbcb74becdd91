//! Deterministic simulated tracker for demos and tests.
//!
//! The simulated eyes sweep horizontally in a sine pattern around the
//! forward axis. Optional periodic faults reproduce the degraded data a
//! real headset produces: failed polls, blinks (invalid samples) and
//! low-confidence frames.

use crate::tracker::types::{Eye, EyeGazesState, PerEyeSample, Pose};
use crate::tracker::{EyeTracker, TrackerError};
use glam::{Quat, Vec3};

/// Shape of the simulated gaze stream.
#[derive(Debug, Clone)]
pub struct SimulatedTrackerConfig {
    /// Distance between the eyes in meters
    pub interpupillary_distance: f32,
    /// Peak horizontal gaze angle of the sweep, in degrees
    pub sweep_amplitude_deg: f32,
    /// Polls per full sweep
    pub sweep_period: u64,
    /// Confidence reported on good frames
    pub confidence: f32,
    /// Every n-th poll fails outright
    pub poll_failure_every: Option<u64>,
    /// Every n-th poll reports a blink (both eyes invalid)
    pub blink_every: Option<u64>,
    /// Every n-th poll reports the right eye at low confidence
    pub low_confidence_every: Option<u64>,
}

impl Default for SimulatedTrackerConfig {
    fn default() -> Self {
        Self {
            interpupillary_distance: 0.064,
            sweep_amplitude_deg: 20.0,
            sweep_period: 180,
            confidence: 0.95,
            poll_failure_every: None,
            blink_every: None,
            low_confidence_every: None,
        }
    }
}

pub struct SimulatedTracker {
    config: SimulatedTrackerConfig,
    polls: u64,
}

impl SimulatedTracker {
    pub fn new(config: SimulatedTrackerConfig) -> Self {
        Self { config, polls: 0 }
    }

    /// Number of polls served so far, including failed ones.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    fn hits(every: Option<u64>, poll: u64) -> bool {
        matches!(every, Some(n) if n > 0 && poll % n == 0)
    }

    fn orientation_at(&self, poll: u64) -> Quat {
        let period = self.config.sweep_period.max(1) as f32;
        let phase = (poll % self.config.sweep_period.max(1)) as f32 / period;
        let yaw = self.config.sweep_amplitude_deg.to_radians()
            * (phase * std::f32::consts::TAU).sin();
        Quat::from_rotation_y(yaw)
    }
}

impl Default for SimulatedTracker {
    fn default() -> Self {
        Self::new(SimulatedTrackerConfig::default())
    }
}

impl EyeTracker for SimulatedTracker {
    fn poll(&mut self) -> Result<EyeGazesState, TrackerError> {
        self.polls += 1;
        let poll = self.polls;

        if Self::hits(self.config.poll_failure_every, poll) {
            return Err(TrackerError::NoData);
        }
        if Self::hits(self.config.blink_every, poll) {
            return Ok(EyeGazesState::new(
                PerEyeSample::invalid(Eye::Left),
                PerEyeSample::invalid(Eye::Right),
            ));
        }

        let orientation = self.orientation_at(poll);
        let half_ipd = self.config.interpupillary_distance / 2.0;
        let left = PerEyeSample::new(
            Eye::Left,
            Pose::new(Vec3::new(-half_ipd, 0.0, 0.0), orientation),
            self.config.confidence,
        );
        let right_confidence = if Self::hits(self.config.low_confidence_every, poll) {
            0.1
        } else {
            self.config.confidence
        };
        let right = PerEyeSample::new(
            Eye::Right,
            Pose::new(Vec3::new(half_ipd, 0.0, 0.0), orientation),
            right_confidence,
        );

        Ok(EyeGazesState::new(left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stream_is_valid() {
        let mut tracker = SimulatedTracker::default();
        for _ in 0..10 {
            let state = tracker.poll().unwrap();
            assert!(state.both_valid());
            assert!(state.left.pose.position.x < state.right.pose.position.x);
        }
        assert_eq!(tracker.polls(), 10);
    }

    #[test]
    fn test_periodic_faults() {
        let mut tracker = SimulatedTracker::new(SimulatedTrackerConfig {
            poll_failure_every: Some(3),
            blink_every: Some(5),
            low_confidence_every: Some(7),
            ..Default::default()
        });

        let results: Vec<_> = (0..7).map(|_| tracker.poll()).collect();
        assert_eq!(results[2], Err(TrackerError::NoData));
        assert!(!results[4].as_ref().unwrap().both_valid());
        assert!(results[6].as_ref().unwrap().right.confidence < 0.5);
        assert!(results[0].as_ref().unwrap().both_valid());
    }
}
