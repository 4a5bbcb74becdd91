//! Per-eye sample types delivered by an eye tracker on every poll.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Which eye a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
}

/// Position and orientation of an eye (or any tracked object).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A single eye's gaze sample for one tick. Not retained beyond the tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerEyeSample {
    pub eye: Eye,
    pub pose: Pose,
    /// Tracker confidence in `[0, 1]`
    pub confidence: f32,
    pub is_valid: bool,
}

impl PerEyeSample {
    pub fn new(eye: Eye, pose: Pose, confidence: f32) -> Self {
        Self {
            eye,
            pose,
            // NaN maps to zero so it can never pass a threshold
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
            is_valid: true,
        }
    }

    /// A sample the tracker flagged as unusable (blink, lost pupil, ...).
    pub fn invalid(eye: Eye) -> Self {
        Self {
            eye,
            pose: Pose::IDENTITY,
            confidence: 0.0,
            is_valid: false,
        }
    }
}

/// Both eyes' samples from one successful tracker poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeGazesState {
    pub left: PerEyeSample,
    pub right: PerEyeSample,
}

impl EyeGazesState {
    pub fn new(left: PerEyeSample, right: PerEyeSample) -> Self {
        Self { left, right }
    }

    pub fn eye(&self, eye: Eye) -> &PerEyeSample {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    /// True when both eyes report a valid sample.
    pub fn both_valid(&self) -> bool {
        self.left.is_valid && self.right.is_valid
    }
}
