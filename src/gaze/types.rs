//! Fused gaze and gaze-target values shared across the pipeline.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Canonical forward axis; orientations are applied to it to get a direction.
pub const FORWARD: Vec3 = Vec3::Z;

/// Position reported when the gaze ray hits nothing.
pub const DEFAULT_OUT_OF_SIGHT: Vec3 = Vec3::new(-1000.0, -1000.0, -1000.0);

/// A single gaze ray fused from both eyes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedGaze {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
    pub confidence: f32,
}

impl Default for FusedGaze {
    /// Zero-confidence gaze at the origin looking forward.
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: FORWARD,
            confidence: 0.0,
        }
    }
}

/// Where the gaze ray lands in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPoint {
    pub position: Vec3,
    pub hit: bool,
}

impl TargetPoint {
    /// A miss, reported at the out-of-sight sentinel.
    pub fn miss(sentinel: Vec3) -> Self {
        Self {
            position: sentinel,
            hit: false,
        }
    }

    /// Resolve the displayed target for a new raycast result.
    ///
    /// A hit is blended toward `previous` by `smoothing` when the previous
    /// target was also a hit; after a miss it snaps to the new point so the
    /// sentinel never leaks into the blend.
    pub fn resolve(
        previous: &TargetPoint,
        hit: Option<Vec3>,
        smoothing: f32,
        sentinel: Vec3,
    ) -> Self {
        match hit {
            Some(point) if previous.hit => Self {
                position: previous.position.lerp(point, smoothing.clamp(0.0, 1.0)),
                hit: true,
            },
            Some(point) => Self {
                position: point,
                hit: true,
            },
            None => Self::miss(sentinel),
        }
    }
}

impl Default for TargetPoint {
    fn default() -> Self {
        Self::miss(DEFAULT_OUT_OF_SIGHT)
    }
}

/// How two per-eye confidences combine into the fused confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidencePolicy {
    /// The weaker eye bounds the fused value
    #[default]
    Min,
    Mean,
    Max,
}

impl ConfidencePolicy {
    pub fn combine(&self, left: f32, right: f32) -> f32 {
        match self {
            Self::Min => left.min(right),
            Self::Mean => (left + right) / 2.0,
            Self::Max => left.max(right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gaze_has_zero_confidence() {
        let gaze = FusedGaze::default();
        assert_eq!(gaze.confidence, 0.0);
        assert_eq!(gaze.direction, FORWARD);
    }

    #[test]
    fn test_miss_is_sentinel_not_zero() {
        let previous = TargetPoint {
            position: Vec3::new(0.0, 0.0, 2.0),
            hit: true,
        };
        let target = TargetPoint::resolve(&previous, None, 0.5, DEFAULT_OUT_OF_SIGHT);
        assert!(!target.hit);
        assert_eq!(target.position, DEFAULT_OUT_OF_SIGHT);
        assert_ne!(target.position, Vec3::ZERO);
    }

    #[test]
    fn test_hit_is_smoothed_toward_previous() {
        let previous = TargetPoint {
            position: Vec3::new(0.0, 0.0, 2.0),
            hit: true,
        };
        let target = TargetPoint::resolve(
            &previous,
            Some(Vec3::new(1.0, 0.0, 2.0)),
            0.5,
            DEFAULT_OUT_OF_SIGHT,
        );
        assert!(target.hit);
        assert_eq!(target.position, Vec3::new(0.5, 0.0, 2.0));
    }

    #[test]
    fn test_hit_after_miss_snaps() {
        let target = TargetPoint::resolve(
            &TargetPoint::default(),
            Some(Vec3::new(1.0, 0.0, 2.0)),
            0.5,
            DEFAULT_OUT_OF_SIGHT,
        );
        assert_eq!(target.position, Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_confidence_policies() {
        assert_eq!(ConfidencePolicy::Min.combine(0.6, 0.8), 0.6);
        assert_eq!(ConfidencePolicy::Max.combine(0.6, 0.8), 0.8);
        assert!((ConfidencePolicy::Mean.combine(0.6, 0.8) - 0.7).abs() < 1e-6);
    }
}
