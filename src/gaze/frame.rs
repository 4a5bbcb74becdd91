//! Reference-frame conversion for raw tracker poses.

use crate::tracker::Pose;
use glam::Quat;
use serde::{Deserialize, Serialize};

/// Coordinate space the gaze pipeline works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFrameMode {
    /// Relative to the reference transform captured at startup
    HeadSpace,
    /// Global frame, through the tracking origin's pose
    #[default]
    WorldSpace,
    /// Raw tracker space, untransformed
    TrackingSpace,
}

impl ReferenceFrameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeadSpace => "head",
            Self::WorldSpace => "world",
            Self::TrackingSpace => "tracking",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "head" | "head_space" | "headspace" => Some(Self::HeadSpace),
            "world" | "world_space" | "worldspace" => Some(Self::WorldSpace),
            "tracking" | "tracking_space" | "trackingspace" => Some(Self::TrackingSpace),
            _ => None,
        }
    }
}

/// Converts sensor-space poses into head, world or tracking space.
///
/// The head-space offset is fixed when the transformer is built and never
/// recomputed, so head-space output does not drift as the reference moves.
#[derive(Debug, Clone)]
pub struct ReferenceFrameTransformer {
    head_reference: Pose,
    head_offset: Quat,
    tracking_origin: Pose,
}

impl ReferenceFrameTransformer {
    /// Build a transformer.
    ///
    /// `reference` is the head reference transform; `None` falls back to the
    /// world origin with identity rotation. `mounting_rotation` is the tracked
    /// object's rotation at startup.
    pub fn new(reference: Option<Pose>, mounting_rotation: Quat) -> Self {
        let head_reference = reference.unwrap_or(Pose::IDENTITY);
        let head_offset =
            (head_reference.orientation.inverse() * mounting_rotation).normalize();

        Self {
            head_reference,
            head_offset,
            tracking_origin: Pose::IDENTITY,
        }
    }

    /// The head-space rotation offset captured at construction.
    pub fn head_offset(&self) -> Quat {
        self.head_offset
    }

    /// World pose of the tracking origin (the rig the tracker is mounted on).
    pub fn tracking_origin(&self) -> Pose {
        self.tracking_origin
    }

    /// Update the tracking origin. Hosts call this when the rig moves.
    pub fn set_tracking_origin(&mut self, origin: Pose) {
        self.tracking_origin = origin;
    }

    pub fn to_space(&self, pose: Pose, mode: ReferenceFrameMode) -> Pose {
        match mode {
            ReferenceFrameMode::TrackingSpace => pose,
            ReferenceFrameMode::WorldSpace => {
                let origin = self.tracking_origin;
                Pose::new(
                    origin.orientation * pose.position + origin.position,
                    (origin.orientation * pose.orientation).normalize(),
                )
            }
            ReferenceFrameMode::HeadSpace => {
                let inverse = self.head_reference.orientation.inverse();
                Pose::new(
                    inverse * (pose.position - self.head_reference.position),
                    (self.head_offset * pose.orientation).normalize(),
                )
            }
        }
    }
}

impl Default for ReferenceFrameTransformer {
    fn default() -> Self {
        Self::new(None, Quat::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_tracking_space_is_identity() {
        let mut transformer = ReferenceFrameTransformer::default();
        transformer.set_tracking_origin(Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY));
        let pose = Pose::new(Vec3::new(0.1, 0.2, 0.3), Quat::from_rotation_y(0.4));
        assert_eq!(
            transformer.to_space(pose, ReferenceFrameMode::TrackingSpace),
            pose
        );
    }

    #[test]
    fn test_world_space_applies_tracking_origin() {
        let mut transformer = ReferenceFrameTransformer::default();
        transformer.set_tracking_origin(Pose::new(
            Vec3::new(0.0, 1.6, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        ));
        let pose = Pose::new(Vec3::new(0.0, 0.0, 1.0), Quat::IDENTITY);
        let world = transformer.to_space(pose, ReferenceFrameMode::WorldSpace);

        // +Z rotated a quarter turn about Y lands on +X.
        assert!(approx_vec(world.position, Vec3::new(1.0, 1.6, 0.0)));
        assert!(approx_vec(world.orientation * Vec3::Z, Vec3::X));
    }

    #[test]
    fn test_head_space_without_reference_uses_world_origin() {
        let transformer = ReferenceFrameTransformer::default();
        let pose = Pose::new(Vec3::new(0.5, 0.0, 0.0), Quat::from_rotation_x(0.2));
        let head = transformer.to_space(pose, ReferenceFrameMode::HeadSpace);
        assert!(approx_vec(head.position, pose.position));
        assert!(head.orientation.abs_diff_eq(pose.orientation, 1e-5));
    }

    #[test]
    fn test_head_offset_is_captured_once() {
        let reference = Pose::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_y(0.3));
        let mounting = Quat::from_rotation_y(0.5);
        let mut transformer = ReferenceFrameTransformer::new(Some(reference), mounting);
        let expected = (reference.orientation.inverse() * mounting).normalize();
        assert!(transformer.head_offset().abs_diff_eq(expected, 1e-6));

        let pose = Pose::new(Vec3::new(0.0, 1.0, 2.0), Quat::IDENTITY);
        let first = transformer.to_space(pose, ReferenceFrameMode::HeadSpace);

        // Moving the rig does not touch the head-space result.
        transformer.set_tracking_origin(Pose::new(Vec3::splat(5.0), Quat::from_rotation_z(1.0)));
        let second = transformer.to_space(pose, ReferenceFrameMode::HeadSpace);
        assert_eq!(first, second);
        assert!(transformer.head_offset().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            ReferenceFrameMode::parse("Head"),
            Some(ReferenceFrameMode::HeadSpace)
        );
        assert_eq!(
            ReferenceFrameMode::parse("tracking_space"),
            Some(ReferenceFrameMode::TrackingSpace)
        );
        assert_eq!(ReferenceFrameMode::parse("camera"), None);
    }
}
