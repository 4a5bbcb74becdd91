//! Per-tick gaze acquisition, gating, fusion and target resolution.

use crate::config::GazeConfig;
use crate::gaze::frame::ReferenceFrameTransformer;
use crate::gaze::hub::SharedGazeHub;
use crate::gaze::raycast::RayCaster;
use crate::gaze::types::{ConfidencePolicy, FusedGaze, TargetPoint, FORWARD};
use crate::stats::SharedRecordingStats;
use crate::tracker::{EyeGazesState, EyeTracker, Pose};
use tracing::trace;

/// Why a successfully polled tick did not produce a fused gaze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// At least one eye reported `is_valid == false`
    InvalidEye,
    /// At least one eye was below the confidence threshold
    LowConfidence,
}

/// Fuse two poses that are already in the same space.
///
/// Orientation is the half-way slerp, position the midpoint.
pub fn fuse_poses(
    left: &Pose,
    right: &Pose,
    left_confidence: f32,
    right_confidence: f32,
    policy: ConfidencePolicy,
) -> FusedGaze {
    let orientation = left.orientation.slerp(right.orientation, 0.5).normalize();
    FusedGaze {
        origin: left.position.lerp(right.position, 0.5),
        direction: (orientation * FORWARD).normalize_or_zero(),
        confidence: policy.combine(left_confidence, right_confidence),
    }
}

/// Polls a tracker each render tick and publishes fused gaze to the hub.
///
/// Degraded data is never an error: failed polls, invalid eyes and
/// low-confidence ticks all leave the last fused gaze and target in place.
pub struct GazeSampler<T, R> {
    tracker: T,
    caster: R,
    transformer: ReferenceFrameTransformer,
    config: GazeConfig,
    hub: SharedGazeHub,
    stats: SharedRecordingStats,
    last_gaze: Option<FusedGaze>,
    last_target: TargetPoint,
}

impl<T: EyeTracker, R: RayCaster> GazeSampler<T, R> {
    pub fn new(
        tracker: T,
        caster: R,
        config: GazeConfig,
        hub: SharedGazeHub,
        stats: SharedRecordingStats,
    ) -> Self {
        let last_target = TargetPoint::miss(config.out_of_sight);
        Self {
            tracker,
            caster,
            transformer: ReferenceFrameTransformer::default(),
            config,
            hub,
            stats,
            last_gaze: None,
            last_target,
        }
    }

    /// Replace the reference-frame transformer (head reference, rig pose).
    pub fn with_transformer(mut self, transformer: ReferenceFrameTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn transformer_mut(&mut self) -> &mut ReferenceFrameTransformer {
        &mut self.transformer
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn config(&self) -> &GazeConfig {
        &self.config
    }

    /// The last accepted fused gaze, if any tick has been accepted.
    pub fn last_gaze(&self) -> Option<FusedGaze> {
        self.last_gaze
    }

    pub fn last_target(&self) -> TargetPoint {
        self.last_target
    }

    /// Run one render tick.
    ///
    /// Returns the current fused gaze: the new one if this tick was accepted,
    /// otherwise the last known one.
    pub fn sample(&mut self) -> Option<FusedGaze> {
        self.stats.record_poll();

        let state = match self.tracker.poll() {
            Ok(state) => state,
            Err(e) => {
                trace!("tracker poll failed: {e}");
                self.stats.record_poll_failure();
                return self.last_gaze;
            }
        };

        let gaze = match self.fuse(&state) {
            Ok(gaze) => gaze,
            Err(reason) => {
                trace!(?reason, "gaze sample rejected");
                self.stats.record_sample_rejected();
                return self.last_gaze;
            }
        };

        let hit = self
            .caster
            .cast_ray(gaze.origin, gaze.direction, self.config.collision_mask);
        let target = TargetPoint::resolve(
            &self.last_target,
            hit,
            self.config.smoothing,
            self.config.out_of_sight,
        );

        self.last_gaze = Some(gaze);
        self.last_target = target;
        self.hub.publish_snapshot(gaze, target);
        self.stats.record_sample_fused();

        Some(gaze)
    }

    /// Gate and fuse one polled state.
    pub fn fuse(&self, state: &EyeGazesState) -> Result<FusedGaze, Rejection> {
        if !state.both_valid() {
            return Err(Rejection::InvalidEye);
        }
        let threshold = self.config.confidence_threshold;
        let passes = |confidence: f32| confidence.is_finite() && confidence >= threshold;
        if !passes(state.left.confidence) || !passes(state.right.confidence) {
            return Err(Rejection::LowConfidence);
        }

        let mode = self.config.reference_frame;
        let left = self.transformer.to_space(state.left.pose, mode);
        let right = self.transformer.to_space(state.right.pose, mode);

        Ok(fuse_poses(
            &left,
            &right,
            state.left.confidence,
            state.right.confidence,
            self.config.confidence_policy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::hub::create_shared_hub;
    use crate::gaze::raycast::{CollisionMask, StaticScene};
    use crate::gaze::types::DEFAULT_OUT_OF_SIGHT;
    use crate::stats::create_shared_stats;
    use crate::tracker::{Eye, PerEyeSample, TrackerError};
    use glam::{Quat, Vec3};
    use std::collections::VecDeque;

    /// Replays a fixed list of poll results.
    struct ScriptedTracker {
        polls: VecDeque<Result<EyeGazesState, TrackerError>>,
    }

    impl ScriptedTracker {
        fn new(polls: Vec<Result<EyeGazesState, TrackerError>>) -> Self {
            Self {
                polls: polls.into(),
            }
        }
    }

    impl EyeTracker for ScriptedTracker {
        fn poll(&mut self) -> Result<EyeGazesState, TrackerError> {
            self.polls.pop_front().unwrap_or(Err(TrackerError::NoData))
        }
    }

    fn state(yaw: f32, left_confidence: f32, right_confidence: f32) -> EyeGazesState {
        let orientation = Quat::from_rotation_y(yaw);
        EyeGazesState::new(
            PerEyeSample::new(
                Eye::Left,
                Pose::new(Vec3::new(-0.032, 0.0, 0.0), orientation),
                left_confidence,
            ),
            PerEyeSample::new(
                Eye::Right,
                Pose::new(Vec3::new(0.032, 0.0, 0.0), orientation),
                right_confidence,
            ),
        )
    }

    fn sampler(
        polls: Vec<Result<EyeGazesState, TrackerError>>,
        scene: StaticScene,
    ) -> (GazeSampler<ScriptedTracker, StaticScene>, SharedGazeHub) {
        let hub = create_shared_hub();
        let sampler = GazeSampler::new(
            ScriptedTracker::new(polls),
            scene,
            GazeConfig::default(),
            hub.clone(),
            create_shared_stats(),
        );
        (sampler, hub)
    }

    #[test]
    fn test_fuses_midpoint_and_forward_direction() {
        let (mut sampler, hub) = sampler(vec![Ok(state(0.0, 0.9, 0.8))], StaticScene::wall(2.0));
        let gaze = sampler.sample().unwrap();

        assert!(gaze.origin.length() < 1e-6);
        assert!((gaze.direction - Vec3::Z).length() < 1e-5);
        assert_eq!(gaze.confidence, 0.8);
        assert_eq!(hub.latest(), gaze);

        let target = hub.latest_target();
        assert!(target.hit);
        assert!((target.position - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn test_fused_orientation_is_halfway_slerp() {
        let left = Pose::new(Vec3::ZERO, Quat::from_rotation_y(0.4));
        let right = Pose::new(Vec3::ZERO, Quat::from_rotation_y(0.0));
        let gaze = fuse_poses(&left, &right, 1.0, 1.0, ConfidencePolicy::Min);
        let expected = Quat::from_rotation_y(0.2) * Vec3::Z;
        assert!((gaze.direction - expected).length() < 1e-5);
        assert!((gaze.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_split_confidence_is_rejected() {
        // threshold 0.5, left 0.6, right 0.4
        let (mut sampler, hub) = sampler(
            vec![Ok(state(0.0, 0.9, 0.9)), Ok(state(0.3, 0.6, 0.4))],
            StaticScene::wall(2.0),
        );
        let first = sampler.sample().unwrap();
        let second = sampler.sample().unwrap();

        assert_eq!(first, second);
        assert_eq!(hub.latest(), first);
        assert_eq!(hub.snapshot().sequence, 1);
    }

    #[test]
    fn test_below_threshold_never_updates() {
        let mut polls = vec![Ok(state(0.0, 0.9, 0.9))];
        for i in 0..10 {
            let low = i as f32 * 0.049;
            polls.push(Ok(state(0.5, low, 0.9)));
        }
        let (mut sampler, hub) = sampler(polls, StaticScene::wall(2.0));
        let accepted = sampler.sample().unwrap();
        for _ in 0..10 {
            assert_eq!(sampler.sample(), Some(accepted));
        }
        assert_eq!(hub.latest(), accepted);
    }

    #[test]
    fn test_non_finite_confidence_is_rejected() {
        let mut nan_right = state(0.0, 0.9, 0.9);
        nan_right.right.confidence = f32::NAN;
        let mut infinite_left = state(0.0, 0.9, 0.9);
        infinite_left.left.confidence = f32::INFINITY;

        let (mut sampler, hub) = sampler(
            vec![Ok(nan_right), Ok(infinite_left)],
            StaticScene::wall(2.0),
        );
        assert!(matches!(sampler.fuse(&nan_right), Err(Rejection::LowConfidence)));
        assert!(sampler.sample().is_none());
        assert!(sampler.sample().is_none());
        assert!(!hub.has_sample());
    }

    #[test]
    fn test_invalid_eye_holds_last_value() {
        let mut blink = state(0.5, 0.9, 0.9);
        blink.left = PerEyeSample::invalid(Eye::Left);
        let (mut sampler, _hub) = sampler(
            vec![Ok(state(0.0, 0.9, 0.9)), Ok(blink)],
            StaticScene::wall(2.0),
        );
        let first = sampler.sample();
        let target = sampler.last_target();
        assert_eq!(sampler.sample(), first);
        assert_eq!(sampler.last_target(), target);
    }

    #[test]
    fn test_poll_failure_before_any_sample() {
        let (mut sampler, hub) = sampler(vec![Err(TrackerError::NoData)], StaticScene::wall(2.0));
        assert_eq!(sampler.sample(), None);
        assert!(!hub.has_sample());
        assert_eq!(hub.latest().confidence, 0.0);
    }

    #[test]
    fn test_miss_reports_sentinel() {
        // Looking backwards, away from the wall.
        let (mut sampler, hub) = sampler(
            vec![Ok(state(0.0, 0.9, 0.9)), Ok(state(std::f32::consts::PI, 0.9, 0.9))],
            StaticScene::wall(2.0),
        );
        sampler.sample();
        assert!(hub.latest_target().hit);

        sampler.sample();
        let target = hub.latest_target();
        assert!(!target.hit);
        assert_eq!(target.position, DEFAULT_OUT_OF_SIGHT);
    }

    #[test]
    fn test_consecutive_hits_are_smoothed() {
        let yaw = 0.3_f32;
        let (mut sampler, _hub) = sampler(
            vec![Ok(state(0.0, 0.9, 0.9)), Ok(state(yaw, 0.9, 0.9))],
            StaticScene::wall(2.0),
        );
        sampler.sample();
        let first = sampler.last_target().position;
        sampler.sample();
        let raw_second = Vec3::new(2.0 * yaw.tan(), 0.0, 2.0);
        let expected = first.lerp(raw_second, 0.5);
        assert!((sampler.last_target().position - expected).length() < 1e-4);
    }

    #[test]
    fn test_collision_mask_is_applied() {
        let hub = create_shared_hub();
        let config = GazeConfig {
            collision_mask: CollisionMask::layer(3),
            ..GazeConfig::default()
        };
        let mut sampler = GazeSampler::new(
            ScriptedTracker::new(vec![Ok(state(0.0, 0.9, 0.9))]),
            StaticScene::wall(2.0),
            config,
            hub.clone(),
            create_shared_stats(),
        );
        sampler.sample();
        assert!(!hub.latest_target().hit);
    }

    #[test]
    fn test_world_space_uses_tracking_origin() {
        let (sampler, _hub) = sampler(vec![], StaticScene::wall(2.0));
        let mut sampler = sampler;
        sampler
            .transformer_mut()
            .set_tracking_origin(Pose::new(Vec3::new(0.0, 1.5, 0.0), Quat::IDENTITY));
        let gaze = sampler.fuse(&state(0.0, 0.9, 0.9)).unwrap();
        assert!((gaze.origin - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-6);
    }
}
