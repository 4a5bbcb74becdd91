//! Gaze sampling and fusion pipeline.
//!
//! This module contains:
//! - Reference-frame conversion of raw eye poses
//! - Bilateral fusion and confidence gating
//! - Ray casting of the fused gaze into the scene
//! - The shared latest-value gaze hub

pub mod frame;
pub mod hub;
pub mod raycast;
pub mod sampler;
pub mod types;

pub use frame::{ReferenceFrameMode, ReferenceFrameTransformer};
pub use hub::{
    create_shared_hub, create_shared_hub_with_sentinel, GazeDataHub, GazeSnapshot, SharedGazeHub,
};
pub use raycast::{CollisionMask, RayCaster, StaticScene};
pub use sampler::{fuse_poses, GazeSampler, Rejection};
pub use types::{ConfidencePolicy, FusedGaze, TargetPoint, DEFAULT_OUT_OF_SIGHT, FORWARD};
