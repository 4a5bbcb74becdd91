//! Latest-value cache for fused gaze, shared between the sampler and loggers.

use crate::gaze::types::{FusedGaze, TargetPoint};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Everything the hub publishes in one swap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSnapshot {
    pub gaze: FusedGaze,
    pub target: TargetPoint,
    /// Number of publishes so far; 0 means nothing was published yet
    pub sequence: u64,
}

/// Single-writer, many-reader store of the most recent fused gaze.
///
/// The whole snapshot is replaced under the lock, so a reader never sees a
/// gaze from one tick paired with a target from another.
#[derive(Debug)]
pub struct GazeDataHub {
    current: RwLock<GazeSnapshot>,
}

impl GazeDataHub {
    pub fn new() -> Self {
        Self::with_sentinel(crate::gaze::types::DEFAULT_OUT_OF_SIGHT)
    }

    /// Hub whose initial target reports the given out-of-sight sentinel.
    pub fn with_sentinel(sentinel: Vec3) -> Self {
        Self {
            current: RwLock::new(GazeSnapshot {
                gaze: FusedGaze::default(),
                target: TargetPoint::miss(sentinel),
                sequence: 0,
            }),
        }
    }

    pub fn latest(&self) -> FusedGaze {
        self.snapshot().gaze
    }

    pub fn latest_target(&self) -> TargetPoint {
        self.snapshot().target
    }

    pub fn snapshot(&self) -> GazeSnapshot {
        // A poisoned lock still holds a whole snapshot; readers keep going.
        match self.current.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn has_sample(&self) -> bool {
        self.snapshot().sequence > 0
    }

    /// Publish a new gaze, keeping the current target.
    pub fn publish(&self, gaze: FusedGaze) {
        self.write(|snapshot| snapshot.gaze = gaze);
    }

    /// Publish a gaze together with the target it resolved to.
    pub fn publish_snapshot(&self, gaze: FusedGaze, target: TargetPoint) {
        self.write(|snapshot| {
            snapshot.gaze = gaze;
            snapshot.target = target;
        });
    }

    fn write(&self, update: impl FnOnce(&mut GazeSnapshot)) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = *guard;
        update(&mut next);
        next.sequence += 1;
        *guard = next;
    }
}

impl Default for GazeDataHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared gaze hub.
pub type SharedGazeHub = Arc<GazeDataHub>;

/// Create a new shared gaze hub.
pub fn create_shared_hub() -> SharedGazeHub {
    Arc::new(GazeDataHub::new())
}

/// Shared hub whose initial target reports `sentinel`.
pub fn create_shared_hub_with_sentinel(sentinel: Vec3) -> SharedGazeHub {
    Arc::new(GazeDataHub::with_sentinel(sentinel))
}
