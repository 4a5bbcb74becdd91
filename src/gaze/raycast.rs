//! Ray casting seam between the gaze sampler and the host scene.
//!
//! The host's physics engine is consumed through [`RayCaster`]. The
//! [`StaticScene`] here is a small analytic stand-in used by the CLI, the
//! demo and the tests.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Bit set of collision layers a ray may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    /// Mask containing a single layer. Layers above 31 are ignored.
    pub fn layer(layer: u8) -> Self {
        Self(1u32.checked_shl(u32::from(layer)).unwrap_or(0))
    }

    pub fn with_layer(self, layer: u8) -> Self {
        Self(self.0 | Self::layer(layer).0)
    }

    pub fn contains_layer(&self, layer: u8) -> bool {
        self.0 & Self::layer(layer).0 != 0
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Host-provided "cast ray, get nearest hit point" operation.
pub trait RayCaster {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, mask: CollisionMask) -> Option<Vec3>;
}

impl<T: RayCaster + ?Sized> RayCaster for &T {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, mask: CollisionMask) -> Option<Vec3> {
        (**self).cast_ray(origin, direction, mask)
    }
}

impl<T: RayCaster + ?Sized> RayCaster for Box<T> {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, mask: CollisionMask) -> Option<Vec3> {
        (**self).cast_ray(origin, direction, mask)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Infinite plane through `point` with unit `normal`
    Plane { point: Vec3, normal: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl Shape {
    /// Ray parameter of the nearest forward intersection, if any.
    fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            Shape::Plane { point, normal } => {
                let denom = direction.dot(normal);
                if denom.abs() < 1e-6 {
                    return None;
                }
                let t = (point - origin).dot(normal) / denom;
                (t >= 0.0).then_some(t)
            }
            Shape::Sphere { center, radius } => {
                let oc = origin - center;
                let b = oc.dot(direction);
                let c = oc.length_squared() - radius * radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                let near = -b - root;
                let far = -b + root;
                if near >= 0.0 {
                    Some(near)
                } else if far >= 0.0 {
                    Some(far)
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    pub layer: u8,
}

/// A fixed set of analytic colliders.
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    colliders: Vec<Collider>,
    max_distance: Option<f32>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single wall facing the viewer `distance` meters down +Z, on layer 0.
    pub fn wall(distance: f32) -> Self {
        Self::new().with_plane(Vec3::new(0.0, 0.0, distance), Vec3::NEG_Z, 0)
    }

    pub fn with_plane(mut self, point: Vec3, normal: Vec3, layer: u8) -> Self {
        self.colliders.push(Collider {
            shape: Shape::Plane {
                point,
                normal: normal.normalize_or_zero(),
            },
            layer,
        });
        self
    }

    pub fn with_sphere(mut self, center: Vec3, radius: f32, layer: u8) -> Self {
        self.colliders.push(Collider {
            shape: Shape::Sphere { center, radius },
            layer,
        });
        self
    }

    /// Ignore hits farther than `distance` from the ray origin.
    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = Some(distance);
        self
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }
}

impl RayCaster for StaticScene {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, mask: CollisionMask) -> Option<Vec3> {
        let direction = direction.try_normalize()?;
        let max = self.max_distance.unwrap_or(f32::INFINITY);

        self.colliders
            .iter()
            .filter(|c| mask.contains_layer(c.layer))
            .filter_map(|c| c.shape.intersect(origin, direction))
            .filter(|t| *t <= max)
            .min_by(|a, b| a.total_cmp(b))
            .map(|t| origin + direction * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_layers() {
        let mask = CollisionMask::layer(2).with_layer(5);
        assert!(mask.contains_layer(2));
        assert!(mask.contains_layer(5));
        assert!(!mask.contains_layer(0));
        assert!(CollisionMask::ALL.contains_layer(31));
        assert!(!CollisionMask::NONE.contains_layer(0));
        assert_eq!(CollisionMask::layer(40), CollisionMask::NONE);
    }

    #[test]
    fn test_wall_hit() {
        let scene = StaticScene::wall(2.0);
        let hit = scene.cast_ray(Vec3::ZERO, Vec3::Z, CollisionMask::ALL).unwrap();
        assert!((hit - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
        assert!(scene.cast_ray(Vec3::ZERO, Vec3::NEG_Z, CollisionMask::ALL).is_none());
    }

    #[test]
    fn test_nearest_hit_wins() {
        let scene = StaticScene::wall(5.0).with_sphere(Vec3::new(0.0, 0.0, 2.0), 0.5, 1);
        let hit = scene.cast_ray(Vec3::ZERO, Vec3::Z, CollisionMask::ALL).unwrap();
        assert!((hit.z - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_mask_filters_colliders() {
        let scene = StaticScene::wall(5.0).with_sphere(Vec3::new(0.0, 0.0, 2.0), 0.5, 1);
        let hit = scene
            .cast_ray(Vec3::ZERO, Vec3::Z, CollisionMask::layer(0))
            .unwrap();
        assert!((hit.z - 5.0).abs() < 1e-5);
        assert!(scene
            .cast_ray(Vec3::ZERO, Vec3::Z, CollisionMask::NONE)
            .is_none());
    }

    #[test]
    fn test_max_distance() {
        let scene = StaticScene::wall(10.0).with_max_distance(3.0);
        assert!(scene.cast_ray(Vec3::ZERO, Vec3::Z, CollisionMask::ALL).is_none());
    }
}
