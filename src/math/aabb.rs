//! Axis-aligned bounding boxes.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any merge replaces.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    /// Create a new AABB.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at `center` with the given half extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Create an AABB from a set of points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for p in points {
            min = min.min(p);
            max = max.max(p);
        }

        Self { min, max }
    }

    /// True when `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Get the center of the AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the AABB.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the sphere circumscribing the box.
    pub fn bounding_radius(&self) -> f32 {
        if self.is_valid() {
            self.size().length() * 0.5
        } else {
            0.0
        }
    }

    /// Surface area, used as the split heuristic by the BVH.
    pub fn surface_area(&self) -> f32 {
        let s = self.size().max(Vec3::ZERO);
        2.0 * (s.x * s.y + s.y * s.z + s.z * s.x)
    }

    /// Get all 8 corners of the AABB.
    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Check if a point is inside the AABB.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Check whether two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Merge two AABBs.
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

/// Transform a local-space box into world space.
///
/// All eight corners go through `model` with a homogeneous divide; the result
/// is the componentwise min/max of the transformed corners.
pub fn transform_aabb(local: &Aabb, model: &Mat4) -> Aabb {
    Aabb::from_points(local.corners().iter().map(|c| model.project_point3(*c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_identity_round_trip() {
        let local = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(transform_aabb(&local, &Mat4::IDENTITY), local);
    }

    #[test]
    fn test_translation() {
        let local = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let world = transform_aabb(&local, &Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));

        let eps = 1e-5;
        assert!((world.min.x - 4.0).abs() < eps);
        assert!((world.max.x - 6.0).abs() < eps);
    }

    #[test]
    fn test_rotation_grows_box() {
        let local = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let model = Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let world = transform_aabb(&local, &model);

        let expected = std::f32::consts::SQRT_2;
        assert!((world.max.x - expected).abs() < 1e-4);
        assert!((world.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_merge_and_radius() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::ZERO);
        let merged = a.merge(&b);
        assert_eq!(merged.min, Vec3::splat(-1.0));
        assert_eq!(merged.max, Vec3::ONE);
        assert!((merged.bounding_radius() - 3f32.sqrt()).abs() < 1e-5);
        assert_eq!(Aabb::EMPTY.bounding_radius(), 0.0);
        assert_eq!(Aabb::EMPTY.merge(&a), a);
    }

    #[test]
    fn test_intersects() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(a.intersects(&Aabb::new(Vec3::splat(0.5), Vec3::splat(2.0))));
        assert!(!a.intersects(&Aabb::new(Vec3::splat(1.5), Vec3::splat(2.0))));
    }
}
