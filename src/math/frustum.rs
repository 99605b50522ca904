//! Frustum extraction and intersection tests.
//!
//! Planes are extracted from a view-projection matrix with the
//! Gribb/Hartmann method, using wgpu's `[0, 1]` clip depth range.

use super::Aabb;
use glam::{Mat4, Vec3, Vec4};

/// A plane in 3D space defined by the equation ax + by + cz + d = 0.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (a, b, c).
    pub normal: Vec3,
    /// Distance from origin (d).
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Create a plane from a Vec4 (xyz = normal, w = distance).
    pub fn from_vec4(v: Vec4) -> Self {
        Self {
            normal: v.truncate(),
            distance: v.w,
        }
    }

    /// Normalize the plane equation.
    pub fn normalize(&self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            Self {
                normal: self.normal / len,
                distance: self.distance / len,
            }
        } else {
            *self
        }
    }

    /// Signed distance from a point to the plane. Positive = in front.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Result of a frustum intersection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// Completely outside the frustum.
    Outside,
    /// Completely inside the frustum.
    Inside,
    /// Partially inside (intersecting a plane).
    Intersecting,
}

/// View frustum defined by 6 inward-facing planes.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Left, Right, Bottom, Top, Near, Far planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    pub fn from_view_projection(vp: Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let planes = [
            Plane::from_vec4(row3 + row0).normalize(),
            Plane::from_vec4(row3 - row0).normalize(),
            Plane::from_vec4(row3 + row1).normalize(),
            Plane::from_vec4(row3 - row1).normalize(),
            // depth is 0..1, so the near plane is row 2 alone
            Plane::from_vec4(row2).normalize(),
            Plane::from_vec4(row3 - row2).normalize(),
        ];

        Self { planes }
    }

    /// Test if a point is inside the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }

    /// Classify an AABB against the frustum using its positive/negative vertices.
    pub fn test_aabb(&self, aabb: &Aabb) -> Intersection {
        let mut result = Intersection::Inside;

        for plane in &self.planes {
            let positive = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            let negative = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.min, aabb.max);

            if plane.signed_distance(positive) < 0.0 {
                return Intersection::Outside;
            }
            if plane.signed_distance(negative) < 0.0 {
                result = Intersection::Intersecting;
            }
        }

        result
    }

    /// Test if an AABB is at least partially inside the frustum.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.test_aabb(aabb) != Intersection::Outside
    }

    /// Test if a sphere is at least partially inside the frustum.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(center) >= -radius)
    }
}
