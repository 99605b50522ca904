//! Transform and bounds components.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::component::{
    from_record, to_record, Capabilities, Component, ComponentHooks, ComponentRecord, ComponentTag,
};
use crate::error::SceneError;
use crate::math::Aabb;

/// Vertical anchor of a mesh relative to its transform position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pivot {
    /// Position is the center of the local bounds.
    #[default]
    Center,
    /// Position is the bottom of the local bounds.
    Bottom,
    /// Position is the top of the local bounds.
    Top,
}

/// Local transform with a cached model matrix.
///
/// Setters mark the transform dirty; only the transform system recomputes
/// the matrix and clears the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformComponent {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    pivot: Pivot,
    #[serde(skip)]
    model_matrix: Mat4,
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    updated: bool,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            pivot: Pivot::Center,
            model_matrix: Mat4::IDENTITY,
            dirty: true,
            updated: false,
        }
    }
}

impl TransformComponent {
    /// Create an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform from a position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Set the rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set the pivot.
    pub fn with_pivot(mut self, pivot: Pivot) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn pivot(&self) -> Pivot {
        self.pivot
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    pub fn set_pivot(&mut self, pivot: Pivot) {
        self.pivot = pivot;
        self.dirty = true;
    }

    /// Force a matrix recompute on the next frame.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the matrix was recomputed this frame and not yet consumed.
    pub fn was_updated(&self) -> bool {
        self.updated
    }

    /// Last computed model matrix.
    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    /// World translation of the last computed matrix.
    pub fn translation(&self) -> Vec3 {
        self.model_matrix.w_axis.truncate()
    }

    pub(crate) fn apply_matrix(&mut self, model_matrix: Mat4) {
        self.model_matrix = model_matrix;
        self.dirty = false;
        self.updated = true;
    }

    pub(crate) fn take_updated(&mut self) -> bool {
        std::mem::take(&mut self.updated)
    }
}

/// Compose `translate * rotate * scale`, followed by a pivot offset in
/// local space when local bounds are known.
pub fn compose_model_matrix(
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    pivot: Pivot,
    local_bounds: Option<&Aabb>,
) -> Mat4 {
    let trs = Mat4::from_scale_rotation_translation(scale, rotation, position);
    let offset = match (pivot, local_bounds) {
        (Pivot::Bottom, Some(bounds)) => -bounds.min.y,
        (Pivot::Top, Some(bounds)) => -bounds.max.y,
        _ => return trs,
    };
    trs * Mat4::from_translation(Vec3::new(0.0, offset, 0.0))
}

impl ComponentHooks for TransformComponent {
    fn tag(&self) -> ComponentTag {
        ComponentTag::Transform
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SERIALIZE | Capabilities::DESERIALIZE
    }

    fn serialize(&self) -> Option<ComponentRecord> {
        to_record(self)
    }
}

impl Component for TransformComponent {
    const TAG: ComponentTag = ComponentTag::Transform;

    fn deserialize(record: &ComponentRecord) -> Result<Self, SceneError> {
        from_record(record)
    }
}

/// Local and world-space axis-aligned bounds.
///
/// `world_bounds` is derived from `local_bounds` and the sibling transform's
/// model matrix by the bounds system, which is also what feeds the spatial
/// index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsComponent {
    local_bounds: Aabb,
    #[serde(skip)]
    world_bounds: Aabb,
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    local_changed: bool,
}

impl Default for BoundsComponent {
    fn default() -> Self {
        Self::new(Aabb::EMPTY)
    }
}

impl BoundsComponent {
    pub fn new(local_bounds: Aabb) -> Self {
        Self {
            local_bounds,
            world_bounds: local_bounds,
            dirty: true,
            local_changed: true,
        }
    }

    pub fn local_bounds(&self) -> &Aabb {
        &self.local_bounds
    }

    pub fn world_bounds(&self) -> &Aabb {
        &self.world_bounds
    }

    pub fn set_local_bounds(&mut self, local_bounds: Aabb) {
        self.local_bounds = local_bounds;
        self.dirty = true;
        self.local_changed = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the local box changed since the last call. Bottom and top
    /// pivots are recomputed from it.
    pub(crate) fn take_local_changed(&mut self) -> bool {
        std::mem::take(&mut self.local_changed)
    }

    pub(crate) fn apply_world_bounds(&mut self, world_bounds: Aabb) {
        self.world_bounds = world_bounds;
        self.dirty = false;
    }
}

impl ComponentHooks for BoundsComponent {
    fn tag(&self) -> ComponentTag {
        ComponentTag::Bounds
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SERIALIZE | Capabilities::DESERIALIZE
    }

    fn serialize(&self) -> Option<ComponentRecord> {
        to_record(self)
    }
}

impl Component for BoundsComponent {
    const TAG: ComponentTag = ComponentTag::Bounds;

    fn deserialize(record: &ComponentRecord) -> Result<Self, SceneError> {
        from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_dirty_identity() {
        let t = TransformComponent::new();
        assert!(t.is_dirty());
        assert!(!t.was_updated());
        assert_eq!(t.model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_setters_mark_dirty() {
        let mut t = TransformComponent::new();
        t.apply_matrix(Mat4::IDENTITY);
        assert!(!t.is_dirty());
        t.set_scale(Vec3::splat(2.0));
        assert!(t.is_dirty());
    }

    #[test]
    fn test_compose_center_pivot() {
        let m = compose_model_matrix(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::IDENTITY,
            Vec3::ONE,
            Pivot::Center,
            None,
        );
        let p = m.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_compose_bottom_pivot_scaled() {
        let bounds = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let m = compose_model_matrix(
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            Vec3::splat(2.0),
            Pivot::Bottom,
            Some(&bounds),
        );
        // Local bottom (y = -1) lands on the position.
        let bottom = m.transform_point3(Vec3::new(0.0, -1.0, 0.0));
        assert!((bottom - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_compose_top_pivot_without_bounds_is_trs() {
        let m = compose_model_matrix(Vec3::X, Quat::IDENTITY, Vec3::ONE, Pivot::Top, None);
        assert_eq!(m, Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn test_serialize_round_trip_keeps_dirty() {
        let t = TransformComponent::from_position(Vec3::new(4.0, 0.0, 0.0)).with_pivot(Pivot::Bottom);
        let record = ComponentHooks::serialize(&t).unwrap();
        assert_eq!(record["pivot"], "bottom");
        let back = <TransformComponent as Component>::deserialize(&record).unwrap();
        assert!(back.is_dirty());
        assert_eq!(back.pivot(), Pivot::Bottom);
        assert!((back.position() - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_bounds_dirty_lifecycle() {
        let mut b = BoundsComponent::new(Aabb::new(Vec3::ZERO, Vec3::ONE));
        assert!(b.is_dirty());
        b.apply_world_bounds(Aabb::new(Vec3::ONE, Vec3::splat(2.0)));
        assert!(!b.is_dirty());
        assert_eq!(b.world_bounds().min, Vec3::ONE);
    }
}
