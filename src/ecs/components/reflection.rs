//! Reflection components: baked environment probes and screen-space
//! reflections.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::component::{
    from_record, record_component, to_record, Capabilities, Component, ComponentHooks,
    ComponentRecord, ComponentTag, GraphicsResource,
};
use crate::error::SceneError;
use crate::render::TextureHandle;

/// Reflection probe bake lifecycle.
///
/// `None -> Pending -> Baking -> Baked`, back to `Pending` on a re-bake
/// request or invalidation, and `None` on destroy. Baking runs to
/// completion: requests and invalidations while `Baking` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BakeState {
    #[default]
    None,
    Pending,
    Baking,
    Baked,
}

/// Per-entity environment capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionProbeComponent {
    pub enabled: bool,
    /// Re-bake when the model matrix changes after a bake.
    pub auto_bake_on_transform_change: bool,
    /// Cube face resolution in pixels.
    pub resolution: u32,
    #[serde(skip)]
    bake_state: BakeState,
    #[serde(skip)]
    baked_matrix_hash: Option<u64>,
    #[serde(skip)]
    capture_position: Option<Vec3>,
    #[serde(skip)]
    cubemap: Option<TextureHandle>,
}

impl Default for ReflectionProbeComponent {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_bake_on_transform_change: false,
            resolution: 128,
            bake_state: BakeState::None,
            baked_matrix_hash: None,
            capture_position: None,
            cubemap: None,
        }
    }
}

impl ReflectionProbeComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn auto_bake(mut self, auto_bake: bool) -> Self {
        self.auto_bake_on_transform_change = auto_bake;
        self
    }

    pub fn bake_state(&self) -> BakeState {
        self.bake_state
    }

    pub fn cubemap(&self) -> Option<TextureHandle> {
        self.cubemap
    }

    /// World position of the last capture.
    pub fn capture_position(&self) -> Option<Vec3> {
        self.capture_position
    }

    /// Baked and enabled; the renderer samples this probe.
    pub fn is_ready(&self) -> bool {
        self.enabled && self.bake_state == BakeState::Baked
    }

    /// Ask for a (re)bake. No-op while disabled or already baking.
    /// Returns whether the probe is now pending.
    pub fn request_bake(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.bake_state {
            BakeState::None | BakeState::Baked => {
                self.bake_state = BakeState::Pending;
                true
            }
            BakeState::Pending => true,
            BakeState::Baking => false,
        }
    }

    /// Mark a baked capture as stale.
    pub fn invalidate(&mut self) {
        if self.bake_state == BakeState::Baked {
            self.bake_state = BakeState::Pending;
        }
    }

    pub(crate) fn baked_matrix_hash(&self) -> Option<u64> {
        self.baked_matrix_hash
    }

    pub(crate) fn begin_bake(&mut self, position: Vec3, matrix_hash: u64) -> Result<(), SceneError> {
        if self.bake_state != BakeState::Pending {
            return Err(SceneError::InvalidBakeTransition {
                from: self.bake_state,
                to: BakeState::Baking,
            });
        }
        self.bake_state = BakeState::Baking;
        self.capture_position = Some(position);
        self.baked_matrix_hash = Some(matrix_hash);
        Ok(())
    }

    /// Finish a bake; returns the cube map it replaces.
    pub(crate) fn complete_bake(
        &mut self,
        cubemap: TextureHandle,
    ) -> Result<Option<TextureHandle>, SceneError> {
        if self.bake_state != BakeState::Baking {
            return Err(SceneError::InvalidBakeTransition {
                from: self.bake_state,
                to: BakeState::Baked,
            });
        }
        self.bake_state = BakeState::Baked;
        Ok(self.cubemap.replace(cubemap).filter(|old| *old != cubemap))
    }
}

impl ComponentHooks for ReflectionProbeComponent {
    fn tag(&self) -> ComponentTag {
        ComponentTag::ReflectionProbe
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::GRAPHICS_RESOURCE
            | Capabilities::DESTROY
            | Capabilities::SERIALIZE
            | Capabilities::DESERIALIZE
    }

    fn graphics_resource(&self, name: &str) -> Option<GraphicsResource> {
        match name {
            "cubemap" => self.cubemap.map(GraphicsResource::Cubemap),
            _ => None,
        }
    }

    fn destroy(&mut self, released: &mut Vec<GraphicsResource>) {
        released.extend(self.cubemap.take().map(GraphicsResource::Cubemap));
        self.bake_state = BakeState::None;
        self.baked_matrix_hash = None;
    }

    fn serialize(&self) -> Option<ComponentRecord> {
        to_record(self)
    }
}

impl Component for ReflectionProbeComponent {
    const TAG: ComponentTag = ComponentTag::ReflectionProbe;

    fn deserialize(record: &ComponentRecord) -> Result<Self, SceneError> {
        from_record(record)
    }
}

/// FNV-1a over the bit patterns of the matrix entries.
pub fn matrix_hash(matrix: &Mat4) -> u64 {
    matrix
        .to_cols_array()
        .iter()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, value| {
            (hash ^ u64::from(value.to_bits())).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

/// Screen-space reflection opt-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrComponent {
    pub enabled: bool,
    #[serde(skip)]
    active: bool,
}

impl Default for SsrComponent {
    fn default() -> Self {
        Self {
            enabled: true,
            active: false,
        }
    }
}

impl SsrComponent {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: false,
        }
    }

    /// Whether SSR applies this frame (global switch, enabled, LOD 0).
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

record_component!(SsrComponent, Ssr);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bake_lifecycle() {
        let mut probe = ReflectionProbeComponent::new();
        assert_eq!(probe.bake_state(), BakeState::None);
        assert!(probe.request_bake());
        assert_eq!(probe.bake_state(), BakeState::Pending);
        probe.begin_bake(Vec3::ZERO, 1).unwrap();
        assert_eq!(probe.bake_state(), BakeState::Baking);

        // Run to completion.
        assert!(!probe.request_bake());
        probe.invalidate();
        assert_eq!(probe.bake_state(), BakeState::Baking);

        assert_eq!(probe.complete_bake(TextureHandle(9)).unwrap(), None);
        assert!(probe.is_ready());

        probe.invalidate();
        assert_eq!(probe.bake_state(), BakeState::Pending);
        assert!(!probe.is_ready());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut probe = ReflectionProbeComponent::new();
        assert!(matches!(
            probe.complete_bake(TextureHandle(1)),
            Err(SceneError::InvalidBakeTransition {
                from: BakeState::None,
                to: BakeState::Baked
            })
        ));
        assert!(probe.begin_bake(Vec3::ZERO, 0).is_err());
    }

    #[test]
    fn test_disabled_request_is_noop() {
        let mut probe = ReflectionProbeComponent::new();
        probe.enabled = false;
        assert!(!probe.request_bake());
        assert_eq!(probe.bake_state(), BakeState::None);
    }

    #[test]
    fn test_rebake_returns_previous_cubemap() {
        let mut probe = ReflectionProbeComponent::new();
        probe.request_bake();
        probe.begin_bake(Vec3::ZERO, 0).unwrap();
        probe.complete_bake(TextureHandle(1)).unwrap();
        probe.request_bake();
        probe.begin_bake(Vec3::ZERO, 0).unwrap();
        assert_eq!(probe.complete_bake(TextureHandle(2)).unwrap(), Some(TextureHandle(1)));
    }

    #[test]
    fn test_destroy_resets_and_releases() {
        let mut probe = ReflectionProbeComponent::new();
        probe.request_bake();
        probe.begin_bake(Vec3::ZERO, 0).unwrap();
        probe.complete_bake(TextureHandle(4)).unwrap();
        let mut released = Vec::new();
        probe.destroy(&mut released);
        assert_eq!(released, vec![GraphicsResource::Cubemap(TextureHandle(4))]);
        assert_eq!(probe.bake_state(), BakeState::None);
    }

    #[test]
    fn test_matrix_hash_changes() {
        let a = matrix_hash(&Mat4::IDENTITY);
        let b = matrix_hash(&Mat4::from_translation(Vec3::X));
        assert_ne!(a, b);
        assert_eq!(a, matrix_hash(&Mat4::IDENTITY));
    }
}
