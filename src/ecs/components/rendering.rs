//! Rendering components: mesh reference, material, visibility, shadows,
//! lights and cameras.

use bitflags::bitflags;
use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::ecs::component::{
    from_record, record_component, to_record, Capabilities, Component, ComponentHooks,
    ComponentRecord, ComponentTag, GraphicsResource,
};
use crate::error::SceneError;
use crate::render::GpuMeshId;

/// Reference to one or more meshes in the render layer's mesh table.
///
/// `mesh_ids` is empty until the mesh has been uploaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshComponent {
    /// Asset key of the source geometry.
    pub source: String,
    /// Renders both faces.
    pub double_sided: bool,
    #[serde(skip)]
    mesh_ids: Vec<GpuMeshId>,
}

impl MeshComponent {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Attach already uploaded meshes.
    pub fn with_mesh_ids(mut self, mesh_ids: impl IntoIterator<Item = GpuMeshId>) -> Self {
        self.mesh_ids = mesh_ids.into_iter().collect();
        self
    }

    /// Set whether both faces are rendered.
    pub fn double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    pub fn mesh_ids(&self) -> &[GpuMeshId] {
        &self.mesh_ids
    }

    pub fn is_initialized(&self) -> bool {
        !self.mesh_ids.is_empty()
    }

    pub(crate) fn push_mesh_id(&mut self, id: GpuMeshId) {
        self.mesh_ids.push(id);
    }
}

impl ComponentHooks for MeshComponent {
    fn tag(&self) -> ComponentTag {
        ComponentTag::Mesh
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::GRAPHICS_RESOURCE
            | Capabilities::DESTROY
            | Capabilities::SERIALIZE
            | Capabilities::DESERIALIZE
    }

    /// `"mesh"` is the first mesh, `"mesh:N"` the N-th.
    fn graphics_resource(&self, name: &str) -> Option<GraphicsResource> {
        let index = match name {
            "mesh" => 0,
            _ => name.strip_prefix("mesh:")?.parse().ok()?,
        };
        self.mesh_ids.get(index).copied().map(GraphicsResource::Mesh)
    }

    fn destroy(&mut self, released: &mut Vec<GraphicsResource>) {
        released.extend(self.mesh_ids.drain(..).map(GraphicsResource::Mesh));
    }

    fn serialize(&self) -> Option<ComponentRecord> {
        to_record(self)
    }
}

impl Component for MeshComponent {
    const TAG: ComponentTag = ComponentTag::Mesh;

    fn deserialize(record: &ComponentRecord) -> Result<Self, SceneError> {
        from_record(record)
    }
}

bitflags! {
    /// Texture maps a material samples.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TextureFlags: u32 {
        const BASE_COLOR = 1 << 0;
        const NORMAL = 1 << 1;
        const METALLIC_ROUGHNESS = 1 << 2;
        const OCCLUSION = 1 << 3;
        const EMISSIVE = 1 << 4;
    }
}

/// PBR material parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialComponent {
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    /// Texture maps bound for this material.
    pub texture_flags: TextureFlags,
    /// Samples textures even without explicit maps (procedural materials).
    pub intrinsically_textured: bool,
}

impl Default for MaterialComponent {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            metallic: 0.0,
            roughness: 0.5,
            emissive: Vec3::ZERO,
            texture_flags: TextureFlags::empty(),
            intrinsically_textured: false,
        }
    }
}

impl MaterialComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_color(mut self, color: Vec4) -> Self {
        self.base_color = color;
        self
    }

    pub fn metallic_roughness(mut self, metallic: f32, roughness: f32) -> Self {
        self.metallic = metallic;
        self.roughness = roughness;
        self
    }

    pub fn textures(mut self, flags: TextureFlags) -> Self {
        self.texture_flags = flags;
        self
    }

    pub fn intrinsically_textured(mut self, textured: bool) -> Self {
        self.intrinsically_textured = textured;
        self
    }

    /// Whether the shader needs texture coordinates and samplers.
    pub fn is_textured(&self) -> bool {
        !self.texture_flags.is_empty() || self.intrinsically_textured
    }
}

record_component!(MaterialComponent, Material);

/// Explicit visibility toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityComponent {
    pub visible: bool,
}

impl Default for VisibilityComponent {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl VisibilityComponent {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }
}

record_component!(VisibilityComponent, Visibility);

/// Per-entity shadow participation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowComponent {
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Default for ShadowComponent {
    fn default() -> Self {
        Self {
            cast_shadow: true,
            receive_shadow: true,
        }
    }
}

impl ShadowComponent {
    pub fn new(cast_shadow: bool, receive_shadow: bool) -> Self {
        Self {
            cast_shadow,
            receive_shadow,
        }
    }
}

record_component!(ShadowComponent, Shadow);

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
    Spot,
}

/// Light source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightComponent {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    /// Direction the light travels. Used by directional and spot lights.
    pub direction: Vec3,
}

impl LightComponent {
    /// Create a white directional light.
    pub fn directional(direction: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color: Vec3::ONE,
            intensity,
            direction,
        }
    }

    /// Create a white point light.
    pub fn point(intensity: f32) -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::ONE,
            intensity,
            direction: Vec3::NEG_Y,
        }
    }

    /// Orthographic light view-projection covering a sphere of `radius`
    /// around `center`, looking along the light direction.
    pub fn shadow_view_projection(&self, center: Vec3, radius: f32) -> Mat4 {
        let radius = radius.max(1.0);
        let light_dir = self.direction.try_normalize().unwrap_or(Vec3::NEG_Y);
        let up = if light_dir.abs().dot(Vec3::Y) > 0.99 {
            Vec3::Z
        } else {
            Vec3::Y
        };

        let light_pos = center - light_dir * radius * 2.0;
        let light_view = Mat4::look_at_rh(light_pos, center, up);

        let ortho_size = radius * 1.5;
        let light_proj = Mat4::orthographic_rh(
            -ortho_size,
            ortho_size,
            -ortho_size,
            ortho_size,
            0.1,
            radius * 4.0,
        );

        light_proj * light_view
    }
}

record_component!(LightComponent, Light);

/// Projection mode for a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians.
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    /// Create a perspective projection.
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::Perspective {
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    /// Create an orthographic projection.
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self::Orthographic {
            width,
            height,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                fov,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov, aspect, near, far),
            Projection::Orthographic {
                width,
                height,
                near,
                far,
            } => Mat4::orthographic_rh(
                -width / 2.0,
                width / 2.0,
                -height / 2.0,
                height / 2.0,
                near,
                far,
            ),
        }
    }

    /// Update the aspect ratio.
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective { aspect: a, .. } = self {
            *a = aspect;
        }
    }
}

/// Camera attached to an entity. The view comes from the sibling transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraComponent {
    pub projection: Projection,
    pub active: bool,
}

impl CameraComponent {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            active: true,
        }
    }

    /// View matrix for a camera placed at `position` with `rotation`.
    /// The camera looks down its local -Z axis.
    pub fn view_matrix(position: Vec3, rotation: glam::Quat) -> Mat4 {
        Mat4::from_rotation_translation(rotation, position).inverse()
    }

    pub fn view_projection(&self, position: Vec3, rotation: glam::Quat) -> Mat4 {
        self.projection.matrix() * Self::view_matrix(position, rotation)
    }
}

record_component!(CameraComponent, Camera);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_destroy_releases_ids() {
        let mut mesh = MeshComponent::new("rock").with_mesh_ids([GpuMeshId(3), GpuMeshId(4)]);
        assert_eq!(
            mesh.graphics_resource("mesh:1"),
            Some(GraphicsResource::Mesh(GpuMeshId(4)))
        );
        let mut released = Vec::new();
        mesh.destroy(&mut released);
        assert_eq!(
            released,
            vec![
                GraphicsResource::Mesh(GpuMeshId(3)),
                GraphicsResource::Mesh(GpuMeshId(4))
            ]
        );
        assert!(!mesh.is_initialized());
        assert_eq!(mesh.graphics_resource("mesh"), None);
    }

    #[test]
    fn test_mesh_record_skips_runtime_ids() {
        let mesh = MeshComponent::new("tree").with_mesh_ids([GpuMeshId(1)]);
        let record = ComponentHooks::serialize(&mesh).unwrap();
        assert_eq!(record["source"], "tree");
        assert!(!record.contains_key("mesh_ids"));
        let back = <MeshComponent as Component>::deserialize(&record).unwrap();
        assert!(!back.is_initialized());
    }

    #[test]
    fn test_material_textured() {
        assert!(!MaterialComponent::new().is_textured());
        assert!(MaterialComponent::new()
            .textures(TextureFlags::BASE_COLOR)
            .is_textured());
        assert!(MaterialComponent::new()
            .intrinsically_textured(true)
            .is_textured());
    }

    #[test]
    fn test_shadow_view_projection_centers_scene() {
        let light = LightComponent::directional(Vec3::new(-1.0, -1.0, 0.0), 1.0);
        let vp = light.shadow_view_projection(Vec3::new(10.0, 0.0, 0.0), 20.0);
        let clip = vp.project_point3(Vec3::new(10.0, 0.0, 0.0));
        assert!(clip.x.abs() < 1e-4);
        assert!(clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_shadow_view_projection_straight_down() {
        let light = LightComponent::directional(Vec3::NEG_Y, 1.0);
        let vp = light.shadow_view_projection(Vec3::ZERO, 10.0);
        assert!(vp.is_finite());
    }

    #[test]
    fn test_camera_view_looks_down_neg_z() {
        let camera = CameraComponent::new(Projection::perspective(60.0, 1.0, 0.1, 100.0));
        let vp = camera.view_projection(Vec3::ZERO, glam::Quat::IDENTITY);
        let ahead = vp.project_point3(Vec3::new(0.0, 0.0, -10.0));
        assert!(ahead.z > 0.0 && ahead.z < 1.0);
    }
}
