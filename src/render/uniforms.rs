//! Per-mesh uniform block layout.
//!
//! ```text
//! offset 0    model matrix, normal matrix     128 bytes
//! offset 128  wind block (if wind is active)   32 bytes
//! then        wetness block                    16 bytes
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Size of the model block at offset 0.
pub const MODEL_BLOCK_SIZE: u64 = 128;
/// Size of the wind block.
pub const WIND_BLOCK_SIZE: u64 = 32;
/// Size of the wetness block.
pub const WETNESS_BLOCK_SIZE: u64 = 16;
/// Total per-mesh uniform buffer size.
pub const MESH_UNIFORM_SIZE: u64 = MODEL_BLOCK_SIZE + WIND_BLOCK_SIZE + WETNESS_BLOCK_SIZE;

/// Offset of the wind block.
pub const WIND_OFFSET: u64 = MODEL_BLOCK_SIZE;

/// Offset of the wetness block; directly after wind when wind is active.
pub fn wetness_offset(wind_active: bool) -> u64 {
    if wind_active {
        MODEL_BLOCK_SIZE + WIND_BLOCK_SIZE
    } else {
        MODEL_BLOCK_SIZE
    }
}

/// Model and normal matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: &Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: normal_matrix(model).to_cols_array_2d(),
        }
    }
}

/// Inverse transpose of the model matrix; identity when singular.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    if model.determinant().abs() <= f32::EPSILON {
        Mat4::IDENTITY
    } else {
        model.inverse().transpose()
    }
}

/// Wind sway state.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct WindUniform {
    pub displacement: [f32; 3],
    pub phase: f32,
    pub anchor_height: f32,
    pub debug_mode: u32,
    pub _padding: [f32; 2],
}

/// Wetness water line.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct WetnessUniform {
    pub water_line: f32,
    pub factor: f32,
    pub debug: u32,
    pub _padding: f32,
}

/// Frame-global shading inputs shared by every draw in a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalUniforms {
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub time: f32,
}

impl Default for GlobalUniforms {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            time: 0.0,
        }
    }
}

impl GlobalUniforms {
    pub fn to_gpu(&self) -> GlobalUniformData {
        GlobalUniformData {
            view_projection: self.view_projection.to_cols_array_2d(),
            camera_position: self.camera_position.to_array(),
            time: self.time,
        }
    }
}

/// GPU layout of [`GlobalUniforms`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalUniformData {
    pub view_projection: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub time: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_block_sizes() {
        assert_eq!(std::mem::size_of::<ModelUniform>() as u64, MODEL_BLOCK_SIZE);
        assert_eq!(std::mem::size_of::<WindUniform>() as u64, WIND_BLOCK_SIZE);
        assert_eq!(std::mem::size_of::<WetnessUniform>() as u64, WETNESS_BLOCK_SIZE);
        assert_eq!(MESH_UNIFORM_SIZE % 16, 0);
        assert_eq!(std::mem::size_of::<GlobalUniformData>(), 80);
    }

    #[test]
    fn test_wetness_offset() {
        assert_eq!(wetness_offset(false), 128);
        assert_eq!(wetness_offset(true), 160);
    }

    #[test]
    fn test_normal_matrix_uniform_scale() {
        let m = Mat4::from_scale(Vec3::splat(2.0));
        let n = normal_matrix(&m);
        let v = n.transform_vector3(Vec3::Y);
        assert!((v.normalize() - Vec3::Y).length() < 1e-5);
        assert_eq!(normal_matrix(&Mat4::ZERO), Mat4::IDENTITY);
    }
}
