//! Mesh vertex layout

use bytemuck::{Pod, Zeroable};

use crate::render::MeshData;

/// Vertex with position, normal and UV. Every variant pipeline reads this
/// layout; untextured variants ignore the UV.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Interleave mesh data. Missing normals default to +Y and missing UVs
    /// to zero.
    pub fn interleave(data: &MeshData) -> Vec<Self> {
        data.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                Self::new(
                    position,
                    data.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    data.uvs.get(i).copied().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Get the vertex buffer layout for this vertex type.
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // uv
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}
