//! GPU mesh table.
//!
//! Holds one record per uploaded mesh: geometry metadata, the CPU mirror of
//! its uniform block, and backend resources `R`. Uniform writes land in the
//! mirror and are flushed to the device by the backend.

use std::collections::HashMap;
use std::ops::Range;

use glam::Mat4;
use tracing::{trace, warn};

use crate::ecs::GraphicsResource;
use crate::error::RenderError;
use crate::math::Aabb;
use crate::render::uniforms::{ModelUniform, MESH_UNIFORM_SIZE};
use crate::render::GpuMeshId;

/// Receives per-mesh uniform updates from the mesh render system.
pub trait GpuMeshSink {
    /// Replace the model and normal matrix of a mesh.
    fn update_model_matrix(&mut self, mesh: GpuMeshId, model: &Mat4);

    /// Write `bytes` into the mesh's uniform block at `offset`.
    fn write_mesh_uniform(&mut self, mesh: GpuMeshId, offset: u64, bytes: &[u8]);
}

/// CPU-side geometry handed to [`MeshRegistry::create_mesh`].
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    /// Check the data can be uploaded.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.positions.is_empty() {
            return Err(RenderError::InvalidMesh("no vertices".into()));
        }
        let n = self.positions.len();
        if !self.normals.is_empty() && self.normals.len() != n {
            return Err(RenderError::InvalidMesh(format!(
                "{} normals for {n} vertices",
                self.normals.len()
            )));
        }
        if !self.uvs.is_empty() && self.uvs.len() != n {
            return Err(RenderError::InvalidMesh(format!(
                "{} uvs for {n} vertices",
                self.uvs.len()
            )));
        }
        if let Some(indices) = &self.indices {
            if indices.is_empty() || indices.len() % 3 != 0 {
                return Err(RenderError::InvalidMesh(format!(
                    "index count {} is not a positive multiple of 3",
                    indices.len()
                )));
            }
            if let Some(bad) = indices.iter().find(|i| **i as usize >= n) {
                return Err(RenderError::InvalidMesh(format!(
                    "index {bad} out of range for {n} vertices"
                )));
            }
        } else if n % 3 != 0 {
            return Err(RenderError::InvalidMesh(format!(
                "{n} vertices do not form triangles"
            )));
        }
        if self.positions.iter().flatten().any(|v| !v.is_finite()) {
            return Err(RenderError::InvalidMesh("non-finite position".into()));
        }
        Ok(())
    }

    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().map(|p| glam::Vec3::from(*p)))
    }
}

/// One uploaded mesh.
#[derive(Debug)]
pub struct MeshRecord<R> {
    pub vertex_count: u32,
    pub index_count: Option<u32>,
    pub local_bounds: Aabb,
    /// Model matrix last written by the render system.
    pub model: Mat4,
    uniform: Vec<u8>,
    dirty: Option<Range<u64>>,
    pub resources: R,
}

impl<R> MeshRecord<R> {
    /// CPU mirror of the uniform block.
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.uniform
    }

    /// Byte range written since the last flush.
    pub fn dirty_range(&self) -> Option<Range<u64>> {
        self.dirty.clone()
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) -> bool {
        let end = offset + bytes.len() as u64;
        if end > self.uniform.len() as u64 {
            return false;
        }
        self.uniform[offset as usize..end as usize].copy_from_slice(bytes);
        self.dirty = Some(match self.dirty.take() {
            Some(range) => range.start.min(offset)..range.end.max(end),
            None => offset..end,
        });
        true
    }
}

/// Table of uploaded meshes keyed by [`GpuMeshId`].
#[derive(Debug)]
pub struct MeshRegistry<R = ()> {
    meshes: HashMap<GpuMeshId, MeshRecord<R>>,
    next_id: u32,
}

impl<R> Default for MeshRegistry<R> {
    fn default() -> Self {
        Self {
            meshes: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<R> MeshRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `data` and register a mesh with its backend resources.
    pub fn create_mesh(&mut self, data: &MeshData, resources: R) -> Result<GpuMeshId, RenderError> {
        data.validate()?;
        let id = GpuMeshId(self.next_id);
        self.next_id += 1;

        let mut record = MeshRecord {
            vertex_count: data.positions.len() as u32,
            index_count: data.indices.as_ref().map(|i| i.len() as u32),
            local_bounds: data.local_bounds(),
            model: Mat4::IDENTITY,
            uniform: vec![0; MESH_UNIFORM_SIZE as usize],
            dirty: None,
            resources,
        };
        record.write(0, bytemuck::bytes_of(&ModelUniform::new(&Mat4::IDENTITY)));
        self.meshes.insert(id, record);
        trace!("registered {id}");
        Ok(id)
    }

    /// Remove a mesh; its id is never issued again.
    pub fn remove_mesh(&mut self, id: GpuMeshId) -> Result<R, RenderError> {
        self.meshes
            .remove(&id)
            .map(|record| record.resources)
            .ok_or(RenderError::UnknownMesh(id))
    }

    /// Release a resource handed back by a component destroy hook.
    /// Returns the backend resources when it was a known mesh.
    pub fn release(&mut self, resource: &GraphicsResource) -> Option<R> {
        match resource {
            GraphicsResource::Mesh(id) => {
                self.remove_mesh(*id)
                    .inspect_err(|err| warn!("release skipped: {err}"))
                    .ok()
            }
            _ => None,
        }
    }

    pub fn get(&self, id: GpuMeshId) -> Option<&MeshRecord<R>> {
        self.meshes.get(&id)
    }

    /// Like [`get`](Self::get), failing with [`RenderError::UnknownMesh`].
    pub fn resolve(&self, id: GpuMeshId) -> Result<&MeshRecord<R>, RenderError> {
        self.meshes.get(&id).ok_or(RenderError::UnknownMesh(id))
    }

    pub fn contains(&self, id: GpuMeshId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Visit every mesh with pending uniform writes and clear the marks.
    pub fn flush_uniforms(&mut self, mut f: impl FnMut(GpuMeshId, &R, Range<u64>, &[u8])) {
        for (id, record) in self.meshes.iter_mut() {
            if let Some(range) = record.dirty.take() {
                let bytes = &record.uniform[range.start as usize..range.end as usize];
                f(*id, &record.resources, range.clone(), bytes);
            }
        }
    }
}

impl<R> GpuMeshSink for MeshRegistry<R> {
    fn update_model_matrix(&mut self, mesh: GpuMeshId, model: &Mat4) {
        let Some(record) = self.meshes.get_mut(&mesh) else {
            warn!("model matrix for unknown {mesh}");
            return;
        };
        record.model = *model;
        record.write(0, bytemuck::bytes_of(&ModelUniform::new(model)));
    }

    fn write_mesh_uniform(&mut self, mesh: GpuMeshId, offset: u64, bytes: &[u8]) {
        let Some(record) = self.meshes.get_mut(&mesh) else {
            warn!("uniform write for unknown {mesh}");
            return;
        };
        if !record.write(offset, bytes) {
            warn!(
                "uniform write of {} bytes at {offset} overflows {mesh}",
                bytes.len()
            );
        }
    }
}
