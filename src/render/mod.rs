//! Render layer
//!
//! Turns the mesh render system's variant groups into draw lists: a
//! per-mesh table of model uniforms, a lazily built pipeline cache keyed by
//! feature set and cull mode, and the renderer that batches draws per
//! pipeline. The wgpu backend replays draw lists into render passes.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod draw_list;
pub mod features;
pub mod mesh_registry;
pub mod pipeline_cache;
pub mod uniforms;
pub mod variant_renderer;
pub mod wgpu_backend;

pub use draw_list::{BindingRef, DrawCommand, DrawList, EnvironmentBinding};
pub use features::{ShaderFeatures, ShaderVariantGroup};
pub use mesh_registry::{GpuMeshSink, MeshData, MeshRecord, MeshRegistry};
pub use pipeline_cache::{CullMode, PipelineFactory, PipelineKey, VariantPipelineManager};
pub use uniforms::GlobalUniforms;
pub use variant_renderer::VariantRenderer;

/// Key into the mesh table. Never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GpuMeshId(pub u32);

impl fmt::Display for GpuMeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// Handle to a texture owned by the graphics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}
