//! Vista scene engine
//!
//! A component/system scene simulation feeding a shader-variant render
//! pipeline.
//!
//! # Architecture
//!
//! 1. **math** - bounding boxes and frustum tests
//! 2. **ecs** - [`World`], components, and the per-frame systems
//! 3. **render** - variant grouping output to draw lists: mesh table,
//!    pipeline cache, variant renderer, and the wgpu backend
//! 4. **context** / **core** - wgpu device wrapper and GPU primitives
//! 5. **engine** - [`SceneEngine`], the frame loop tying the above together
//!
//! The world and render layers are backend-neutral: everything up to a
//! [`DrawList`] runs without a GPU.

pub mod config;
pub mod context;
pub mod core;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod input;
pub mod math;
pub mod render;

pub use config::{BvhConfig, EngineConfig, RenderSettings, WindSettings};
pub use context::WgpuContext;
pub use ecs::prelude::*;
pub use engine::{snap_to_terrain, FrameDrawLists, ReleasedResources, SceneEngine, ShadowPass};
pub use error::{RenderError, SceneError};
pub use input::{InputEvent, Key};
pub use math::{Aabb, Frustum};
pub use render::{
    CullMode, DrawCommand, DrawList, GpuMeshId, MeshData, MeshRegistry, PipelineFactory,
    PipelineKey, ShaderFeatures, ShaderVariantGroup, TextureHandle, VariantPipelineManager,
    VariantRenderer,
};

// Re-export glam for convenience
pub use glam;
