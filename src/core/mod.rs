//! Core rendering abstractions
//!
//! Mid-level wrappers over wgpu primitives used by the wgpu backend.

pub mod buffer;
pub mod pipeline;
pub mod render_states;
pub mod texture;
pub mod vertex;

pub use buffer::{IndexBuffer, RawUniformBuffer, UniformBuffer, VertexBuffer};
pub use pipeline::PipelineBuilder;
pub use render_states::DepthState;
pub use texture::{check_upload, DepthTexture, Texture2D, TextureCubeMap};
pub use vertex::MeshVertex;
