//! Error types
//!
//! World mutation APIs report [`SceneError`]; the render layer reports
//! [`RenderError`]. Per-frame code paths log and skip instead of returning
//! either across a frame boundary.

use crate::ecs::component::{Capabilities, ComponentTag};
use crate::ecs::components::BakeState;
use crate::render::GpuMeshId;

/// Errors raised by [`World`](crate::ecs::World) mutation and serialization.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The entity handle or id does not refer to a live entity.
    #[error("no such entity: {0}")]
    NoSuchEntity(String),

    /// An entity with this id already exists.
    #[error("entity id already in use: {0}")]
    DuplicateEntityId(String),

    /// The component does not implement the requested capability.
    #[error("component `{tag}` does not support {capability:?}")]
    Unsupported {
        tag: ComponentTag,
        capability: Capabilities,
    },

    /// A component record could not be decoded.
    #[error("failed to decode component record: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// A reflection probe bake transition that the lifecycle does not allow.
    #[error("invalid bake transition {from:?} -> {to:?}")]
    InvalidBakeTransition { from: BakeState, to: BakeState },
}

/// Errors raised by the render layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The mesh id was never issued or has been removed.
    #[error("unknown gpu mesh {0}")]
    UnknownMesh(GpuMeshId),

    /// Mesh data failed validation.
    #[error("invalid mesh data: {0}")]
    InvalidMesh(String),

    /// A resource uses a pixel or vertex format the backend cannot upload.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Pipeline construction failed.
    #[error("pipeline build failed: {0}")]
    Pipeline(#[from] anyhow::Error),
}
