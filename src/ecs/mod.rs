//! Entity component system.
//!
//! [`World`] wraps `hecs` storage with stable string ids, capability-checked
//! component hooks, priority-ordered systems, a BVH over world bounds, and a
//! two-phase entity deletion queue.

pub mod component;
pub mod components;
pub mod spatial;
pub mod system;
pub mod systems;
pub mod world;

pub use component::{
    Capabilities, Component, ComponentHooks, ComponentRecord, ComponentTag, GraphicsResource,
};
pub use hecs::Entity;
pub use spatial::Bvh;
pub use system::{priority, FrameContext, System};
pub use world::{EntityMeta, EntityRecord, FrameOutputs, SceneBounds, World};

pub mod prelude {
    pub use super::components::*;
    pub use super::systems::{
        standard_systems, BoundsSystem, FirstPersonNavigationSystem, FrustumCullSystem,
        LodSystem, MeshRenderSystem, ProbeCapture, ReflectionProbeSystem, ShadowCasterSystem,
        SsrSystem, TransformSystem, WetnessSystem, WindSystem,
    };
    pub use super::{
        Capabilities, Component, ComponentTag, Entity, FrameContext, System, World,
    };
}
