//! Built-in systems.

pub mod bounds;
pub mod culling;
pub mod lod;
pub mod mesh_render;
pub mod navigation;
pub mod reflection;
pub mod transform;
pub mod wetness;
pub mod wind;

pub use bounds::BoundsSystem;
pub use culling::{FrustumCullSystem, ShadowCasterSystem};
pub use lod::LodSystem;
pub use mesh_render::{entity_features, MeshRenderSystem};
pub use navigation::FirstPersonNavigationSystem;
pub use reflection::{ProbeCapture, ReflectionProbeSystem, SsrSystem};
pub use transform::TransformSystem;
pub use wetness::WetnessSystem;
pub use wind::{WindState, WindSystem};

use crate::config::EngineConfig;
use crate::ecs::System;

/// Every simulation and render-preparation system with its default
/// priority. Navigation is opt-in and not included.
pub fn standard_systems(config: &EngineConfig) -> Vec<Box<dyn System>> {
    vec![
        Box::new(TransformSystem),
        Box::new(BoundsSystem::new()),
        Box::new(LodSystem),
        Box::new(WindSystem::new(config.wind.clone())),
        Box::new(WetnessSystem),
        Box::new(FrustumCullSystem),
        Box::new(ShadowCasterSystem),
        Box::new(SsrSystem),
        Box::new(ReflectionProbeSystem::default()),
        Box::new(MeshRenderSystem),
    ]
}
