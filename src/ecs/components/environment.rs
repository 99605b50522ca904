//! Terrain and ocean handles.
//!
//! The generators live outside the engine; these components only hold the
//! query interfaces the simulation consumes.

use std::sync::Arc;

use crate::ecs::component::{Component, ComponentHooks, ComponentTag};
use crate::math::Aabb;

/// Height field queries exposed by a terrain generator.
pub trait TerrainProvider: Send + Sync {
    /// Whether height data can be sampled yet.
    fn is_ready(&self) -> bool;

    /// World-space extent of the terrain.
    fn bounds(&self) -> Aabb;

    /// Surface height at (x, z), `None` outside the terrain.
    fn height_at(&self, x: f32, z: f32) -> Option<f32>;
}

/// Water surface queries exposed by an ocean generator.
pub trait OceanSurface: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Height of the undisturbed water plane.
    fn base_level(&self) -> f32;

    /// Absolute surface height at (x, z) and `time`.
    fn wave_height(&self, x: f32, z: f32, time: f32, scale: f32, wavelength: f32) -> f32;
}

/// Calm water at a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct FlatWater {
    pub level: f32,
}

impl OceanSurface for FlatWater {
    fn is_ready(&self) -> bool {
        true
    }

    fn base_level(&self) -> f32 {
        self.level
    }

    fn wave_height(&self, _x: f32, _z: f32, _time: f32, _scale: f32, _wavelength: f32) -> f32 {
        self.level
    }
}

/// Terrain attached to an entity.
#[derive(Clone)]
pub struct TerrainComponent {
    provider: Arc<dyn TerrainProvider>,
}

impl TerrainComponent {
    pub fn new(provider: Arc<dyn TerrainProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn TerrainProvider {
        self.provider.as_ref()
    }
}

impl ComponentHooks for TerrainComponent {
    fn tag(&self) -> ComponentTag {
        ComponentTag::Terrain
    }
}

impl Component for TerrainComponent {
    const TAG: ComponentTag = ComponentTag::Terrain;
}

/// Ocean attached to an entity.
#[derive(Clone)]
pub struct OceanComponent {
    surface: Arc<dyn OceanSurface>,
    pub wave_scale: f32,
    pub wavelength: f32,
}

impl OceanComponent {
    pub fn new(surface: Arc<dyn OceanSurface>) -> Self {
        Self {
            surface,
            wave_scale: 1.0,
            wavelength: 20.0,
        }
    }

    pub fn waves(mut self, scale: f32, wavelength: f32) -> Self {
        self.wave_scale = scale;
        self.wavelength = wavelength;
        self
    }

    pub fn surface(&self) -> &dyn OceanSurface {
        self.surface.as_ref()
    }

    /// Wave-accurate surface height at (x, z).
    pub fn surface_height(&self, x: f32, z: f32, time: f32) -> f32 {
        self.surface
            .wave_height(x, z, time, self.wave_scale, self.wavelength)
    }
}

impl ComponentHooks for OceanComponent {
    fn tag(&self) -> ComponentTag {
        ComponentTag::Ocean
    }
}

impl Component for OceanComponent {
    const TAG: ComponentTag = ComponentTag::Ocean;
}
