//! Engine configuration
//!
//! Plain settings structs with defaults and chained setters. All of them
//! deserialize from partial JSON documents; missing fields keep defaults.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Global render feature switches read by the systems every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Shadow mapping. Default: true.
    pub shadows_enabled: bool,
    /// Image-based lighting. Default: true.
    pub ibl_enabled: bool,
    /// Screen-space reflections. Default: true.
    pub ssr_enabled: bool,
    /// Wetness shading. Default: true.
    pub wetness_enabled: bool,
    /// Frustum culling. Default: true.
    pub frustum_culling: bool,
    /// Shadow casters farther than this from the camera are dropped.
    /// `None` means unlimited.
    pub max_shadow_distance: Option<f32>,
    /// Visualize wind displacement.
    pub debug_wind: bool,
    /// Visualize the wetness water line.
    pub debug_wetness: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadows_enabled: true,
            ibl_enabled: true,
            ssr_enabled: true,
            wetness_enabled: true,
            frustum_culling: true,
            max_shadow_distance: None,
            debug_wind: false,
            debug_wetness: false,
        }
    }
}

impl RenderSettings {
    /// Create render settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether shadows are rendered.
    pub fn shadows(mut self, enabled: bool) -> Self {
        self.shadows_enabled = enabled;
        self
    }

    /// Set whether image-based lighting is applied.
    pub fn ibl(mut self, enabled: bool) -> Self {
        self.ibl_enabled = enabled;
        self
    }

    /// Set whether screen-space reflections are available.
    pub fn ssr(mut self, enabled: bool) -> Self {
        self.ssr_enabled = enabled;
        self
    }

    /// Set whether wetness shading is applied.
    pub fn wetness(mut self, enabled: bool) -> Self {
        self.wetness_enabled = enabled;
        self
    }

    /// Set whether frustum culling runs.
    pub fn frustum_culling(mut self, enabled: bool) -> Self {
        self.frustum_culling = enabled;
        self
    }

    /// Limit shadow casters to a distance from the camera.
    pub fn max_shadow_distance(mut self, distance: Option<f32>) -> Self {
        self.max_shadow_distance = distance;
        self
    }

    /// Set the wind and wetness debug visualizations.
    pub fn debug(mut self, wind: bool, wetness: bool) -> Self {
        self.debug_wind = wind;
        self.debug_wetness = wetness;
        self
    }
}

/// Parameters of the shared wind simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindSettings {
    /// Prevailing wind direction in the XZ plane. Normalized on use.
    pub direction: Vec3,
    /// Steady wind strength.
    pub strength: f32,
    /// Additional strength at gust peaks.
    pub gust_strength: f32,
    /// Gust cycles per second.
    pub gust_frequency: f32,
    /// High-frequency turbulence amplitude relative to strength.
    pub turbulence: f32,
    /// Damping applied to per-entity springs.
    pub spring_damping: f32,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            direction: Vec3::X,
            strength: 1.0,
            gust_strength: 0.5,
            gust_frequency: 0.2,
            turbulence: 0.25,
            spring_damping: 4.0,
        }
    }
}

impl WindSettings {
    /// Create wind settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prevailing direction.
    pub fn direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    /// Set the steady strength.
    pub fn strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    /// Set gust strength and frequency.
    pub fn gusts(mut self, strength: f32, frequency: f32) -> Self {
        self.gust_strength = strength;
        self.gust_frequency = frequency;
        self
    }

    /// Set the turbulence amplitude.
    pub fn turbulence(mut self, turbulence: f32) -> Self {
        self.turbulence = turbulence;
        self
    }

    /// Set the spring damping.
    pub fn spring_damping(mut self, damping: f32) -> Self {
        self.spring_damping = damping;
        self
    }
}

/// Spatial index tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Maximum entities stored in one leaf. Default: 4.
    pub max_leaf_size: usize,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self { max_leaf_size: 4 }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub render: RenderSettings,
    pub wind: WindSettings,
    pub bvh: BvhConfig,
}

impl EngineConfig {
    /// Parse a JSON document. Missing sections and fields keep their defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the render settings.
    pub fn render(mut self, render: RenderSettings) -> Self {
        self.render = render;
        self
    }

    /// Set the wind settings.
    pub fn wind(mut self, wind: WindSettings) -> Self {
        self.wind = wind;
        self
    }

    /// Set the spatial index configuration.
    pub fn bvh(mut self, bvh: BvhConfig) -> Self {
        self.bvh = bvh;
        self
    }
}
