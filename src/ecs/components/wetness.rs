//! Wetness tracking component.

use serde::{Deserialize, Serialize};

use crate::ecs::component::record_component;

/// High water mark below which the wetness factor reads as dry.
pub const DRY_THRESHOLD: f32 = 0.001;

/// Tracks how high water has reached on an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WetnessComponent {
    pub enabled: bool,
    /// Units per second the high water mark recedes when not submerged.
    pub evaporation_rate: f32,
    /// Height of the object; upper bound of the high water mark.
    pub object_height: f32,
    high_water_mark: f32,
    #[serde(skip)]
    wetness_factor: f32,
    #[serde(skip)]
    water_line: f32,
}

impl Default for WetnessComponent {
    fn default() -> Self {
        Self {
            enabled: true,
            evaporation_rate: 0.05,
            object_height: 2.0,
            high_water_mark: 0.0,
            wetness_factor: 0.0,
            water_line: 0.0,
        }
    }
}

impl WetnessComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaporation_rate(mut self, rate: f32) -> Self {
        self.evaporation_rate = rate;
        self
    }

    pub fn object_height(mut self, height: f32) -> Self {
        self.object_height = height;
        self
    }

    /// Start with water already at `mark`.
    pub fn with_high_water_mark(mut self, mark: f32) -> Self {
        self.set_high_water_mark(mark);
        self
    }

    pub fn high_water_mark(&self) -> f32 {
        self.high_water_mark
    }

    /// 1.0 while any water mark remains, else 0.0.
    pub fn wetness_factor(&self) -> f32 {
        self.wetness_factor
    }

    /// World-space height of the current water mark.
    pub fn water_line(&self) -> f32 {
        self.water_line
    }

    pub(crate) fn set_water_line(&mut self, water_line: f32) {
        self.water_line = water_line;
    }

    pub(crate) fn set_high_water_mark(&mut self, mark: f32) {
        self.high_water_mark = mark.clamp(0.0, self.object_height.max(0.0));
        self.wetness_factor = if self.high_water_mark > DRY_THRESHOLD {
            1.0
        } else {
            0.0
        };
    }

    /// Advance one step: ratchet up to `submersion`, otherwise evaporate
    /// toward it.
    pub(crate) fn step(&mut self, submersion: f32, dt: f32) {
        let submersion = submersion.clamp(0.0, self.object_height.max(0.0));
        let mark = if submersion >= self.high_water_mark {
            submersion
        } else {
            (self.high_water_mark - self.evaporation_rate.max(0.0) * dt.max(0.0)).max(submersion)
        };
        self.set_high_water_mark(mark);
    }

    /// Evaporate without any water present.
    pub(crate) fn decay(&mut self, dt: f32) {
        self.step(0.0, dt);
    }
}

record_component!(WetnessComponent, Wetness);
