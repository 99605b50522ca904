//! Wind response component.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ecs::component::record_component;

/// Spring-driven wind sway of a mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindComponent {
    pub enabled: bool,
    /// Spring constant pulling the displacement back to rest.
    pub stiffness: f32,
    /// Height in local space below which vertices do not sway.
    pub anchor_height: f32,
    /// Scale applied to the global wind force.
    pub influence: f32,
    #[serde(skip)]
    displacement: Vec3,
    #[serde(skip)]
    velocity: Vec3,
    #[serde(skip)]
    phase: f32,
}

impl Default for WindComponent {
    fn default() -> Self {
        Self {
            enabled: true,
            stiffness: 8.0,
            anchor_height: 0.0,
            influence: 1.0,
            displacement: Vec3::ZERO,
            velocity: Vec3::ZERO,
            phase: 0.0,
        }
    }
}

impl WindComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn anchor_height(mut self, height: f32) -> Self {
        self.anchor_height = height;
        self
    }

    pub fn influence(mut self, influence: f32) -> Self {
        self.influence = influence;
        self
    }

    pub fn displacement(&self) -> Vec3 {
        self.displacement
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Per-entity animation phase in radians.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub(crate) fn set_state(&mut self, displacement: Vec3, velocity: Vec3, phase: f32) {
        self.displacement = displacement;
        self.velocity = velocity;
        self.phase = phase;
    }
}

record_component!(WindComponent, Wind);
