//! Wind simulation.

use std::f32::consts::TAU;

use glam::Vec3;
use hecs::Entity;

use crate::config::WindSettings;
use crate::ecs::component::ComponentTag;
use crate::ecs::components::WindComponent;
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::systems::lod::entity_position;
use crate::ecs::World;

/// Largest step fed to the springs; longer frames are clamped.
const MAX_STEP: f32 = 0.1;

/// Shared wind state advanced once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindState {
    pub time: f32,
    /// Current gust contribution to strength.
    pub gust: f32,
    /// Current turbulence contribution to strength.
    pub turbulence: f32,
    /// Resulting force vector.
    pub force: Vec3,
}

impl WindState {
    /// Advance the global simulation by `dt`.
    pub fn advance(&mut self, dt: f32, settings: &WindSettings) {
        self.time += dt.max(0.0);
        let t = self.time;
        let cycle = TAU * settings.gust_frequency * t;
        // Two detuned waves so gusts do not repeat visibly.
        self.gust = settings.gust_strength
            * (0.5 + 0.5 * cycle.sin())
            * (0.75 + 0.25 * (cycle * 0.37 + 1.3).sin());
        self.turbulence = settings.turbulence
            * settings.strength
            * 0.5
            * ((t * 7.3).sin() + (t * 13.1 + 0.7).sin());
        let direction = Vec3::new(settings.direction.x, 0.0, settings.direction.z).normalize_or_zero();
        self.force = direction * (settings.strength + self.gust + self.turbulence).max(0.0);
    }
}

/// Stable per-entity phase from its XZ position.
pub fn wind_phase(position: Vec3) -> f32 {
    (position.x * 0.137 + position.z * 0.071).rem_euclid(1.0) * TAU
}

/// Advances the global wind and a damped spring per wind-enabled entity.
#[derive(Debug, Default)]
pub struct WindSystem {
    settings: WindSettings,
    state: WindState,
}

impl WindSystem {
    pub fn new(settings: WindSettings) -> Self {
        Self {
            settings,
            state: WindState::default(),
        }
    }

    pub fn state(&self) -> &WindState {
        &self.state
    }

    pub fn settings_mut(&mut self) -> &mut WindSettings {
        &mut self.settings
    }
}

impl System for WindSystem {
    fn name(&self) -> &'static str {
        "wind"
    }

    fn priority(&self) -> i32 {
        priority::WIND
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Wind]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], dt: f32, _ctx: &mut FrameContext<'_>) {
        self.state.advance(dt, &self.settings);
        let step = dt.clamp(0.0, MAX_STEP);
        let damping = self.settings.spring_damping.max(0.0);

        for &entity in entities {
            let phase = entity_position(world, entity).map(wind_phase).unwrap_or(0.0);
            let Some(mut wind) = world.get_mut::<WindComponent>(entity) else {
                continue;
            };
            if !wind.enabled {
                continue;
            }
            let flutter = 1.0 + 0.15 * (self.state.time * 1.7 + phase).sin();
            let force = self.state.force * wind.influence * flutter;

            // Semi-implicit Euler on a horizontal spring.
            let displacement = wind.displacement();
            let mut velocity = wind.velocity();
            let acceleration = force - displacement * wind.stiffness.max(0.0) - velocity * damping;
            velocity += acceleration * step;
            velocity.y = 0.0;
            let displacement = displacement + velocity * step;
            wind.set_state(displacement, velocity, phase);
        }
    }
}
