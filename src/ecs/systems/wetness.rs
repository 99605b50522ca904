//! Wetness from the ocean surface.

use hecs::Entity;
use tracing::trace;

use crate::ecs::component::ComponentTag;
use crate::ecs::components::{
    BoundsComponent, LodComponent, OceanComponent, WetnessComponent,
};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::systems::lod::entity_position;
use crate::ecs::World;

/// Tracks how far each wetness entity has been submerged.
///
/// The first ocean entity in the world is the water source. LOD 0 samples
/// the wave surface, LOD 1 uses the flat base level and LOD 2+ only
/// evaporates. Without a ready ocean everything evaporates.
#[derive(Debug, Default)]
pub struct WetnessSystem;

impl System for WetnessSystem {
    fn name(&self) -> &'static str {
        "wetness"
    }

    fn priority(&self) -> i32 {
        priority::WETNESS
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Wetness]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], dt: f32, ctx: &mut FrameContext<'_>) {
        let ocean = world
            .find_first::<OceanComponent>()
            .and_then(|e| world.get::<OceanComponent>(e).map(|o| (*o).clone()))
            .filter(|o| o.surface().is_ready());

        for &entity in entities {
            let lod = world.get::<LodComponent>(entity).map(|l| l.level()).unwrap_or(0);
            let (bottom, x, z) = match world
                .get::<BoundsComponent>(entity)
                .map(|b| *b.world_bounds())
                .filter(|b| b.is_valid())
            {
                Some(bounds) => {
                    let center = bounds.center();
                    (bounds.min.y, center.x, center.z)
                }
                None => {
                    let origin = entity_position(world, entity).unwrap_or_default();
                    (origin.y, origin.x, origin.z)
                }
            };

            let Some(mut wetness) = world.get_mut::<WetnessComponent>(entity) else {
                continue;
            };
            if !wetness.enabled {
                continue;
            }

            let water = match (&ocean, lod) {
                (Some(ocean), 0) => Some(ocean.surface_height(x, z, ctx.time)),
                (Some(ocean), 1) => Some(ocean.surface().base_level()),
                _ => None,
            };
            match water {
                Some(surface) => {
                    let submersion = (surface - bottom).clamp(0.0, wetness.object_height.max(0.0));
                    wetness.step(submersion, dt);
                }
                None => wetness.decay(dt),
            }
            let water_line = bottom + wetness.high_water_mark();
            wetness.set_water_line(water_line);
            trace!(
                "wetness of {entity:?}: mark {:.3} factor {}",
                wetness.high_water_mark(),
                wetness.wetness_factor()
            );
        }
    }
}
