//! Distance-based LOD selection.

use hecs::Entity;

use crate::ecs::component::ComponentTag;
use crate::ecs::components::{compute_lod, BoundsComponent, LodComponent, TransformComponent};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::World;

/// Selects each entity's LOD from its distance to the camera. Without a
/// camera position the previous levels are kept.
#[derive(Debug, Default)]
pub struct LodSystem;

impl System for LodSystem {
    fn name(&self) -> &'static str {
        "lod"
    }

    fn priority(&self) -> i32 {
        priority::LOD
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Lod]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32, ctx: &mut FrameContext<'_>) {
        let Some(camera) = ctx.camera_position else {
            return;
        };
        for &entity in entities {
            let Some(position) = entity_position(world, entity) else {
                continue;
            };
            let distance = position.distance(camera);
            if let Some(mut lod) = world.get_mut::<LodComponent>(entity) {
                let level = compute_lod(distance, lod.thresholds(), lod.max_lod());
                lod.set_level(level);
            }
        }
    }
}

/// Transform translation, else the world bounds center.
pub(crate) fn entity_position(world: &World, entity: Entity) -> Option<glam::Vec3> {
    if let Some(transform) = world.get::<TransformComponent>(entity) {
        return Some(transform.translation());
    }
    world
        .get::<BoundsComponent>(entity)
        .map(|b| *b.world_bounds())
        .filter(|b| b.is_valid())
        .map(|b| b.center())
}
