//! Frustum culling and shadow caster selection.

use hecs::Entity;
use tracing::debug;

use crate::ecs::component::ComponentTag;
use crate::ecs::components::{FrustumCullResults, ShadowComponent, VisibilityComponent};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::systems::lod::entity_position;
use crate::ecs::World;
use crate::math::Frustum;

/// Tests indexed world bounds against the camera frustum and publishes the
/// result on an internal results entity.
///
/// Culling disabled or no view-projection yet means nothing is culled.
#[derive(Debug, Default)]
pub struct FrustumCullSystem;

impl FrustumCullSystem {
    fn results_entity(world: &mut World) -> Option<Entity> {
        if let Some(entity) = world.find_first::<FrustumCullResults>() {
            return Some(entity);
        }
        let entity = world.spawn_internal("frustum-cull-results");
        world
            .add_component(entity, FrustumCullResults::default())
            .ok()
            .map(|_| entity)
    }
}

impl System for FrustumCullSystem {
    fn name(&self) -> &'static str {
        "frustum-cull"
    }

    fn priority(&self) -> i32 {
        priority::FRUSTUM_CULL
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[]
    }

    fn update(&mut self, world: &mut World, _entities: &[Entity], _dt: f32, ctx: &mut FrameContext<'_>) {
        let Some(results_entity) = Self::results_entity(world) else {
            return;
        };
        let view_projection = ctx
            .view_projection
            .filter(|_| ctx.settings.frustum_culling);

        let Some(view_projection) = view_projection else {
            if let Some(mut results) = world.get_mut::<FrustumCullResults>(results_entity) {
                results.disable();
            }
            return;
        };

        let frustum = Frustum::from_view_projection(view_projection);
        let index = world.spatial_index();
        let visible = index.query_frustum(&frustum);
        let tested: Vec<Entity> = index.entities().collect();

        if let Some(mut results) = world.get_mut::<FrustumCullResults>(results_entity) {
            results.publish(tested, visible);
            debug!(
                "frustum cull: {} visible, {} culled, {} tested",
                results.visible_count(),
                results.culled_count(),
                results.tested_count()
            );
        }
    }
}

/// Collects visible shadow casters within the configured distance.
#[derive(Debug, Default)]
pub struct ShadowCasterSystem;

impl System for ShadowCasterSystem {
    fn name(&self) -> &'static str {
        "shadow-caster"
    }

    fn priority(&self) -> i32 {
        priority::SHADOW_CASTER
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Shadow]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32, ctx: &mut FrameContext<'_>) {
        let max_distance = ctx
            .settings
            .max_shadow_distance
            .filter(|d| d.is_finite());

        let casters: Vec<Entity> = entities
            .iter()
            .copied()
            .filter(|e| world.get::<ShadowComponent>(*e).is_some_and(|s| s.cast_shadow))
            .filter(|e| world.get::<VisibilityComponent>(*e).map_or(true, |v| v.visible))
            .filter(|e| world.is_visible(*e))
            .filter(|e| match (max_distance, ctx.camera_position) {
                (Some(max), Some(camera)) => entity_position(world, *e)
                    .map_or(true, |p| p.distance(camera) <= max),
                _ => true,
            })
            .collect();

        debug!("{} shadow casters", casters.len());
        world.frame_mut().shadow_casters = casters;
    }
}
