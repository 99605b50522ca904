//! World bounds, spatial index and aggregate scene bounds.

use hecs::Entity;
use tracing::{debug, trace};

use crate::ecs::component::ComponentTag;
use crate::ecs::components::{BoundsComponent, TransformComponent};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::world::SceneBounds;
use crate::ecs::World;
use crate::math::transform_aabb;

/// Minimum absolute radius change that notifies listeners.
const RADIUS_HYSTERESIS: f32 = 0.5;
/// Minimum relative radius change that notifies listeners.
const RADIUS_HYSTERESIS_RATIO: f32 = 0.01;

type BoundsCallback = Box<dyn FnMut(&SceneBounds)>;

/// Updates dirty world bounds, keeps the spatial index in sync and
/// maintains the aggregate scene bounds.
#[derive(Default)]
pub struct BoundsSystem {
    notified_radius: Option<f32>,
    on_change: Option<BoundsCallback>,
}

impl BoundsSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the aggregate bounding radius moves by more than
    /// max(0.5, 1% of the last notified radius).
    pub fn on_change(mut self, callback: impl FnMut(&SceneBounds) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    fn should_notify(&self, radius: f32) -> bool {
        match self.notified_radius {
            None => true,
            Some(previous) => {
                (radius - previous).abs() > RADIUS_HYSTERESIS.max(previous * RADIUS_HYSTERESIS_RATIO)
            }
        }
    }
}

impl System for BoundsSystem {
    fn name(&self) -> &'static str {
        "bounds"
    }

    fn priority(&self) -> i32 {
        priority::BOUNDS
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Bounds]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32, _ctx: &mut FrameContext<'_>) {
        // Removals through the World API also count as changes.
        let mut changed = world.spatial_index().is_dirty();

        for &entity in entities {
            let model = world
                .get::<TransformComponent>(entity)
                .map(|t| t.model_matrix())
                .unwrap_or(glam::Mat4::IDENTITY);

            let world_bounds = {
                let Some(mut bounds) = world.get_mut::<BoundsComponent>(entity) else {
                    continue;
                };
                if !bounds.is_dirty() {
                    continue;
                }
                let world_bounds = transform_aabb(bounds.local_bounds(), &model);
                bounds.apply_world_bounds(world_bounds);
                world_bounds
            };

            if world_bounds.is_valid() {
                world.spatial_index_mut().insert(entity, world_bounds);
            } else {
                world.spatial_index_mut().remove(entity);
            }
            trace!("bounds of {entity:?} -> {world_bounds:?}");
            changed = true;
        }

        if !changed {
            return;
        }

        world.spatial_index_mut().rebuild_if_dirty();
        let aggregate = world.spatial_index().bounds();
        let scene = aggregate.is_valid().then(|| SceneBounds {
            bounds: aggregate,
            radius: aggregate.bounding_radius(),
        });
        world.set_scene_bounds(scene);

        if let Some(scene) = scene {
            if self.should_notify(scene.radius) {
                debug!("scene bounds radius now {:.2}", scene.radius);
                self.notified_radius = Some(scene.radius);
                if let Some(callback) = self.on_change.as_mut() {
                    callback(&scene);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderSettings;
    use crate::ecs::systems::TransformSystem;
    use crate::math::Aabb;
    use glam::Vec3;
    use std::cell::Cell;
    use std::rc::Rc;

    fn unit_box() -> BoundsComponent {
        BoundsComponent::new(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
    }

    fn step(world: &mut World, systems: &mut [&mut dyn System]) {
        let settings = RenderSettings::default();
        let mut ctx = FrameContext::new(&settings);
        for system in systems.iter_mut() {
            let entities = world.query(system.required_components());
            system.update(world, &entities, 0.016, &mut ctx);
        }
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let mut world = World::default();
        let e = world.spawn("e");
        world
            .add_component(e, TransformComponent::from_position(Vec3::new(10.0, 0.0, 0.0)))
            .unwrap();
        world.add_component(e, unit_box()).unwrap();

        let mut transform = TransformSystem;
        let mut bounds = BoundsSystem::new();
        step(&mut world, &mut [&mut transform, &mut bounds]);

        let wb = *world.get::<BoundsComponent>(e).unwrap().world_bounds();
        assert!((wb.min - Vec3::new(9.0, -1.0, -1.0)).length() < 1e-5);
        assert_eq!(world.spatial_index().get(e), Some(&wb));
        assert!(world.scene_bounds().is_some());
    }

    #[test]
    fn test_hysteresis() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut world = World::default();
        let e = world.spawn("e");
        world.add_component(e, TransformComponent::new()).unwrap();
        world
            .add_component(
                e,
                BoundsComponent::new(Aabb::new(Vec3::splat(-50.0), Vec3::splat(50.0))),
            )
            .unwrap();

        let mut transform = TransformSystem;
        let mut bounds = BoundsSystem::new().on_change(move |_| counter.set(counter.get() + 1));
        step(&mut world, &mut [&mut transform, &mut bounds]);
        assert_eq!(fired.get(), 1);

        // Radius ~86.6; a 0.1 unit nudge stays under the 1% threshold.
        world
            .update_transform(e, |t| t.set_position(Vec3::new(0.1, 0.0, 0.0)))
            .unwrap();
        step(&mut world, &mut [&mut transform, &mut bounds]);
        assert_eq!(fired.get(), 1);

        // Doubling the size crosses it.
        world
            .update_transform(e, |t| t.set_scale(Vec3::splat(2.0)))
            .unwrap();
        step(&mut world, &mut [&mut transform, &mut bounds]);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_clean_bounds_skipped() {
        let mut world = World::default();
        let e = world.spawn("e");
        world.add_component(e, unit_box()).unwrap();
        let mut bounds = BoundsSystem::new();
        step(&mut world, &mut [&mut bounds]);
        assert!(!world.get::<BoundsComponent>(e).unwrap().is_dirty());
        assert!(!world.spatial_index().is_dirty());
    }
}
