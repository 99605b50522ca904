//! Model matrix recompute.

use hecs::Entity;

use crate::ecs::component::ComponentTag;
use crate::ecs::components::{compose_model_matrix, BoundsComponent, Pivot, TransformComponent};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::World;

/// Recomputes the model matrix of every dirty transform, flags it as
/// updated for the render system and marks sibling bounds dirty.
///
/// A bottom or top pivot is also recomputed when the sibling local bounds
/// change.
#[derive(Debug, Default)]
pub struct TransformSystem;

impl System for TransformSystem {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn priority(&self) -> i32 {
        priority::TRANSFORM
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Transform]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32, _ctx: &mut FrameContext<'_>) {
        for &entity in entities {
            let (local_bounds, bounds_changed) = match world.get_mut::<BoundsComponent>(entity) {
                Some(mut bounds) => {
                    let local = Some(*bounds.local_bounds()).filter(|b| b.is_valid());
                    (local, bounds.take_local_changed())
                }
                None => (None, false),
            };

            {
                let Some(mut transform) = world.get_mut::<TransformComponent>(entity) else {
                    continue;
                };
                let pivot_moved = bounds_changed && transform.pivot() != Pivot::Center;
                if !transform.is_dirty() && !pivot_moved {
                    continue;
                }
                let model = compose_model_matrix(
                    transform.position(),
                    transform.rotation(),
                    transform.scale(),
                    transform.pivot(),
                    local_bounds.as_ref(),
                );
                transform.apply_matrix(model);
            }

            if let Some(mut bounds) = world.get_mut::<BoundsComponent>(entity) {
                bounds.mark_dirty();
            }
        }
    }
}
