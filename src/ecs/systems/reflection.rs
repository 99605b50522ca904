//! Screen-space reflection gating and reflection probe baking.

use glam::Vec3;
use hecs::Entity;
use tracing::{info, warn};

use crate::ecs::component::ComponentTag;
use crate::ecs::components::{
    matrix_hash, BakeState, BoundsComponent, LodComponent, ReflectionProbeComponent,
    SsrComponent,
};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::World;

/// Frames a probe may wait for a capture backend before it is reported.
const PENDING_WARN_FRAMES: u32 = 300;

/// Renders cube maps for reflection probes.
///
/// Called once per `pending -> baking` transition. The implementation
/// finishes the bake later through
/// [`World::finish_probe_bake`](crate::ecs::World::finish_probe_bake).
pub trait ProbeCapture {
    fn bake_probe(&mut self, entity: Entity, probe: &ReflectionProbeComponent, position: Vec3);
}

/// Enables SSR only where it is globally enabled and the entity is at LOD 0.
#[derive(Debug, Default)]
pub struct SsrSystem;

impl System for SsrSystem {
    fn name(&self) -> &'static str {
        "ssr"
    }

    fn priority(&self) -> i32 {
        priority::SSR
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Ssr]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32, ctx: &mut FrameContext<'_>) {
        for &entity in entities {
            let lod = world.get::<LodComponent>(entity).map(|l| l.level()).unwrap_or(0);
            if let Some(mut ssr) = world.get_mut::<SsrComponent>(entity) {
                let active = ctx.settings.ssr_enabled && ssr.enabled && lod == 0;
                ssr.set_active(active);
            }
        }
    }
}

/// Drives the probe bake lifecycle and dispatches captures.
#[derive(Debug, Default)]
pub struct ReflectionProbeSystem {
    frames_without_capture: u32,
}

impl System for ReflectionProbeSystem {
    fn name(&self) -> &'static str {
        "reflection-probe"
    }

    fn priority(&self) -> i32 {
        priority::REFLECTION_PROBE
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::ReflectionProbe]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32, ctx: &mut FrameContext<'_>) {
        let mut waiting = 0;

        for &entity in entities {
            let model = world.model_matrix(entity);
            let hash = matrix_hash(&model);
            let position = world
                .get::<BoundsComponent>(entity)
                .map(|b| *b.world_bounds())
                .filter(|b| b.is_valid())
                .map(|b| b.center())
                .unwrap_or_else(|| model.w_axis.truncate());

            let Some(mut probe) = world.get_mut::<ReflectionProbeComponent>(entity) else {
                continue;
            };

            if probe.bake_state() == BakeState::Baked
                && probe.auto_bake_on_transform_change
                && probe.baked_matrix_hash() != Some(hash)
            {
                probe.invalidate();
                info!("reflection probe on {entity:?} moved, re-baking");
            }

            if probe.bake_state() != BakeState::Pending || !probe.enabled {
                continue;
            }
            let Some(capture) = ctx.capture.as_mut() else {
                waiting += 1;
                continue;
            };
            if let Err(err) = probe.begin_bake(position, hash) {
                warn!("reflection probe on {entity:?}: {err}");
                continue;
            }
            info!("baking reflection probe on {entity:?} at {position}");
            capture.bake_probe(entity, &probe, position);
        }

        if waiting == 0 {
            self.frames_without_capture = 0;
        } else {
            self.frames_without_capture += 1;
            if self.frames_without_capture == PENDING_WARN_FRAMES {
                warn!("{waiting} reflection probes pending with no capture backend attached");
            }
        }
    }
}
