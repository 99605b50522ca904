//! Shader feature selection and variant grouping.

use std::collections::BTreeMap;

use hecs::Entity;
use tracing::{debug, trace};

use crate::config::RenderSettings;
use crate::ecs::component::ComponentTag;
use crate::ecs::components::{
    MaterialComponent, MeshComponent, ReflectionProbeComponent, ShadowComponent, SsrComponent,
    TransformComponent, VisibilityComponent, WetnessComponent, WindComponent,
};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::World;
use crate::render::uniforms::{wetness_offset, WetnessUniform, WindUniform, WIND_OFFSET};
use crate::render::{GpuMeshId, ShaderFeatures, ShaderVariantGroup};

/// Features an entity renders with this frame.
///
/// A baked, enabled reflection probe replaces SSR; the two are never both
/// set.
pub fn entity_features(world: &World, entity: Entity, settings: &RenderSettings) -> ShaderFeatures {
    let mut features = ShaderFeatures::empty();

    if settings.shadows_enabled
        && world
            .get::<ShadowComponent>(entity)
            .map_or(true, |s| s.receive_shadow)
    {
        features |= ShaderFeatures::SHADOW;
    }
    if settings.ibl_enabled {
        features |= ShaderFeatures::IBL;
    }
    if world
        .get::<MaterialComponent>(entity)
        .is_some_and(|m| m.is_textured())
    {
        features |= ShaderFeatures::TEXTURED;
    }
    if world.get::<WindComponent>(entity).is_some_and(|w| w.enabled) {
        features |= ShaderFeatures::WIND;
    }
    if settings.wetness_enabled
        && world
            .get::<WetnessComponent>(entity)
            .is_some_and(|w| w.enabled && w.wetness_factor() > 0.0)
    {
        features |= ShaderFeatures::WETNESS;
    }

    if world
        .get::<ReflectionProbeComponent>(entity)
        .is_some_and(|p| p.is_ready())
    {
        features |= ShaderFeatures::REFLECTION_PROBE;
    } else if world.get::<SsrComponent>(entity).is_some_and(|s| s.is_active()) {
        features |= ShaderFeatures::SSR;
    }

    features
}

/// Pushes changed matrices and feature uniforms to the GPU mesh table and
/// rebuilds the frame's variant groups from scratch.
#[derive(Debug, Default)]
pub struct MeshRenderSystem;

impl MeshRenderSystem {
    fn write_feature_uniforms(
        world: &World,
        entity: Entity,
        features: ShaderFeatures,
        mesh_ids: &[GpuMeshId],
        ctx: &mut FrameContext<'_>,
    ) {
        let Some(sink) = ctx.mesh_sink.as_mut() else {
            return;
        };
        let wind_active = features.contains(ShaderFeatures::WIND);

        if wind_active {
            if let Some(wind) = world.get::<WindComponent>(entity) {
                let block = WindUniform {
                    displacement: wind.displacement().to_array(),
                    phase: wind.phase(),
                    anchor_height: wind.anchor_height,
                    debug_mode: ctx.settings.debug_wind as u32,
                    _padding: [0.0; 2],
                };
                for &id in mesh_ids {
                    sink.write_mesh_uniform(id, WIND_OFFSET, bytemuck::bytes_of(&block));
                }
            }
        }

        if features.contains(ShaderFeatures::WETNESS) {
            if let Some(wetness) = world.get::<WetnessComponent>(entity) {
                let block = WetnessUniform {
                    water_line: wetness.water_line(),
                    factor: wetness.wetness_factor(),
                    debug: ctx.settings.debug_wetness as u32,
                    _padding: 0.0,
                };
                let offset = wetness_offset(wind_active);
                for &id in mesh_ids {
                    sink.write_mesh_uniform(id, offset, bytemuck::bytes_of(&block));
                }
            }
        }
    }
}

impl System for MeshRenderSystem {
    fn name(&self) -> &'static str {
        "mesh-render"
    }

    fn priority(&self) -> i32 {
        priority::MESH_RENDER
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Transform]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32, ctx: &mut FrameContext<'_>) {
        let mut groups: BTreeMap<String, ShaderVariantGroup> = BTreeMap::new();

        for &entity in entities {
            let mesh_ids: Vec<GpuMeshId> = world
                .get::<MeshComponent>(entity)
                .map(|m| m.mesh_ids().to_vec())
                .unwrap_or_default();

            // The updated flag is only consumed once a sink has seen it.
            if let Some(sink) = ctx.mesh_sink.as_mut() {
                if let Some(mut transform) = world.get_mut::<TransformComponent>(entity) {
                    if transform.take_updated() {
                        let model = transform.model_matrix();
                        for &id in &mesh_ids {
                            sink.update_model_matrix(id, &model);
                        }
                    }
                }
            }

            if !world.has::<MeshComponent>(entity) {
                continue;
            }
            if world.get::<VisibilityComponent>(entity).is_some_and(|v| !v.visible) {
                trace!("{entity:?} hidden");
                continue;
            }
            if !world.is_visible(entity) {
                trace!("{entity:?} culled");
                continue;
            }

            let features = entity_features(world, entity, ctx.settings);
            Self::write_feature_uniforms(world, entity, features, &mesh_ids, ctx);

            groups
                .entry(features.key())
                .or_insert_with(|| ShaderVariantGroup::new(features))
                .entities
                .push(entity);
        }

        debug!("{} variant groups", groups.len());
        world.frame_mut().variant_groups = groups.into_values().collect();
    }
}
