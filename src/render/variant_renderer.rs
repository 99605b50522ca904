//! Draw emission for shader variant groups.
//!
//! Draws are batched under the pipeline they need; a group mixing single-
//! and double-sided meshes uses both the back-culled and the double-sided
//! variant, otherwise only one. Groups using reflection probes rebind the
//! environment for every entity since each entity brings its own cube map.

use std::collections::{BTreeMap, HashSet};

use glam::{Mat4, Vec3};
use hecs::Entity;
use tracing::{debug, trace, warn};

use crate::ecs::components::{MeshComponent, ReflectionProbeComponent};
use crate::ecs::World;
use crate::render::draw_list::{BindingRef, DrawCommand, DrawList, EnvironmentBinding};
use crate::render::mesh_registry::MeshRegistry;
use crate::render::pipeline_cache::{CullMode, PipelineFactory, PipelineKey, VariantPipelineManager};
use crate::render::uniforms::GlobalUniforms;
use crate::render::{GpuMeshId, ShaderFeatures, ShaderVariantGroup};

/// Records draw lists for the color and depth-only passes.
#[derive(Debug, Default)]
pub struct VariantRenderer {
    globals: GlobalUniforms,
}

impl VariantRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera used by color passes.
    pub fn set_camera(&mut self, view_projection: Mat4, position: Vec3) {
        self.globals.view_projection = view_projection;
        self.globals.camera_position = position;
    }

    pub fn set_time(&mut self, time: f32) {
        self.globals.time = time;
    }

    pub fn globals(&self) -> &GlobalUniforms {
        &self.globals
    }

    /// Record the color pass for this frame's variant groups.
    pub fn render<R, F: PipelineFactory>(
        &mut self,
        world: &World,
        groups: &[ShaderVariantGroup],
        meshes: &MeshRegistry<R>,
        pipelines: &mut VariantPipelineManager<F>,
    ) -> DrawList {
        let batches = groups
            .iter()
            .map(|g| (g.features, g.entities.clone()))
            .collect();
        let list = self.emit(world, batches, meshes, pipelines, false);
        debug!(
            "color pass: {} groups, {} pipelines, {} draws",
            groups.len(),
            list.pipelines().len(),
            list.draw_count()
        );
        list
    }

    /// Record a depth-only pass of `casters` as seen from
    /// `light_view_projection`. Fragment-only features are stripped and
    /// groups that collapse to the same key are merged. The camera globals
    /// are restored before returning.
    pub fn render_depth_only<R, F: PipelineFactory>(
        &mut self,
        world: &World,
        groups: &[ShaderVariantGroup],
        casters: &[Entity],
        light_view_projection: Mat4,
        meshes: &MeshRegistry<R>,
        pipelines: &mut VariantPipelineManager<F>,
    ) -> DrawList {
        let caster_set: HashSet<Entity> = casters.iter().copied().collect();
        let mut merged: BTreeMap<ShaderFeatures, Vec<Entity>> = BTreeMap::new();
        for group in groups {
            let members = group.entities.iter().filter(|e| caster_set.contains(*e));
            merged
                .entry(group.features.depth_only())
                .or_default()
                .extend(members);
        }
        merged.retain(|_, entities| !entities.is_empty());
        let batches = merged.into_iter().collect();

        let list = self.with_view_projection(light_view_projection, |renderer| {
            renderer.emit(world, batches, meshes, pipelines, true)
        });
        debug!(
            "depth pass: {} casters, {} pipelines, {} draws",
            caster_set.len(),
            list.pipelines().len(),
            list.draw_count()
        );
        list
    }

    /// Run `f` with the view-projection replaced, restoring it afterwards.
    fn with_view_projection<T>(&mut self, view_projection: Mat4, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.globals.view_projection, view_projection);
        let result = f(self);
        self.globals.view_projection = saved;
        result
    }

    fn emit<R, F: PipelineFactory>(
        &self,
        world: &World,
        batches: Vec<(ShaderFeatures, Vec<Entity>)>,
        meshes: &MeshRegistry<R>,
        pipelines: &mut VariantPipelineManager<F>,
        depth_only: bool,
    ) -> DrawList {
        let mut list = DrawList::new(self.globals);
        let mut bound: Option<PipelineKey> = None;

        for (features, entities) in batches {
            let (single, double) = collect_draws(world, &entities, meshes);

            for (cull, draws) in [(CullMode::Back, single), (CullMode::None, double)] {
                if draws.is_empty() {
                    continue;
                }
                let key = if depth_only {
                    PipelineKey::depth(features, cull)
                } else {
                    PipelineKey::color(features, cull)
                };
                if let Err(err) = pipelines.get_or_build(&key) {
                    warn!("skipping {} draws for {key}: {err}", draws.len());
                    continue;
                }

                if bound != Some(key) {
                    list.push(DrawCommand::SetPipeline(key));
                    list.push(DrawCommand::SetBindGroup(BindingRef::Global));
                    bound = Some(key);
                }

                let per_entity_environment =
                    !depth_only && key.features.contains(ShaderFeatures::REFLECTION_PROBE);
                if !depth_only && !per_entity_environment {
                    list.push(DrawCommand::SetBindGroup(BindingRef::Environment(
                        EnvironmentBinding::Scene,
                    )));
                }
                let bind_material = !depth_only || key.features.contains(ShaderFeatures::TEXTURED);

                let mut current: Option<Entity> = None;
                for (entity, mesh) in draws {
                    if current != Some(entity) {
                        if bind_material {
                            list.push(DrawCommand::SetBindGroup(BindingRef::Material(entity)));
                        }
                        if per_entity_environment {
                            list.push(DrawCommand::SetBindGroup(BindingRef::Environment(
                                probe_environment(world, entity),
                            )));
                        }
                        current = Some(entity);
                    }
                    list.push(DrawCommand::SetBindGroup(BindingRef::Model(mesh)));
                    list.push(DrawCommand::Draw { entity, mesh });
                }
            }
        }
        list
    }
}

type Draws = Vec<(Entity, GpuMeshId)>;

/// Split an entity list into back-culled and double-sided draws.
fn collect_draws<R>(world: &World, entities: &[Entity], meshes: &MeshRegistry<R>) -> (Draws, Draws) {
    let mut single = Vec::new();
    let mut double = Vec::new();
    for &entity in entities {
        let Some(mesh) = world.get::<MeshComponent>(entity) else {
            trace!("{entity:?} has no mesh component");
            continue;
        };
        for &id in mesh.mesh_ids() {
            if let Err(err) = meshes.resolve(id) {
                warn!("{entity:?} skipped: {err}");
                continue;
            }
            if mesh.double_sided {
                double.push((entity, id));
            } else {
                single.push((entity, id));
            }
        }
    }
    (single, double)
}

fn probe_environment(world: &World, entity: Entity) -> EnvironmentBinding {
    world
        .get::<ReflectionProbeComponent>(entity)
        .filter(|probe| probe.is_ready())
        .and_then(|probe| probe.cubemap())
        .map(|cubemap| EnvironmentBinding::Probe { entity, cubemap })
        .unwrap_or(EnvironmentBinding::Scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mesh_registry::MeshData;

    struct Keys;

    impl PipelineFactory for Keys {
        type Pipeline = PipelineKey;

        fn build(&mut self, key: &PipelineKey) -> anyhow::Result<PipelineKey> {
            Ok(*key)
        }
    }

    fn triangle() -> MeshData {
        MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            ..MeshData::default()
        }
    }

    fn scene(count: usize) -> (World, MeshRegistry<()>, Vec<Entity>) {
        let mut world = World::default();
        let mut meshes = MeshRegistry::new();
        let entities = (0..count)
            .map(|i| {
                let entity = world.spawn(format!("e{i}"));
                let id = meshes.create_mesh(&triangle(), ()).unwrap();
                world
                    .add_component(entity, MeshComponent::new("tri").with_mesh_ids([id]))
                    .unwrap();
                entity
            })
            .collect();
        (world, meshes, entities)
    }

    fn drawn(list: &DrawList) -> Vec<Entity> {
        list.draws().into_iter().map(|(entity, _)| entity).collect()
    }

    #[test]
    fn test_depth_pass_keeps_group_order_of_casters() {
        let (world, meshes, entities) = scene(64);
        let mut group = ShaderVariantGroup::new(ShaderFeatures::WIND | ShaderFeatures::SHADOW);
        group.entities = entities.clone();

        // Every third entity casts, listed backwards and with repeats.
        let mut casters: Vec<Entity> = entities.iter().copied().step_by(3).rev().collect();
        casters.extend(casters.clone());

        let mut renderer = VariantRenderer::new();
        let mut pipelines = VariantPipelineManager::new(Keys);
        let list = renderer.render_depth_only(
            &world,
            std::slice::from_ref(&group),
            &casters,
            Mat4::IDENTITY,
            &meshes,
            &mut pipelines,
        );

        let expected: Vec<Entity> = entities.iter().copied().step_by(3).collect();
        assert_eq!(drawn(&list), expected);
        assert_eq!(list.pipelines(), vec![PipelineKey::depth(ShaderFeatures::WIND, CullMode::Back)]);
    }

    #[test]
    fn test_unregistered_mesh_not_drawn() {
        let (world, mut meshes, entities) = scene(2);
        let gone = world.get::<MeshComponent>(entities[0]).unwrap().mesh_ids()[0];
        meshes.remove_mesh(gone).unwrap();

        let mut group = ShaderVariantGroup::new(ShaderFeatures::empty());
        group.entities = entities.clone();
        let mut renderer = VariantRenderer::new();
        let mut pipelines = VariantPipelineManager::new(Keys);
        let list = renderer.render(&world, std::slice::from_ref(&group), &meshes, &mut pipelines);
        assert_eq!(drawn(&list), vec![entities[1]]);
    }
}
