//! Scene engine
//!
//! Per-frame orchestration around a [`World`]: compute the camera, run the
//! systems, record the color and shadow draw lists, then flush deferred
//! deletions once the host has submitted the frame.
//!
//! The engine is backend-neutral. `F` builds pipelines and `R` is whatever
//! the backend stores per mesh; with wgpu these are
//! [`WgpuPipelineFactory`](crate::render::wgpu_backend::WgpuPipelineFactory)
//! and [`WgpuMeshResources`](crate::render::wgpu_backend::WgpuMeshResources).

use glam::{Mat4, Vec3};
use hecs::Entity;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, RenderSettings};
use crate::ecs::component::ComponentTag;
use crate::ecs::components::{
    BoundsComponent, CameraComponent, LightComponent, LightKind, MeshComponent,
    TerrainComponent, TransformComponent,
};
use crate::ecs::systems::{standard_systems, ProbeCapture};
use crate::ecs::{FrameContext, GraphicsResource, World};
use crate::error::SceneError;
use crate::input::InputEvent;
use crate::render::{
    DrawList, GpuMeshId, GpuMeshSink, MeshData, MeshRegistry, PipelineFactory, VariantPipelineManager,
    VariantRenderer,
};

/// Depth-only pass from the main directional light.
#[derive(Debug, Clone)]
pub struct ShadowPass {
    pub light: LightComponent,
    pub view_projection: Mat4,
    pub draws: DrawList,
}

/// Draw lists recorded for one frame.
#[derive(Debug, Clone)]
pub struct FrameDrawLists {
    pub color: DrawList,
    pub shadow: Option<ShadowPass>,
}

/// Resources freed by [`SceneEngine::end_frame`].
#[derive(Debug)]
pub struct ReleasedResources<R> {
    /// Backend resources of removed meshes.
    pub meshes: Vec<R>,
    /// Textures and cube maps the backend should drop.
    pub textures: Vec<GraphicsResource>,
    /// Entities torn down this frame; their per-entity GPU state goes too.
    pub entities: Vec<Entity>,
}

impl<R> Default for ReleasedResources<R> {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            textures: Vec::new(),
            entities: Vec::new(),
        }
    }
}

/// A world with its render state.
pub struct SceneEngine<F: PipelineFactory, R = ()> {
    world: World,
    config: EngineConfig,
    meshes: MeshRegistry<R>,
    pipelines: VariantPipelineManager<F>,
    renderer: VariantRenderer,
    elapsed: f32,
    pending_snaps: Vec<Entity>,
}

impl<F: PipelineFactory, R> SceneEngine<F, R> {
    /// Create an engine with the standard systems registered.
    pub fn new(config: EngineConfig, factory: F) -> Self {
        let mut world = World::new(config.bvh.clone());
        for system in standard_systems(&config) {
            world.add_system(system);
        }
        info!("scene engine started with systems {:?}", world.system_names());
        Self {
            world,
            config,
            meshes: MeshRegistry::new(),
            pipelines: VariantPipelineManager::new(factory),
            renderer: VariantRenderer::new(),
            elapsed: 0.0,
            pending_snaps: Vec::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.config.render
    }

    pub fn meshes(&self) -> &MeshRegistry<R> {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut MeshRegistry<R> {
        &mut self.meshes
    }

    pub fn pipelines(&self) -> &VariantPipelineManager<F> {
        &self.pipelines
    }

    pub fn renderer(&self) -> &VariantRenderer {
        &self.renderer
    }

    /// Seconds simulated so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Drop every cached pipeline, e.g. after shader sources changed.
    pub fn reload_shaders(&mut self) {
        self.pipelines.invalidate_all();
    }

    /// Update the aspect ratio of every perspective camera.
    pub fn set_aspect(&mut self, aspect: f32) {
        for (_, camera) in self.world.ecs_mut().query_mut::<&mut CameraComponent>() {
            camera.projection.set_aspect(aspect);
        }
    }

    /// Position and view-projection of the first active camera.
    pub fn active_camera(&self) -> Option<(Vec3, Mat4)> {
        self.world
            .query(&[ComponentTag::Camera, ComponentTag::Transform])
            .into_iter()
            .find_map(|entity| {
                let camera = self.world.get::<CameraComponent>(entity)?;
                if !camera.active {
                    return None;
                }
                let transform = self.world.get::<TransformComponent>(entity)?;
                let (position, rotation) = (transform.position(), transform.rotation());
                Some((position, camera.view_projection(position, rotation)))
            })
    }

    /// First directional light.
    fn main_light(&self) -> Option<LightComponent> {
        self.world
            .query(&[ComponentTag::Light])
            .into_iter()
            .filter_map(|entity| self.world.get::<LightComponent>(entity).map(|l| (*l).clone()))
            .find(|light| light.kind == LightKind::Directional)
    }

    /// Run one frame and record its draw lists.
    pub fn frame(
        &mut self,
        dt: f32,
        input: &[InputEvent],
        capture: Option<&mut dyn ProbeCapture>,
    ) -> FrameDrawLists {
        self.elapsed += dt;
        self.retry_terrain_snaps();

        let camera = self.active_camera();
        let (camera_position, view_projection) = {
            let mut ctx = FrameContext::new(&self.config.render)
                .time(self.elapsed)
                .input(input)
                .mesh_sink(&mut self.meshes);
            if let Some((position, view_projection)) = camera {
                ctx = ctx.camera(position, view_projection);
            }
            if let Some(capture) = capture {
                ctx = ctx.capture(capture);
            }
            self.world.update(dt, &mut ctx);
            (ctx.camera_position, ctx.view_projection)
        };

        self.renderer.set_time(self.elapsed);
        self.renderer.set_camera(
            view_projection.unwrap_or(Mat4::IDENTITY),
            camera_position.unwrap_or(Vec3::ZERO),
        );

        let groups = &self.world.frame().variant_groups;
        let color = self
            .renderer
            .render(&self.world, groups, &self.meshes, &mut self.pipelines);

        let shadow = self.record_shadow_pass();
        FrameDrawLists { color, shadow }
    }

    fn record_shadow_pass(&mut self) -> Option<ShadowPass> {
        if !self.config.render.shadows_enabled {
            return None;
        }
        let light = self.main_light()?;
        let scene = self.world.scene_bounds()?;
        let view_projection = light.shadow_view_projection(scene.bounds.center(), scene.radius);

        let frame = self.world.frame();
        let draws = self.renderer.render_depth_only(
            &self.world,
            &frame.variant_groups,
            &frame.shadow_casters,
            view_projection,
            &self.meshes,
            &mut self.pipelines,
        );
        Some(ShadowPass {
            light,
            view_projection,
            draws,
        })
    }

    /// Flush deferred deletions. Call once the frame's GPU work no longer
    /// references destroyed entities.
    pub fn end_frame(&mut self) -> ReleasedResources<R> {
        let flushed = self.world.flush_pending_deletions();
        let mut released = ReleasedResources::default();
        for resource in self.world.drain_released_resources() {
            match resource {
                GraphicsResource::Mesh(_) => {
                    if let Some(mesh) = self.meshes.release(&resource) {
                        released.meshes.push(mesh);
                    }
                }
                _ => released.textures.push(resource),
            }
        }
        released.entities = self.world.drain_torn_down();
        if flushed > 0 {
            debug!(
                "flushed {flushed} entities: {} meshes, {} textures released",
                released.meshes.len(),
                released.textures.len()
            );
        }
        released
    }

    /// Register a mesh for `entity`, attaching a [`MeshComponent`] and
    /// bounds when missing. Invalid mesh data is logged and rejected.
    pub fn upload_mesh(
        &mut self,
        entity: Entity,
        data: &MeshData,
        resources: R,
    ) -> anyhow::Result<GpuMeshId> {
        if !self.world.contains(entity) {
            return Err(SceneError::NoSuchEntity(format!("{entity:?}")).into());
        }
        let id = self
            .meshes
            .create_mesh(data, resources)
            .inspect_err(|err| warn!("skipping mesh for {entity:?}: {err}"))?;
        self.meshes
            .update_model_matrix(id, &self.world.model_matrix(entity));

        if !self.world.has::<MeshComponent>(entity) {
            self.world.add_component(entity, MeshComponent::new(""))?;
        }
        if let Some(mut mesh) = self.world.get_mut::<MeshComponent>(entity) {
            mesh.push_mesh_id(id);
        }

        let local = data.local_bounds();
        let merged = self
            .world
            .get::<BoundsComponent>(entity)
            .map(|b| *b.local_bounds())
            .filter(|b| b.is_valid())
            .map(|b| b.merge(&local));
        match merged {
            Some(bounds) => {
                if let Some(mut component) = self.world.get_mut::<BoundsComponent>(entity) {
                    component.set_local_bounds(bounds);
                }
            }
            None => self.world.add_component(entity, BoundsComponent::new(local))?,
        }
        debug!("uploaded {id} for {entity:?}");
        Ok(id)
    }

    /// Place `entity` on the terrain now or, while the terrain is not
    /// ready, on a later frame.
    pub fn request_terrain_snap(&mut self, entity: Entity) -> Result<(), SceneError> {
        if !snap_to_terrain(&mut self.world, entity)? && !self.pending_snaps.contains(&entity) {
            self.pending_snaps.push(entity);
        }
        Ok(())
    }

    fn retry_terrain_snaps(&mut self) {
        let world = &mut self.world;
        self.pending_snaps
            .retain(|&entity| matches!(snap_to_terrain(world, entity), Ok(false)));
    }
}

/// Move `entity` so the bottom of its world bounds (or its origin) sits on
/// the first terrain. Returns `false` when no ready terrain covers it.
pub fn snap_to_terrain(world: &mut World, entity: Entity) -> Result<bool, SceneError> {
    if !world.has::<TransformComponent>(entity) {
        return Err(SceneError::NoSuchEntity(format!("{entity:?} has no transform")));
    }
    let position = world
        .get::<TransformComponent>(entity)
        .map(|t| t.position())
        .unwrap_or_default();
    let Some(terrain) = world.find_first::<TerrainComponent>() else {
        return Ok(false);
    };
    let height = world.get::<TerrainComponent>(terrain).and_then(|t| {
        let provider = t.provider();
        if provider.is_ready() {
            provider.height_at(position.x, position.z)
        } else {
            None
        }
    });
    let Some(height) = height else {
        return Ok(false);
    };
    let bottom_offset = world
        .get::<BoundsComponent>(entity)
        .map(|b| *b.world_bounds())
        .filter(|b| b.is_valid())
        .map_or(0.0, |b| position.y - b.min.y);

    world.update_transform(entity, |t| {
        t.set_position(Vec3::new(position.x, height + bottom_offset, position.z));
    })?;
    Ok(true)
}
