//! wgpu backend
//!
//! Composes WGSL per pipeline variant, owns the GPU side of meshes,
//! materials, environment maps and the shadow map, and replays
//! [`DrawList`]s into render passes.
//!
//! Two global uniform buffers exist, one per pass target, so recording the
//! shadow pass never changes what the color pass reads.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use hecs::Entity;
use tracing::{debug, info, warn};

use crate::context::WgpuContext;
use crate::core::{
    DepthState, DepthTexture, IndexBuffer, MeshVertex, PipelineBuilder, RawUniformBuffer,
    Texture2D, TextureCubeMap, UniformBuffer, VertexBuffer,
};
use crate::ecs::components::{LightComponent, MaterialComponent};
use crate::ecs::GraphicsResource;
use crate::engine::ReleasedResources;
use crate::error::RenderError;
use crate::render::draw_list::{BindingRef, DrawCommand, DrawList, EnvironmentBinding};
use crate::render::mesh_registry::{MeshData, MeshRegistry};
use crate::render::pipeline_cache::{PipelineFactory, PipelineKey, VariantPipelineManager};
use crate::render::uniforms::{GlobalUniformData, MESH_UNIFORM_SIZE};
use crate::render::{ShaderFeatures, TextureHandle};

const VARIANT_SHADER: &str = include_str!("../shaders/variant.wgsl");

/// Shadow map resolution used by [`WgpuBackend::new`].
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 2048;

/// WGSL for one pipeline variant: feature constants, the per-mesh uniform
/// struct and accessors, then the shared shader body.
pub fn compose_shader(key: &PipelineKey) -> String {
    let features = key.features;
    let wind = features.contains(ShaderFeatures::WIND);
    let wetness = features.contains(ShaderFeatures::WETNESS);
    let textured = features.contains(ShaderFeatures::TEXTURED);
    let environment =
        features.intersects(ShaderFeatures::IBL | ShaderFeatures::REFLECTION_PROBE);

    let mut src = String::with_capacity(VARIANT_SHADER.len() + 2048);
    let _ = writeln!(src, "// variant {key}");
    for flag in ShaderFeatures::all().iter() {
        if let Some(name) = ShaderFeatures::feature_name(flag) {
            let _ = writeln!(
                src,
                "const HAS_{}: bool = {};",
                name.to_uppercase().replace('-', "_"),
                features.contains(flag)
            );
        }
    }
    let _ = writeln!(src, "const DEPTH_ONLY: bool = {};\n", key.depth_only);

    if wind {
        src.push_str(
            "struct WindBlock {\n    displacement: vec3<f32>,\n    phase: f32,\n    \
             anchor_height: f32,\n    debug_mode: u32,\n    _padding: vec2<f32>,\n}\n\n",
        );
    }
    if wetness {
        src.push_str(
            "struct WetnessBlock {\n    water_line: f32,\n    factor: f32,\n    debug: u32,\n    \
             _padding: f32,\n}\n\n",
        );
    }
    src.push_str("struct MeshUniform {\n    model: mat4x4<f32>,\n    normal: mat4x4<f32>,\n");
    if wind {
        src.push_str("    wind: WindBlock,\n");
    }
    if wetness {
        src.push_str("    wetness: WetnessBlock,\n");
    }
    src.push_str("}\n\n");

    let accessor = |src: &mut String, signature: &str, enabled: bool, on: &str, off: &str| {
        let body = if enabled { on } else { off };
        let _ = writeln!(src, "fn {signature} {{ return {body}; }}");
    };
    accessor(&mut src, "wind_displacement() -> vec3<f32>", wind, "mesh.wind.displacement", "vec3<f32>(0.0)");
    accessor(&mut src, "wind_anchor_height() -> f32", wind, "mesh.wind.anchor_height", "0.0");
    accessor(&mut src, "wind_phase() -> f32", wind, "mesh.wind.phase", "0.0");
    accessor(&mut src, "wind_debug() -> bool", wind, "mesh.wind.debug_mode != 0u", "false");
    accessor(&mut src, "wetness_factor() -> f32", wetness, "mesh.wetness.factor", "0.0");
    accessor(&mut src, "wetness_water_line() -> f32", wetness, "mesh.wetness.water_line", "-1e30");
    accessor(&mut src, "wetness_debug() -> bool", wetness, "mesh.wetness.debug != 0u", "false");
    accessor(
        &mut src,
        "base_color_sample(uv: vec2<f32>) -> vec4<f32>",
        textured,
        "textureSample(base_color_texture, base_color_sampler, uv)",
        "vec4<f32>(1.0)",
    );
    accessor(
        &mut src,
        "environment_sample(direction: vec3<f32>) -> vec3<f32>",
        environment,
        "textureSample(environment_map, environment_sampler, direction).rgb",
        "vec3<f32>(0.0)",
    );
    src.push('\n');

    src.push_str(VARIANT_SHADER);
    src
}

/// Material parameters as laid out in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub texture_flags: u32,
    pub _padding: [f32; 2],
}

impl From<&MaterialComponent> for MaterialUniform {
    fn from(material: &MaterialComponent) -> Self {
        Self {
            base_color: material.base_color.to_array(),
            emissive: material.emissive.to_array(),
            metallic: material.metallic,
            roughness: material.roughness,
            texture_flags: material.texture_flags.bits(),
            _padding: [0.0; 2],
        }
    }
}

/// Directional light as laid out in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub view_projection: [[f32; 4]; 4],
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub _padding: f32,
}

impl LightUniform {
    pub fn new(light: &LightComponent, view_projection: Mat4) -> Self {
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            direction: light.direction.to_array(),
            intensity: light.intensity,
            color: light.color.to_array(),
            _padding: 0.0,
        }
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::new(
            &LightComponent::directional(glam::Vec3::new(-0.3, -1.0, -0.2), 1.0),
            Mat4::IDENTITY,
        )
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    sample_type: wgpu::TextureSampleType,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

/// Bind group layouts shared by every variant, one per slot of
/// [`draw_list`](crate::render::draw_list).
pub struct BindGroupLayouts {
    pub global: wgpu::BindGroupLayout,
    pub model: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub environment: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(ctx: &WgpuContext) -> Self {
        let all = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let float = wgpu::TextureSampleType::Float { filterable: true };
        let create = |label: &str, entries: &[wgpu::BindGroupLayoutEntry]| {
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(label),
                    entries,
                })
        };

        Self {
            global: create("global bind group layout", &[uniform_entry(0, all)]),
            model: create("model bind group layout", &[uniform_entry(0, all)]),
            material: create(
                "material bind group layout",
                &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                    texture_entry(1, float, wgpu::TextureViewDimension::D2),
                    sampler_entry(2, wgpu::SamplerBindingType::Filtering),
                ],
            ),
            environment: create(
                "environment bind group layout",
                &[
                    texture_entry(0, float, wgpu::TextureViewDimension::Cube),
                    sampler_entry(1, wgpu::SamplerBindingType::Filtering),
                    texture_entry(2, wgpu::TextureSampleType::Depth, wgpu::TextureViewDimension::D2),
                    sampler_entry(3, wgpu::SamplerBindingType::Comparison),
                    uniform_entry(4, wgpu::ShaderStages::FRAGMENT),
                ],
            ),
        }
    }

    /// Layouts a pipeline for `key` binds, in slot order.
    pub fn for_key(&self, key: &PipelineKey) -> Vec<&wgpu::BindGroupLayout> {
        if !key.depth_only {
            return vec![&self.global, &self.model, &self.material, &self.environment];
        }
        let mut layouts = vec![&self.global, &self.model];
        if key.features.contains(ShaderFeatures::TEXTURED) {
            layouts.push(&self.material);
        }
        layouts
    }
}

/// Builds variant pipelines for the [`VariantPipelineManager`].
pub struct WgpuPipelineFactory {
    ctx: WgpuContext,
    layouts: Arc<BindGroupLayouts>,
    color_format: wgpu::TextureFormat,
}

impl WgpuPipelineFactory {
    pub fn new(ctx: WgpuContext, layouts: Arc<BindGroupLayouts>, color_format: wgpu::TextureFormat) -> Self {
        Self {
            ctx,
            layouts,
            color_format,
        }
    }
}

impl PipelineFactory for WgpuPipelineFactory {
    type Pipeline = wgpu::RenderPipeline;

    fn build(&mut self, key: &PipelineKey) -> anyhow::Result<wgpu::RenderPipeline> {
        let source = compose_shader(key);
        let label = format!("variant pipeline {key}");
        let builder = PipelineBuilder::new(&self.ctx)
            .label(&label)
            .shader(&source)
            .vertex_layout(MeshVertex::layout())
            .bind_group_layouts(self.layouts.for_key(key))
            .cull(key.cull);

        let builder = if key.depth_only {
            builder.fragment_entry("fs_depth").depth(DepthState::shadow())
        } else {
            builder
                .color_format(self.color_format)
                .depth(DepthState::read_write())
        };
        builder.build()
    }
}

/// GPU buffers of one uploaded mesh.
pub struct WgpuMeshResources {
    vertices: VertexBuffer,
    indices: Option<IndexBuffer>,
    uniform: RawUniformBuffer,
    bind_group: wgpu::BindGroup,
}

impl WgpuMeshResources {
    pub fn new(ctx: &WgpuContext, layouts: &BindGroupLayouts, data: &MeshData) -> Self {
        let vertices = VertexBuffer::new(ctx, &MeshVertex::interleave(data), Some("mesh vertices"));
        let indices = data
            .indices
            .as_deref()
            .map(|indices| IndexBuffer::new(ctx, indices, Some("mesh indices")));
        let uniform = RawUniformBuffer::new(ctx, MESH_UNIFORM_SIZE, Some("mesh uniform"));
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh bind group"),
            layout: &layouts.model,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.buffer().as_entire_binding(),
            }],
        });

        Self {
            vertices,
            indices,
            uniform,
            bind_group,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertices.slice());
        match &self.indices {
            Some(indices) => {
                pass.set_index_buffer(indices.slice(), indices.format());
                pass.draw_indexed(0..indices.count(), 0, 0..1);
            }
            None => pass.draw(0..self.vertices.count(), 0..1),
        }
    }
}

/// Which global uniform buffer a draw list is replayed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    Color,
    Shadow,
}

struct MaterialBinding {
    _uniform: RawUniformBuffer,
    bind_group: wgpu::BindGroup,
}

/// GPU state shared by all draws: globals, materials, textures,
/// environment maps and the shadow map.
pub struct WgpuBackend {
    ctx: WgpuContext,
    layouts: Arc<BindGroupLayouts>,
    color_globals: UniformBuffer<GlobalUniformData>,
    shadow_globals: UniformBuffer<GlobalUniformData>,
    light: RawUniformBuffer,
    shadow_map: DepthTexture,
    shadow_sampler: wgpu::Sampler,
    scene_environment: TextureCubeMap,
    scene_environment_group: wgpu::BindGroup,
    white: Texture2D,
    default_material: MaterialBinding,
    textures: HashMap<TextureHandle, Texture2D>,
    cubemaps: HashMap<TextureHandle, (TextureCubeMap, wgpu::BindGroup)>,
    materials: HashMap<Entity, MaterialBinding>,
    next_texture: u32,
}

impl WgpuBackend {
    pub fn new(ctx: WgpuContext) -> Result<Self, RenderError> {
        Self::with_shadow_map_size(ctx, DEFAULT_SHADOW_MAP_SIZE)
    }

    pub fn with_shadow_map_size(ctx: WgpuContext, shadow_map_size: u32) -> Result<Self, RenderError> {
        let layouts = Arc::new(BindGroupLayouts::new(&ctx));
        let zero = GlobalUniformData::zeroed();
        let color_globals = UniformBuffer::new(&ctx, &zero, &layouts.global, Some("color globals"));
        let shadow_globals = UniformBuffer::new(&ctx, &zero, &layouts.global, Some("shadow globals"));

        let light = RawUniformBuffer::new(
            &ctx,
            std::mem::size_of::<LightUniform>() as u64,
            Some("light uniform"),
        );
        light.write_at(&ctx, 0, bytemuck::bytes_of(&LightUniform::default()));

        let shadow_map = DepthTexture::new(&ctx, shadow_map_size, shadow_map_size, Some("shadow map"));
        let shadow_sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow comparison sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let scene_environment = TextureCubeMap::new(&ctx, 1, Some("scene environment"));
        scene_environment.fill(&ctx, [0.35, 0.4, 0.45, 1.0]);

        let white = Texture2D::white(&ctx)?;
        let backend = Self {
            scene_environment_group: environment_group(
                &ctx,
                &layouts,
                &scene_environment,
                &shadow_map,
                &shadow_sampler,
                &light,
            ),
            default_material: material_binding(
                &ctx,
                &layouts,
                &MaterialUniform::from(&MaterialComponent::default()),
                &white,
            ),
            ctx,
            layouts,
            color_globals,
            shadow_globals,
            light,
            shadow_map,
            shadow_sampler,
            scene_environment,
            white,
            textures: HashMap::new(),
            cubemaps: HashMap::new(),
            materials: HashMap::new(),
            next_texture: 0,
        };
        info!("wgpu backend ready ({shadow_map_size}px shadow map)");
        Ok(backend)
    }

    pub fn context(&self) -> &WgpuContext {
        &self.ctx
    }

    pub fn layouts(&self) -> Arc<BindGroupLayouts> {
        self.layouts.clone()
    }

    /// Pipeline factory drawing into `color_format` targets.
    pub fn pipeline_factory(&self, color_format: wgpu::TextureFormat) -> WgpuPipelineFactory {
        WgpuPipelineFactory::new(self.ctx.clone(), self.layouts.clone(), color_format)
    }

    /// Buffers for a mesh about to enter the [`MeshRegistry`].
    pub fn create_mesh_resources(&self, data: &MeshData) -> WgpuMeshResources {
        WgpuMeshResources::new(&self.ctx, &self.layouts, data)
    }

    pub fn scene_environment(&self) -> &TextureCubeMap {
        &self.scene_environment
    }

    /// Depth target for the shadow pass.
    pub fn shadow_map(&self) -> &DepthTexture {
        &self.shadow_map
    }

    fn issue_handle(&mut self) -> TextureHandle {
        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        handle
    }

    /// Upload a material texture. Unsupported pixel formats are logged and
    /// rejected without touching the device.
    pub fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        data: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        let texture = Texture2D::from_pixels(&self.ctx, width, height, format, data, Some("material texture"))
            .inspect_err(|err| warn!("skipping texture upload: {err}"))?;
        let handle = self.issue_handle();
        self.textures.insert(handle, texture);
        debug!("uploaded {handle} ({width}x{height} {format:?})");
        Ok(handle)
    }

    /// Empty cube map for a probe capture to render into.
    pub fn create_probe_cubemap(&mut self, resolution: u32) -> TextureHandle {
        let cubemap = TextureCubeMap::new(&self.ctx, resolution.max(1), Some("reflection probe"));
        let group = environment_group(
            &self.ctx,
            &self.layouts,
            &cubemap,
            &self.shadow_map,
            &self.shadow_sampler,
            &self.light,
        );
        let handle = self.issue_handle();
        self.cubemaps.insert(handle, (cubemap, group));
        handle
    }

    pub fn cubemap(&self, handle: TextureHandle) -> Option<&TextureCubeMap> {
        self.cubemaps.get(&handle).map(|(cubemap, _)| cubemap)
    }

    /// Create or replace the material bound for `entity`.
    pub fn set_material(
        &mut self,
        entity: Entity,
        material: &MaterialComponent,
        texture: Option<TextureHandle>,
    ) {
        let texture = match texture {
            Some(handle) => self.textures.get(&handle).unwrap_or_else(|| {
                warn!("{entity:?} material references unknown {handle}");
                &self.white
            }),
            None => &self.white,
        };
        let binding = material_binding(&self.ctx, &self.layouts, &MaterialUniform::from(material), texture);
        self.materials.insert(entity, binding);
    }

    pub fn remove_material(&mut self, entity: Entity) -> bool {
        self.materials.remove(&entity).is_some()
    }

    pub fn set_light(&self, light: &LightComponent, view_projection: Mat4) {
        let uniform = LightUniform::new(light, view_projection);
        self.light.write_at(&self.ctx, 0, bytemuck::bytes_of(&uniform));
    }

    /// Drop the GPU side of a released resource. Meshes live in the
    /// [`MeshRegistry`] and are released there.
    pub fn release(&mut self, resource: &GraphicsResource) {
        match resource {
            GraphicsResource::Cubemap(handle) => {
                self.cubemaps.remove(handle);
            }
            GraphicsResource::Texture(handle) => {
                self.textures.remove(handle);
            }
            GraphicsResource::Mesh(_) => {}
        }
    }

    /// Drop what [`SceneEngine::end_frame`] released: textures, cube maps
    /// and the materials of torn-down entities.
    ///
    /// [`SceneEngine::end_frame`]: crate::engine::SceneEngine::end_frame
    pub fn release_frame<R>(&mut self, released: &ReleasedResources<R>) {
        for resource in &released.textures {
            self.release(resource);
        }
        let evicted = evict_entities(&mut self.materials, &released.entities);
        if evicted > 0 {
            debug!("evicted {evicted} materials");
        }
    }

    /// Write pending mesh uniform ranges to their buffers.
    pub fn flush_meshes(&self, meshes: &mut MeshRegistry<WgpuMeshResources>) {
        meshes.flush_uniforms(|id, resources, range, bytes| {
            if !resources.uniform.write_at(&self.ctx, range.start, bytes) {
                warn!("{id} uniform write {range:?} out of bounds");
            }
        });
    }

    fn globals(&self, target: PassTarget) -> &UniformBuffer<GlobalUniformData> {
        match target {
            PassTarget::Color => &self.color_globals,
            PassTarget::Shadow => &self.shadow_globals,
        }
    }

    /// Upload the globals `list` was recorded against.
    pub fn prepare(&self, list: &DrawList, target: PassTarget) {
        self.globals(target).update(&self.ctx, &list.globals.to_gpu());
    }

    fn environment(&self, binding: EnvironmentBinding) -> &wgpu::BindGroup {
        match binding {
            EnvironmentBinding::Scene => &self.scene_environment_group,
            EnvironmentBinding::Probe { cubemap, .. } => self
                .cubemaps
                .get(&cubemap)
                .map(|(_, group)| group)
                .unwrap_or(&self.scene_environment_group),
        }
    }

    /// Replay a draw list into an open render pass. Draws under a pipeline
    /// missing from the cache or referencing unknown meshes are skipped.
    pub fn replay(
        &self,
        list: &DrawList,
        target: PassTarget,
        pipelines: &VariantPipelineManager<WgpuPipelineFactory>,
        meshes: &MeshRegistry<WgpuMeshResources>,
        pass: &mut wgpu::RenderPass<'_>,
    ) {
        let mut skipping = false;
        for command in &list.commands {
            match *command {
                DrawCommand::SetPipeline(key) => match pipelines.get(&key) {
                    Some(pipeline) => {
                        pass.set_pipeline(pipeline);
                        skipping = false;
                    }
                    None => {
                        warn!("pipeline {key} not built, skipping its draws");
                        skipping = true;
                    }
                },
                _ if skipping => {}
                DrawCommand::SetBindGroup(binding) => {
                    let group = match binding {
                        BindingRef::Global => Some(self.globals(target).bind_group()),
                        BindingRef::Model(id) => meshes.resolve(id).ok().map(|m| &m.resources.bind_group),
                        BindingRef::Material(entity) => Some(
                            &self
                                .materials
                                .get(&entity)
                                .unwrap_or(&self.default_material)
                                .bind_group,
                        ),
                        BindingRef::Environment(env) => Some(self.environment(env)),
                    };
                    if let Some(group) = group {
                        pass.set_bind_group(binding.slot(), group, &[]);
                    }
                }
                DrawCommand::Draw { entity, mesh } => match meshes.resolve(mesh) {
                    Ok(record) => record.resources.draw(pass),
                    Err(err) => warn!("skipping draw of {entity:?}: {err}"),
                },
            }
        }
    }

    /// Entities with their own material bound.
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

/// Remove the entries of `entities`, returning how many were present.
fn evict_entities<V>(map: &mut HashMap<Entity, V>, entities: &[Entity]) -> usize {
    entities
        .iter()
        .filter(|entity| map.remove(*entity).is_some())
        .count()
}

fn material_binding(
    ctx: &WgpuContext,
    layouts: &BindGroupLayouts,
    uniform: &MaterialUniform,
    texture: &Texture2D,
) -> MaterialBinding {
    let buffer = RawUniformBuffer::new(
        ctx,
        std::mem::size_of::<MaterialUniform>() as u64,
        Some("material uniform"),
    );
    buffer.write_at(ctx, 0, bytemuck::bytes_of(uniform));
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material bind group"),
        layout: &layouts.material,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(texture.view()),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(texture.sampler()),
            },
        ],
    });
    MaterialBinding {
        _uniform: buffer,
        bind_group,
    }
}

fn environment_group(
    ctx: &WgpuContext,
    layouts: &BindGroupLayouts,
    cubemap: &TextureCubeMap,
    shadow_map: &DepthTexture,
    shadow_sampler: &wgpu::Sampler,
    light: &RawUniformBuffer,
) -> wgpu::BindGroup {
    ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("environment bind group"),
        layout: &layouts.environment,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(cubemap.view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(cubemap.sampler()),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(shadow_map.view()),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(shadow_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: light.buffer().as_entire_binding(),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline_cache::CullMode;

    #[test]
    fn test_evict_entities() {
        let mut world = hecs::World::new();
        let kept = world.spawn(());
        let gone = world.spawn(());
        let never_bound = world.spawn(());
        let mut map = HashMap::from([(kept, 1), (gone, 2)]);

        assert_eq!(evict_entities(&mut map, &[gone, never_bound]), 1);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&kept));
        assert_eq!(evict_entities(&mut map, &[gone]), 0);
    }

    #[test]
    fn test_compose_constants() {
        let key = PipelineKey::color(ShaderFeatures::WIND | ShaderFeatures::SHADOW, CullMode::Back);
        let src = compose_shader(&key);
        assert!(src.contains("const HAS_WIND: bool = true;"));
        assert!(src.contains("const HAS_SHADOW: bool = true;"));
        assert!(src.contains("const HAS_REFLECTION_PROBE: bool = false;"));
        assert!(src.contains("const DEPTH_ONLY: bool = false;"));
        assert!(src.contains("fn vs_main"));
    }

    #[test]
    fn test_compose_mesh_uniform_fields() {
        let wet = PipelineKey::color(ShaderFeatures::WETNESS, CullMode::Back);
        let src = compose_shader(&wet);
        assert!(src.contains("wetness: WetnessBlock"));
        assert!(!src.contains("wind: WindBlock"));
        assert!(src.contains("fn wind_displacement() -> vec3<f32> { return vec3<f32>(0.0); }"));

        let both = PipelineKey::color(ShaderFeatures::WETNESS | ShaderFeatures::WIND, CullMode::Back);
        let src = compose_shader(&both);
        let wind = src.find("wind: WindBlock").unwrap();
        let wetness = src.find("wetness: WetnessBlock").unwrap();
        assert!(wind < wetness);
    }

    #[test]
    fn test_compose_depth_variant() {
        let key = PipelineKey::depth(ShaderFeatures::all(), CullMode::None);
        let src = compose_shader(&key);
        assert!(src.contains("const DEPTH_ONLY: bool = true;"));
        assert!(src.contains("const HAS_WETNESS: bool = false;"));
        assert!(src.contains("const HAS_TEXTURED: bool = true;"));
        assert!(src.contains("textureSample(base_color_texture"));
        assert!(!src.contains("textureSample(environment_map"));
    }

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
        assert_eq!(std::mem::size_of::<LightUniform>(), 96);
    }
}
