//! End-to-end frame scenarios through the public API.

use glam::{Mat4, Vec3};
use vista::ecs::components::{
    BakeState, LodComponent, MeshComponent, ReflectionProbeComponent, SsrComponent,
    TransformComponent, WetnessComponent,
};
use vista::ecs::systems::{LodSystem, ProbeCapture, TransformSystem, WetnessSystem};
use vista::ecs::{ComponentTag, Entity, FrameContext, GraphicsResource, World};
use vista::{
    EngineConfig, GpuMeshId, MeshData, PipelineFactory, PipelineKey, RenderSettings,
    SceneEngine, ShaderFeatures, TextureHandle,
};

struct KeyFactory;

impl PipelineFactory for KeyFactory {
    type Pipeline = PipelineKey;

    fn build(&mut self, key: &PipelineKey) -> anyhow::Result<PipelineKey> {
        Ok(*key)
    }
}

#[derive(Default)]
struct RecordingCapture {
    baked: Vec<(Entity, Vec3)>,
}

impl ProbeCapture for RecordingCapture {
    fn bake_probe(&mut self, entity: Entity, _probe: &ReflectionProbeComponent, position: Vec3) {
        self.baked.push((entity, position));
    }
}

fn triangle() -> MeshData {
    MeshData {
        positions: vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
        ..MeshData::default()
    }
}

fn features_of(world: &World, entity: Entity) -> Option<ShaderFeatures> {
    world
        .frame()
        .variant_groups
        .iter()
        .find(|g| g.entities.contains(&entity))
        .map(|g| g.features)
}

#[test]
fn lod_follows_camera_distance() {
    let mut world = World::new(Default::default());
    world.add_system(Box::new(TransformSystem));
    world.add_system(Box::new(LodSystem));

    let entities: Vec<_> = [10.0, 60.0, 200.0, 1000.0]
        .into_iter()
        .map(|distance| {
            let entity = world.spawn(format!("lod-{distance}"));
            world
                .add_component(
                    entity,
                    TransformComponent::from_position(Vec3::new(0.0, 0.0, -distance)),
                )
                .unwrap();
            world
                .add_component(entity, LodComponent::new(vec![50.0, 150.0, 400.0]))
                .unwrap();
            entity
        })
        .collect();

    let settings = RenderSettings::default();
    let mut ctx = FrameContext::new(&settings).camera(Vec3::ZERO, Mat4::IDENTITY);
    world.update(0.016, &mut ctx);

    let levels: Vec<u32> = entities
        .iter()
        .map(|e| world.get::<LodComponent>(*e).unwrap().level())
        .collect();
    assert_eq!(levels, vec![0, 1, 2, 3]);
    assert_eq!(world.get::<LodComponent>(entities[3]).unwrap().max_lod(), 3);
}

#[test]
fn baked_probe_replaces_ssr() {
    let mut engine = SceneEngine::<KeyFactory>::new(EngineConfig::default(), KeyFactory);
    let entity = engine.world_mut().spawn("mirror");
    let world = engine.world_mut();
    world
        .add_component(entity, TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)))
        .unwrap();
    world
        .add_component(entity, ReflectionProbeComponent::new())
        .unwrap();
    world.add_component(entity, SsrComponent::new(true)).unwrap();
    engine.upload_mesh(entity, &triangle(), ()).unwrap();

    // Not baked yet: SSR applies.
    engine.frame(0.016, &[], None);
    let features = features_of(engine.world(), entity).unwrap();
    assert!(features.contains(ShaderFeatures::SSR));
    assert!(!features.contains(ShaderFeatures::REFLECTION_PROBE));

    assert!(engine
        .world()
        .get_mut::<ReflectionProbeComponent>(entity)
        .unwrap()
        .request_bake());

    // A pending bake without a capture backend waits.
    engine.frame(0.016, &[], None);
    assert_eq!(
        engine
            .world()
            .get::<ReflectionProbeComponent>(entity)
            .unwrap()
            .bake_state(),
        BakeState::Pending
    );

    let mut capture = RecordingCapture::default();
    engine.frame(0.016, &[], Some(&mut capture));
    assert_eq!(capture.baked.len(), 1);
    assert_eq!(capture.baked[0].0, entity);
    assert_eq!(
        engine
            .world()
            .get::<ReflectionProbeComponent>(entity)
            .unwrap()
            .bake_state(),
        BakeState::Baking
    );

    // Baking runs to completion; the capture is not invoked again.
    engine.frame(0.016, &[], Some(&mut capture));
    assert_eq!(capture.baked.len(), 1);

    engine
        .world_mut()
        .finish_probe_bake(entity, TextureHandle(3))
        .unwrap();
    engine.frame(0.016, &[], Some(&mut capture));

    let features = features_of(engine.world(), entity).unwrap();
    assert!(features.contains(ShaderFeatures::REFLECTION_PROBE));
    assert!(!features.contains(ShaderFeatures::SSR));
    assert!(features.names().contains(&"reflection-probe"));
    assert!(!features.names().contains(&"ssr"));
}

#[test]
fn wetness_evaporates_without_ocean() {
    let mut world = World::new(Default::default());
    world.add_system(Box::new(WetnessSystem));

    let entity = world.spawn("rock");
    world
        .add_component(entity, TransformComponent::new())
        .unwrap();
    world
        .add_component(
            entity,
            WetnessComponent::new()
                .object_height(2.0)
                .evaporation_rate(1.0)
                .with_high_water_mark(2.0),
        )
        .unwrap();
    assert_eq!(world.get::<WetnessComponent>(entity).unwrap().wetness_factor(), 1.0);

    let settings = RenderSettings::default();
    for _ in 0..2 {
        world.update(1.0, &mut FrameContext::new(&settings));
    }

    let wetness = world.get::<WetnessComponent>(entity).unwrap();
    assert!(wetness.high_water_mark().abs() < 1e-6);
    assert_eq!(wetness.wetness_factor(), 0.0);
}

#[test]
fn replacing_a_component_destroys_the_first_once() {
    let mut world = World::new(Default::default());
    let entity = world.spawn("crate");
    world
        .add_component(entity, MeshComponent::new("a").with_mesh_ids([GpuMeshId(1)]))
        .unwrap();
    world
        .add_component(entity, MeshComponent::new("b").with_mesh_ids([GpuMeshId(2)]))
        .unwrap();

    assert_eq!(world.query(&[ComponentTag::Mesh]), vec![entity]);
    assert_eq!(world.get::<MeshComponent>(entity).unwrap().source, "b");
    assert_eq!(
        world.drain_released_resources(),
        vec![GraphicsResource::Mesh(GpuMeshId(1))]
    );
}
