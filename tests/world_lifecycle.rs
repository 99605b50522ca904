//! World invariants across frames.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use vista::ecs::components::{
    compute_lod, BoundsComponent, FlatWater, LodComponent, MaterialComponent, MeshComponent,
    OceanComponent, Pivot, ShadowComponent, TextureFlags, TransformComponent, WetnessComponent,
    WindComponent,
};
use vista::ecs::systems::{TransformSystem, WetnessSystem};
use vista::ecs::{ComponentTag, FrameContext, GraphicsResource, World};
use vista::math::transform_aabb;
use vista::{
    Aabb, EngineConfig, GpuMeshId, MeshData, PipelineFactory, PipelineKey, RenderSettings,
    SceneEngine,
};

struct NullFactory;

impl PipelineFactory for NullFactory {
    type Pipeline = ();

    fn build(&mut self, _key: &PipelineKey) -> anyhow::Result<()> {
        Ok(())
    }
}

fn quad() -> MeshData {
    MeshData {
        positions: vec![
            [-1.0, 0.0, -1.0],
            [1.0, 0.0, -1.0],
            [1.0, 0.0, 1.0],
            [-1.0, 0.0, 1.0],
        ],
        indices: Some(vec![0, 1, 2, 0, 2, 3]),
        ..MeshData::default()
    }
}

#[test]
fn destroyed_entity_is_torn_down_at_flush() {
    let mut world = World::new(Default::default());
    let entity = world.spawn_with_id("statue", "Statue").unwrap();
    world
        .add_component(entity, TransformComponent::new())
        .unwrap();
    world
        .add_component(entity, MeshComponent::new("statue.glb").with_mesh_ids([GpuMeshId(4), GpuMeshId(5)]))
        .unwrap();
    let other = world.spawn("bystander");
    world.add_component(other, TransformComponent::new()).unwrap();

    world.destroy_entity_by_id("statue").unwrap();

    assert!(world.get_entity("statue").is_none());
    assert_eq!(
        world.query_any(&[ComponentTag::Transform, ComponentTag::Mesh]),
        vec![other]
    );
    assert_eq!(world.pending_deletions(), 1);
    assert!(world.drain_released_resources().is_empty());

    assert_eq!(world.flush_pending_deletions(), 1);
    assert_eq!(
        world.drain_released_resources(),
        vec![
            GraphicsResource::Mesh(GpuMeshId(4)),
            GraphicsResource::Mesh(GpuMeshId(5))
        ]
    );

    // Hooks run once.
    assert_eq!(world.flush_pending_deletions(), 0);
    assert!(world.drain_released_resources().is_empty());

    // The id can be reused after teardown.
    assert!(world.spawn_with_id("statue", "Statue again").is_ok());
}

#[test]
fn late_bounds_move_bottom_pivot() {
    let mut engine = SceneEngine::<NullFactory>::new(EngineConfig::default(), NullFactory);
    let crate_entity = engine.world_mut().spawn("crate");
    engine
        .world_mut()
        .add_component(crate_entity, TransformComponent::new().with_pivot(Pivot::Bottom))
        .unwrap();
    engine.frame(0.016, &[], None);
    let translation = |engine: &SceneEngine<NullFactory>| {
        engine
            .world()
            .get::<TransformComponent>(crate_entity)
            .unwrap()
            .translation()
    };
    assert_eq!(translation(&engine), Vec3::ZERO);

    engine
        .world_mut()
        .add_component(
            crate_entity,
            BoundsComponent::new(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))),
        )
        .unwrap();
    engine.frame(0.016, &[], None);
    assert!((translation(&engine).y - 1.0).abs() < 1e-6);
    let world_bounds = *engine
        .world()
        .get::<BoundsComponent>(crate_entity)
        .unwrap()
        .world_bounds();
    assert!(world_bounds.min.y.abs() < 1e-6);

    // Growing the box downwards lifts the model further.
    engine
        .world()
        .get_mut::<BoundsComponent>(crate_entity)
        .unwrap()
        .set_local_bounds(Aabb::new(Vec3::new(-1.0, -2.0, -1.0), Vec3::splat(1.0)));
    engine.frame(0.016, &[], None);
    assert!((translation(&engine).y - 2.0).abs() < 1e-6);
}

#[test]
fn scene_bounds_cleared_with_last_bounded_entity() {
    let mut engine = SceneEngine::<NullFactory>::new(EngineConfig::default(), NullFactory);
    let entity = engine.world_mut().spawn("only");
    engine
        .world_mut()
        .add_component(entity, TransformComponent::new())
        .unwrap();
    engine.upload_mesh(entity, &quad(), ()).unwrap();
    engine.frame(0.016, &[], None);
    assert!(engine.world().scene_bounds().is_some());

    engine.world_mut().destroy_entity(entity).unwrap();
    engine.end_frame();
    engine.frame(0.016, &[], None);
    assert!(engine.world().scene_bounds().is_none());
    assert!(engine.world().spatial_index().is_empty());

    // Detaching the component has the same effect.
    let other = engine.world_mut().spawn("other");
    engine
        .world_mut()
        .add_component(other, TransformComponent::new())
        .unwrap();
    engine.upload_mesh(other, &quad(), ()).unwrap();
    engine.frame(0.016, &[], None);
    assert!(engine.world().scene_bounds().is_some());
    assert!(engine.world_mut().remove_component::<BoundsComponent>(other));
    engine.frame(0.016, &[], None);
    assert!(engine.world().scene_bounds().is_none());
}

#[test]
fn grouping_is_stable_between_frames() {
    let mut engine = SceneEngine::<NullFactory>::new(EngineConfig::default(), NullFactory);
    let mesh = quad();
    for i in 0..12 {
        let entity = engine.world_mut().spawn(format!("tile-{i}"));
        let world = engine.world_mut();
        world
            .add_component(
                entity,
                TransformComponent::from_position(Vec3::new(i as f32 * 3.0, 0.0, 0.0)),
            )
            .unwrap();
        if i % 2 == 0 {
            world.add_component(entity, WindComponent::new()).unwrap();
        }
        if i % 3 == 0 {
            world
                .add_component(
                    entity,
                    MaterialComponent::new().textures(TextureFlags::BASE_COLOR),
                )
                .unwrap();
        }
        if i % 4 == 0 {
            world
                .add_component(entity, ShadowComponent::new(true, false))
                .unwrap();
        }
        engine.upload_mesh(entity, &mesh, ()).unwrap();
    }

    engine.frame(0.016, &[], None);
    let first = engine.world().frame().variant_groups.clone();
    engine.frame(0.016, &[], None);
    let second = engine.world().frame().variant_groups.clone();

    assert_eq!(first, second);
    let members: usize = first.iter().map(|g| g.entities.len()).sum();
    assert_eq!(members, 12);
    let mut keys: Vec<_> = first.iter().map(|g| g.key.clone()).collect();
    let before = keys.len();
    keys.dedup();
    assert_eq!(keys.len(), before);
}

#[test]
fn high_water_mark_stays_within_object_height() {
    let mut world = World::new(Default::default());
    world.add_system(Box::new(TransformSystem));
    world.add_system(Box::new(WetnessSystem));

    let ocean = world.spawn("ocean");
    world
        .add_component(ocean, OceanComponent::new(Arc::new(FlatWater { level: 0.0 })))
        .unwrap();
    let buoy = world.spawn("buoy");
    world.add_component(buoy, TransformComponent::new()).unwrap();
    world
        .add_component(
            buoy,
            WetnessComponent::new().object_height(1.5).evaporation_rate(0.7),
        )
        .unwrap();

    let settings = RenderSettings::default();
    let depths = [-3.0, 0.4, 2.5, -0.2, 1.0, 7.0, 0.0, -5.0, 0.3];
    let steps = [0.5, 0.1, 2.0, 0.016, 1.0, 0.25, 3.0, 0.5, 0.05];
    for (depth, dt) in depths.into_iter().zip(steps) {
        world
            .update_transform(buoy, |t| t.set_position(Vec3::new(0.0, -depth, 0.0)))
            .unwrap();
        world.update(dt, &mut FrameContext::new(&settings).time(1.0));

        let wetness = world.get::<WetnessComponent>(buoy).unwrap();
        assert!(wetness.high_water_mark() >= 0.0);
        assert!(wetness.high_water_mark() <= 1.5);
    }
}

#[test]
fn lod_is_monotonic_in_distance() {
    let lod = LodComponent::new(vec![150.0, 50.0, 400.0]);
    let mut previous = 0;
    for step in 0..2000 {
        let level = compute_lod(step as f32 * 0.5, lod.thresholds(), lod.max_lod());
        assert!(level >= previous);
        assert!(level <= lod.max_lod());
        previous = level;
    }
    assert_eq!(previous, 3);
}

#[test]
fn identity_transform_keeps_bounds() {
    let local = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(3.0, 4.0, 0.5));
    assert_eq!(transform_aabb(&local, &Mat4::IDENTITY), local);
}
