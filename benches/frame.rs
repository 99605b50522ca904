//! Frame loop benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --bench frame
//! Filter:     cargo bench --bench frame -- depth_only

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Quat, Vec3};
use vista::ecs::components::{
    CameraComponent, LightComponent, MaterialComponent, Projection, ShadowComponent,
    TransformComponent, WetnessComponent, WindComponent,
};
use vista::{EngineConfig, MeshData, PipelineFactory, PipelineKey, SceneEngine};

struct NullFactory;

impl PipelineFactory for NullFactory {
    type Pipeline = ();

    fn build(&mut self, _key: &PipelineKey) -> anyhow::Result<()> {
        Ok(())
    }
}

fn cube() -> MeshData {
    let corners = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    MeshData {
        positions: corners.to_vec(),
        indices: Some(vec![
            0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6, 0, 4, 5, 0, 5, 1, 3, 2, 6, 3, 6, 7, 0, 3, 7, 0,
            7, 4, 1, 5, 6, 1, 6, 2,
        ]),
        ..MeshData::default()
    }
}

/// A grid of `n` cubes with a mix of features, a camera, and a sun.
fn setup_scene(n: usize) -> SceneEngine<NullFactory> {
    let mut engine = SceneEngine::new(EngineConfig::default(), NullFactory);
    let world = engine.world_mut();

    let camera = world.spawn("camera");
    world
        .add_component(
            camera,
            TransformComponent::from_position(Vec3::new(0.0, 5.0, 30.0))
                .with_rotation(Quat::from_rotation_x(-0.2)),
        )
        .unwrap();
    world
        .add_component(
            camera,
            CameraComponent::new(Projection::perspective(60.0, 16.0 / 9.0, 0.1, 500.0)),
        )
        .unwrap();
    let sun = world.spawn("sun");
    world
        .add_component(sun, LightComponent::directional(Vec3::new(-0.3, -1.0, -0.2), 3.0))
        .unwrap();

    let side = (n as f32).sqrt().ceil() as usize;
    let mesh = cube();
    for i in 0..n {
        let world = engine.world_mut();
        let entity = world.spawn(format!("cube-{i}"));
        let position = Vec3::new((i % side) as f32 * 2.0 - side as f32, 0.0, -((i / side) as f32) * 2.0);
        world
            .add_component(entity, TransformComponent::from_position(position))
            .unwrap();
        world
            .add_component(entity, ShadowComponent::new(true, true))
            .unwrap();
        world
            .add_component(entity, MaterialComponent::new().metallic_roughness(0.0, 0.6))
            .unwrap();
        if i % 3 == 0 {
            world.add_component(entity, WindComponent::default()).unwrap();
        }
        if i % 4 == 0 {
            world.add_component(entity, WetnessComponent::default()).unwrap();
        }
        engine.upload_mesh(entity, &mesh, ()).unwrap();
    }
    engine
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/static");
    for &n in &[100, 500, 1000] {
        let mut engine = setup_scene(n);
        engine.frame(0.016, &[], None);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| engine.frame(0.016, &[], None));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("frame/moving");
    for &n in &[100, 500, 1000] {
        let mut engine = setup_scene(n);
        let entities = engine
            .world()
            .query(&[vista::ComponentTag::Mesh])
            .into_iter()
            .collect::<Vec<_>>();
        let mut t = 0.0_f32;
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                t += 0.016;
                for (i, &entity) in entities.iter().enumerate().step_by(10) {
                    let offset = (t + i as f32).sin() * 0.1;
                    engine
                        .world_mut()
                        .update_transform(entity, |tr| {
                            let p = tr.position();
                            tr.set_position(Vec3::new(p.x, offset, p.z));
                        })
                        .unwrap();
                }
                engine.frame(0.016, &[], None)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frame);
criterion_main!(benches);
