//! Component records attached to entities.

pub mod culling;
pub mod environment;
pub mod group;
pub mod lod;
pub mod reflection;
pub mod rendering;
pub mod transform;
pub mod wetness;
pub mod wind;

pub use culling::FrustumCullResults;
pub use environment::{
    FlatWater, OceanComponent, OceanSurface, TerrainComponent, TerrainProvider,
};
pub use group::GroupComponent;
pub use lod::{compute_lod, LodComponent};
pub use reflection::{matrix_hash, BakeState, ReflectionProbeComponent, SsrComponent};
pub use rendering::{
    CameraComponent, LightComponent, LightKind, MaterialComponent, MeshComponent, Projection,
    ShadowComponent, TextureFlags, VisibilityComponent,
};
pub use transform::{compose_model_matrix, BoundsComponent, Pivot, TransformComponent};
pub use wetness::WetnessComponent;
pub use wind::WindComponent;

use crate::ecs::component::{
    Capabilities, Component, ComponentHooks, ComponentRecord, ComponentTag,
};
use crate::ecs::world::World;
use crate::error::SceneError;

/// Generates tag-keyed dispatch over the concrete component types. The
/// matches are exhaustive, so adding a tag without a type fails to compile.
macro_rules! tag_dispatch {
    ($($tag:ident => $ty:ty),* $(,)?) => {
        /// Whether the entity holds the component for `tag`.
        pub(crate) fn has_tag(entity: &hecs::EntityRef<'_>, tag: ComponentTag) -> bool {
            match tag {
                $(ComponentTag::$tag => entity.has::<$ty>(),)*
            }
        }

        /// Remove the component for `tag`, returning it type-erased.
        pub(crate) fn detach_tag(
            ecs: &mut hecs::World,
            entity: hecs::Entity,
            tag: ComponentTag,
        ) -> Option<Box<dyn ComponentHooks>> {
            match tag {
                $(ComponentTag::$tag => ecs
                    .remove_one::<$ty>(entity)
                    .ok()
                    .map(|c| Box::new(c) as Box<dyn ComponentHooks>),)*
            }
        }

        /// Capabilities of the component for `tag`, if present.
        pub(crate) fn tag_capabilities(
            entity: &hecs::EntityRef<'_>,
            tag: ComponentTag,
        ) -> Option<Capabilities> {
            match tag {
                $(ComponentTag::$tag => entity.get::<&$ty>().map(|c| c.capabilities()),)*
            }
        }

        /// Serialize the component for `tag` when it supports it.
        pub(crate) fn serialize_tag(
            entity: &hecs::EntityRef<'_>,
            tag: ComponentTag,
        ) -> Option<ComponentRecord> {
            match tag {
                $(ComponentTag::$tag => entity.get::<&$ty>().and_then(|c| {
                    if c.capabilities().contains(Capabilities::SERIALIZE) {
                        c.serialize()
                    } else {
                        None
                    }
                }),)*
            }
        }

        /// Decode a record and attach it, replacing any existing component.
        pub(crate) fn deserialize_tag(
            world: &mut World,
            entity: hecs::Entity,
            tag: ComponentTag,
            record: &ComponentRecord,
        ) -> Result<(), SceneError> {
            match tag {
                $(ComponentTag::$tag => {
                    let component = <$ty as Component>::deserialize(record)?;
                    world.add_component(entity, component)
                })*
            }
        }
    };
}

tag_dispatch! {
    Transform => TransformComponent,
    Mesh => MeshComponent,
    Material => MaterialComponent,
    Light => LightComponent,
    Lod => LodComponent,
    Wind => WindComponent,
    Wetness => WetnessComponent,
    ReflectionProbe => ReflectionProbeComponent,
    Ssr => SsrComponent,
    Shadow => ShadowComponent,
    Visibility => VisibilityComponent,
    Bounds => BoundsComponent,
    Group => GroupComponent,
    FrustumCullResults => FrustumCullResults,
    Terrain => TerrainComponent,
    Ocean => OceanComponent,
    Camera => CameraComponent,
}
