//! Component identity and lifecycle hooks.
//!
//! Every component type carries a compile-time [`ComponentTag`]. Optional
//! behaviour (exposing graphics resources, a destroy hook, serialization) is
//! advertised through [`Capabilities`] so callers can check for support
//! instead of relying on silently empty default methods.

use std::fmt;

use bitflags::bitflags;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SceneError;
use crate::render::{GpuMeshId, TextureHandle};

/// Plain key/value record produced by component serialization.
pub type ComponentRecord = Map<String, Value>;

/// Closed set of component kinds. An entity holds at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentTag {
    Transform,
    Mesh,
    Material,
    Light,
    Lod,
    Wind,
    Wetness,
    ReflectionProbe,
    Ssr,
    Shadow,
    Visibility,
    Bounds,
    Group,
    FrustumCullResults,
    Terrain,
    Ocean,
    Camera,
}

impl ComponentTag {
    /// Every tag, in declaration order.
    pub const ALL: [ComponentTag; 17] = [
        ComponentTag::Transform,
        ComponentTag::Mesh,
        ComponentTag::Material,
        ComponentTag::Light,
        ComponentTag::Lod,
        ComponentTag::Wind,
        ComponentTag::Wetness,
        ComponentTag::ReflectionProbe,
        ComponentTag::Ssr,
        ComponentTag::Shadow,
        ComponentTag::Visibility,
        ComponentTag::Bounds,
        ComponentTag::Group,
        ComponentTag::FrustumCullResults,
        ComponentTag::Terrain,
        ComponentTag::Ocean,
        ComponentTag::Camera,
    ];

    /// Stable name used in serialized records.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentTag::Transform => "transform",
            ComponentTag::Mesh => "mesh",
            ComponentTag::Material => "material",
            ComponentTag::Light => "light",
            ComponentTag::Lod => "lod",
            ComponentTag::Wind => "wind",
            ComponentTag::Wetness => "wetness",
            ComponentTag::ReflectionProbe => "reflection-probe",
            ComponentTag::Ssr => "ssr",
            ComponentTag::Shadow => "shadow",
            ComponentTag::Visibility => "visibility",
            ComponentTag::Bounds => "bounds",
            ComponentTag::Group => "group",
            ComponentTag::FrustumCullResults => "frustum-cull-results",
            ComponentTag::Terrain => "terrain",
            ComponentTag::Ocean => "ocean",
            ComponentTag::Camera => "camera",
        }
    }

    /// Parse a serialized tag name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Optional behaviour a component supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Exposes named graphics resources via [`ComponentHooks::graphics_resource`].
        const GRAPHICS_RESOURCE = 1 << 0;
        /// Releases resources in [`ComponentHooks::destroy`].
        const DESTROY = 1 << 1;
        /// Produces a record from [`ComponentHooks::serialize`].
        const SERIALIZE = 1 << 2;
        /// Can be rebuilt by [`Component::deserialize`].
        const DESERIALIZE = 1 << 3;
    }
}

/// A graphics resource owned by a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsResource {
    /// Mesh in the render layer's mesh table.
    Mesh(GpuMeshId),
    /// Captured environment cube map.
    Cubemap(TextureHandle),
    /// 2D material texture.
    Texture(TextureHandle),
}

/// Object-safe lifecycle hooks shared by every component.
///
/// Only the methods matching [`capabilities`](Self::capabilities) are
/// meaningful; the World checks the flags before calling them.
pub trait ComponentHooks: Send + Sync + 'static {
    /// Tag identifying the component kind.
    fn tag(&self) -> ComponentTag;

    /// Optional behaviour this component implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Look up a named graphics resource.
    fn graphics_resource(&self, _name: &str) -> Option<GraphicsResource> {
        None
    }

    /// Release owned resources into `released`.
    fn destroy(&mut self, _released: &mut Vec<GraphicsResource>) {}

    /// Produce a plain key/value record of the persistent state.
    fn serialize(&self) -> Option<ComponentRecord> {
        None
    }
}

/// A typed component stored on an entity.
pub trait Component: ComponentHooks + Sized {
    /// Tag identifying the component kind.
    const TAG: ComponentTag;

    /// Rebuild a component from a record produced by `serialize`.
    fn deserialize(_record: &ComponentRecord) -> Result<Self, SceneError> {
        Err(SceneError::Unsupported {
            tag: Self::TAG,
            capability: Capabilities::DESERIALIZE,
        })
    }
}

/// Serialize a serde-enabled component into a record.
pub(crate) fn to_record<T: Serialize>(value: &T) -> Option<ComponentRecord> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("component serialization failed: {err}");
            None
        }
    }
}

/// Decode a record into a serde-enabled component.
pub(crate) fn from_record<T: DeserializeOwned>(record: &ComponentRecord) -> Result<T, SceneError> {
    Ok(serde_json::from_value(Value::Object(record.clone()))?)
}

/// Implement the hooks of a plain data component whose whole persistent
/// state is its serde representation.
macro_rules! record_component {
    ($ty:ty, $tag:ident) => {
        impl $crate::ecs::component::ComponentHooks for $ty {
            fn tag(&self) -> $crate::ecs::component::ComponentTag {
                $crate::ecs::component::ComponentTag::$tag
            }

            fn capabilities(&self) -> $crate::ecs::component::Capabilities {
                $crate::ecs::component::Capabilities::SERIALIZE
                    | $crate::ecs::component::Capabilities::DESERIALIZE
            }

            fn serialize(&self) -> Option<$crate::ecs::component::ComponentRecord> {
                $crate::ecs::component::to_record(self)
            }
        }

        impl $crate::ecs::component::Component for $ty {
            const TAG: $crate::ecs::component::ComponentTag =
                $crate::ecs::component::ComponentTag::$tag;

            fn deserialize(
                record: &$crate::ecs::component::ComponentRecord,
            ) -> Result<Self, $crate::error::SceneError> {
                $crate::ecs::component::from_record(record)
            }
        }
    };
}

pub(crate) use record_component;
