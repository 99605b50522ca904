//! System trait and per-frame context.

use glam::{Mat4, Vec3};
use hecs::Entity;

use crate::config::RenderSettings;
use crate::ecs::component::ComponentTag;
use crate::ecs::systems::ProbeCapture;
use crate::ecs::world::World;
use crate::input::InputEvent;
use crate::render::GpuMeshSink;

/// Default system priorities. Lower runs first.
pub mod priority {
    pub const NAVIGATION: i32 = -10;
    pub const TRANSFORM: i32 = 0;
    pub const BOUNDS: i32 = 10;
    pub const LOD: i32 = 10;
    pub const WIND: i32 = 50;
    pub const WETNESS: i32 = 55;
    pub const FRUSTUM_CULL: i32 = 85;
    pub const SHADOW_CASTER: i32 = 90;
    pub const SSR: i32 = 95;
    pub const REFLECTION_PROBE: i32 = 96;
    pub const MESH_RENDER: i32 = 100;
}

/// Collaborators and externally supplied state for one frame.
///
/// Everything optional may be absent; systems that need a missing piece
/// skip or defer their work.
pub struct FrameContext<'a> {
    pub settings: &'a RenderSettings,
    /// Seconds since the engine started.
    pub time: f32,
    pub camera_position: Option<Vec3>,
    pub view_projection: Option<Mat4>,
    pub input: &'a [InputEvent],
    pub mesh_sink: Option<&'a mut dyn GpuMeshSink>,
    pub capture: Option<&'a mut dyn ProbeCapture>,
}

impl<'a> FrameContext<'a> {
    pub fn new(settings: &'a RenderSettings) -> Self {
        Self {
            settings,
            time: 0.0,
            camera_position: None,
            view_projection: None,
            input: &[],
            mesh_sink: None,
            capture: None,
        }
    }

    pub fn time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    pub fn camera(mut self, position: Vec3, view_projection: Mat4) -> Self {
        self.camera_position = Some(position);
        self.view_projection = Some(view_projection);
        self
    }

    pub fn input(mut self, input: &'a [InputEvent]) -> Self {
        self.input = input;
        self
    }

    pub fn mesh_sink(mut self, sink: &'a mut dyn GpuMeshSink) -> Self {
        self.mesh_sink = Some(sink);
        self
    }

    pub fn capture(mut self, capture: &'a mut dyn ProbeCapture) -> Self {
        self.capture = Some(capture);
        self
    }
}

/// A per-frame transform over entities holding all required components.
///
/// Systems keep no per-entity state; anything that must survive a frame
/// lives in components.
pub trait System {
    fn name(&self) -> &'static str;

    /// Execution order within a frame, ascending.
    fn priority(&self) -> i32;

    /// Tags an entity must hold to be passed to [`update`](Self::update).
    /// An empty set runs the system once with no entities.
    fn required_components(&self) -> &'static [ComponentTag];

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        dt: f32,
        ctx: &mut FrameContext<'_>,
    );
}
