//! Backend-neutral draw commands.

use hecs::Entity;

use crate::render::pipeline_cache::PipelineKey;
use crate::render::uniforms::GlobalUniforms;
use crate::render::{GpuMeshId, TextureHandle};

/// Bind group slots shared by every variant pipeline.
pub const GLOBAL_SLOT: u32 = 0;
pub const MODEL_SLOT: u32 = 1;
pub const MATERIAL_SLOT: u32 = 2;
pub const ENVIRONMENT_SLOT: u32 = 3;

/// Environment lighting source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentBinding {
    /// Scene-wide environment map.
    Scene,
    /// Cube map captured by the entity's reflection probe.
    Probe {
        entity: Entity,
        cubemap: TextureHandle,
    },
}

/// Resource set bound for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingRef {
    Global,
    Model(GpuMeshId),
    Material(Entity),
    Environment(EnvironmentBinding),
}

impl BindingRef {
    pub fn slot(&self) -> u32 {
        match self {
            BindingRef::Global => GLOBAL_SLOT,
            BindingRef::Model(_) => MODEL_SLOT,
            BindingRef::Material(_) => MATERIAL_SLOT,
            BindingRef::Environment(_) => ENVIRONMENT_SLOT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    SetPipeline(PipelineKey),
    SetBindGroup(BindingRef),
    Draw { entity: Entity, mesh: GpuMeshId },
}

/// Commands of one pass with the globals they were recorded against.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub globals: GlobalUniforms,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(globals: GlobalUniforms) -> Self {
        Self {
            globals,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Pipelines in bind order.
    pub fn pipelines(&self) -> Vec<PipelineKey> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetPipeline(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    /// (entity, mesh) of every draw in order.
    pub fn draws(&self) -> Vec<(Entity, GpuMeshId)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Draw { entity, mesh } => Some((*entity, *mesh)),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Draw { .. }))
            .count()
    }
}
