//! Frustum culling results.

use std::collections::HashSet;

use hecs::Entity;

use crate::ecs::component::{ComponentHooks, ComponentTag, Component};

/// Per-frame visibility produced by the frustum cull system. Lives on one
/// internal entity.
///
/// An entity not in `tested` was never considered and counts as visible.
#[derive(Debug, Clone, Default)]
pub struct FrustumCullResults {
    enabled: bool,
    visible: HashSet<Entity>,
    tested: HashSet<Entity>,
}

impl FrustumCullResults {
    /// Whether culling ran this frame.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_visible(&self, entity: Entity) -> bool {
        !self.enabled || !self.tested.contains(&entity) || self.visible.contains(&entity)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn tested_count(&self) -> usize {
        self.tested.len()
    }

    pub fn culled_count(&self) -> usize {
        self.tested.len() - self.visible.len()
    }

    pub(crate) fn disable(&mut self) {
        self.enabled = false;
        self.visible.clear();
        self.tested.clear();
    }

    pub(crate) fn publish(
        &mut self,
        tested: impl IntoIterator<Item = Entity>,
        visible: impl IntoIterator<Item = Entity>,
    ) {
        self.enabled = true;
        self.tested.clear();
        self.tested.extend(tested);
        self.visible.clear();
        self.visible
            .extend(visible.into_iter().filter(|e| self.tested.contains(e)));
    }
}

impl ComponentHooks for FrustumCullResults {
    fn tag(&self) -> ComponentTag {
        ComponentTag::FrustumCullResults
    }
}

impl Component for FrustumCullResults {
    const TAG: ComponentTag = ComponentTag::FrustumCullResults;
}
