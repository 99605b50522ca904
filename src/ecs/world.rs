//! The World: entities, systems, spatial index and deferred deletion.

use std::collections::{BTreeMap, HashMap};

use glam::Mat4;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::BvhConfig;
use crate::ecs::component::{
    Capabilities, Component, ComponentHooks, ComponentRecord, ComponentTag, GraphicsResource,
};
use crate::ecs::components::{
    deserialize_tag, detach_tag, has_tag, serialize_tag, tag_capabilities, BoundsComponent,
    FrustumCullResults, GroupComponent, ReflectionProbeComponent, TransformComponent,
};
use crate::ecs::spatial::Bvh;
use crate::ecs::system::{FrameContext, System};
use crate::error::SceneError;
use crate::math::Aabb;
use crate::render::{ShaderVariantGroup, TextureHandle};

/// Identity stored on every entity spawned through the World.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    /// Stable identity string.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Engine-owned entity hidden from editors.
    pub internal: bool,
    seq: u64,
}

/// Serialized form of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    /// Tag name to component record, for serializable components only.
    pub components: BTreeMap<String, ComponentRecord>,
}

/// Per-frame outputs read by the render passes.
#[derive(Debug, Default)]
pub struct FrameOutputs {
    /// Entities bucketed by feature key, rebuilt every frame.
    pub variant_groups: Vec<ShaderVariantGroup>,
    /// Visible shadow casters in range.
    pub shadow_casters: Vec<Entity>,
}

/// Aggregate scene extent maintained by the bounds system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBounds {
    pub bounds: Aabb,
    pub radius: f32,
}

struct PendingDeletion {
    entity: Entity,
    id: String,
    components: Vec<Box<dyn ComponentHooks>>,
}

/// Owns entities and systems and runs the frame update.
pub struct World {
    ecs: hecs::World,
    ids: HashMap<String, Entity>,
    next_seq: u64,
    systems: Vec<Box<dyn System>>,
    spatial: Bvh,
    scene_bounds: Option<SceneBounds>,
    selection: Vec<Entity>,
    groups: BTreeMap<String, Vec<Entity>>,
    pending: Vec<PendingDeletion>,
    released: Vec<GraphicsResource>,
    torn_down: Vec<Entity>,
    frame: FrameOutputs,
    frame_index: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(BvhConfig::default())
    }
}

impl World {
    pub fn new(bvh: BvhConfig) -> Self {
        Self {
            ecs: hecs::World::new(),
            ids: HashMap::new(),
            next_seq: 0,
            systems: Vec::new(),
            spatial: Bvh::new(bvh),
            scene_bounds: None,
            selection: Vec::new(),
            groups: BTreeMap::new(),
            pending: Vec::new(),
            released: Vec::new(),
            torn_down: Vec::new(),
            frame: FrameOutputs::default(),
            frame_index: 0,
        }
    }

    // ---- entities ----

    /// Spawn an entity with a generated id.
    pub fn spawn(&mut self, name: impl Into<String>) -> Entity {
        let id = self.generate_id();
        self.spawn_meta(id, name.into(), false)
    }

    /// Spawn an entity with a caller-chosen id.
    pub fn spawn_with_id(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Entity, SceneError> {
        let id = id.into();
        if self.ids.contains_key(&id) {
            return Err(SceneError::DuplicateEntityId(id));
        }
        Ok(self.spawn_meta(id, name.into(), false))
    }

    /// Spawn an engine-owned entity.
    pub fn spawn_internal(&mut self, name: impl Into<String>) -> Entity {
        let id = self.generate_id();
        self.spawn_meta(id, name.into(), true)
    }

    fn generate_id(&self) -> String {
        (self.next_seq..)
            .map(|n| format!("entity-{n}"))
            .find(|id| !self.ids.contains_key(id))
            .unwrap_or_default()
    }

    fn spawn_meta(&mut self, id: String, name: String, internal: bool) -> Entity {
        let seq = self.next_seq;
        self.next_seq += 1;
        let entity = self.ecs.spawn((EntityMeta {
            id: id.clone(),
            name,
            internal,
            seq,
        },));
        trace!("spawned entity {id}");
        self.ids.insert(id, entity);
        entity
    }

    /// Look up a live entity by id.
    pub fn get_entity(&self, id: &str) -> Option<Entity> {
        self.ids.get(id).copied()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.ecs.contains(entity)
    }

    pub fn meta(&self, entity: Entity) -> Option<hecs::Ref<'_, EntityMeta>> {
        self.ecs.get::<&EntityMeta>(entity).ok()
    }

    /// Number of live entities, internal ones included.
    pub fn len(&self) -> usize {
        self.ecs.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.ecs.len() == 0
    }

    /// Remove an entity. It leaves queries, the spatial index, the selection
    /// and all groups immediately; component destroy hooks run at the next
    /// [`flush_pending_deletions`](Self::flush_pending_deletions).
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), SceneError> {
        let id = self
            .meta(entity)
            .map(|m| m.id.clone())
            .ok_or_else(|| SceneError::NoSuchEntity(format!("{entity:?}")))?;

        self.ids.remove(&id);
        self.selection.retain(|e| *e != entity);
        self.groups.retain(|_, members| {
            members.retain(|e| *e != entity);
            !members.is_empty()
        });
        self.untrack_bounds(entity);

        let components: Vec<_> = ComponentTag::ALL
            .into_iter()
            .filter_map(|tag| detach_tag(&mut self.ecs, entity, tag))
            .collect();
        // Checked live above.
        let _ = self.ecs.despawn(entity);

        debug!("entity {id} queued for teardown ({} components)", components.len());
        self.pending.push(PendingDeletion {
            entity,
            id,
            components,
        });
        Ok(())
    }

    /// [`destroy_entity`](Self::destroy_entity) by id.
    pub fn destroy_entity_by_id(&mut self, id: &str) -> Result<(), SceneError> {
        let entity = self
            .get_entity(id)
            .ok_or_else(|| SceneError::NoSuchEntity(id.to_string()))?;
        self.destroy_entity(entity)
    }

    /// Run destroy hooks of every queued entity. Call once per frame after
    /// GPU submission. Returns the number of entities torn down.
    pub fn flush_pending_deletions(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for PendingDeletion {
            entity,
            id,
            components,
        } in pending
        {
            for mut component in components {
                if component.capabilities().contains(Capabilities::DESTROY) {
                    component.destroy(&mut self.released);
                }
            }
            self.torn_down.push(entity);
            trace!("entity {id} torn down");
        }
        debug!("flushed {count} pending deletions");
        count
    }

    /// Entities waiting for teardown.
    pub fn pending_deletions(&self) -> usize {
        self.pending.len()
    }

    /// Take the graphics resources released by destroy hooks.
    pub fn drain_released_resources(&mut self) -> Vec<GraphicsResource> {
        std::mem::take(&mut self.released)
    }

    /// Take the handles of entities torn down by
    /// [`flush_pending_deletions`](Self::flush_pending_deletions), in
    /// destruction order. Backends key per-entity state by these.
    pub fn drain_torn_down(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.torn_down)
    }

    // ---- components ----

    /// Attach a component, destroying any existing component with its tag.
    pub fn add_component<C: Component>(
        &mut self,
        entity: Entity,
        component: C,
    ) -> Result<(), SceneError> {
        if !self.ecs.contains(entity) {
            return Err(SceneError::NoSuchEntity(format!("{entity:?}")));
        }
        if let Ok(mut previous) = self.ecs.remove_one::<C>(entity) {
            if previous.capabilities().contains(Capabilities::DESTROY) {
                previous.destroy(&mut self.released);
            }
            trace!("replaced {} on {entity:?}", C::TAG);
        }
        self.ecs
            .insert_one(entity, component)
            .map_err(|_| SceneError::NoSuchEntity(format!("{entity:?}")))?;
        if C::TAG == ComponentTag::Transform {
            self.mark_bounds_dirty(entity);
        }
        Ok(())
    }

    /// Detach and destroy a component. Returns whether one was present.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> bool {
        self.remove_component_by_tag(entity, C::TAG)
    }

    /// Detach and destroy the component for `tag`.
    pub fn remove_component_by_tag(&mut self, entity: Entity, tag: ComponentTag) -> bool {
        let Some(mut component) = detach_tag(&mut self.ecs, entity, tag) else {
            return false;
        };
        if component.capabilities().contains(Capabilities::DESTROY) {
            component.destroy(&mut self.released);
        }
        match tag {
            ComponentTag::Bounds => self.untrack_bounds(entity),
            ComponentTag::Group => {
                for members in self.groups.values_mut() {
                    members.retain(|e| *e != entity);
                }
                self.groups.retain(|_, members| !members.is_empty());
            }
            _ => {}
        }
        true
    }

    /// Drop `entity` from the spatial index. The bounds system only runs
    /// while some entity has bounds, so the last removal clears the scene
    /// bounds here.
    fn untrack_bounds(&mut self, entity: Entity) {
        if self.spatial.remove(entity) && self.spatial.is_empty() {
            debug!("spatial index empty, scene bounds cleared");
            self.scene_bounds = None;
        }
    }

    pub fn get<C: Component>(&self, entity: Entity) -> Option<hecs::Ref<'_, C>> {
        self.ecs.get::<&C>(entity).ok()
    }

    pub fn get_mut<C: Component>(&self, entity: Entity) -> Option<hecs::RefMut<'_, C>> {
        self.ecs.get::<&mut C>(entity).ok()
    }

    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.has_tag(entity, C::TAG)
    }

    pub fn has_tag(&self, entity: Entity, tag: ComponentTag) -> bool {
        self.ecs
            .entity(entity)
            .map(|e| has_tag(&e, tag))
            .unwrap_or(false)
    }

    /// Capabilities of the component for `tag`, if the entity holds one.
    pub fn capabilities(&self, entity: Entity, tag: ComponentTag) -> Option<Capabilities> {
        let entity_ref = self.ecs.entity(entity).ok()?;
        tag_capabilities(&entity_ref, tag)
    }

    /// Modify the transform through a closure; marks the transform and
    /// sibling bounds dirty.
    pub fn update_transform(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut TransformComponent),
    ) -> Result<(), SceneError> {
        {
            let mut transform = self
                .get_mut::<TransformComponent>(entity)
                .ok_or_else(|| SceneError::NoSuchEntity(format!("{entity:?}")))?;
            f(&mut *transform);
            transform.mark_dirty();
        }
        self.mark_bounds_dirty(entity);
        Ok(())
    }

    fn mark_bounds_dirty(&self, entity: Entity) {
        if let Some(mut bounds) = self.get_mut::<BoundsComponent>(entity) {
            bounds.mark_dirty();
        }
    }

    // ---- queries ----

    /// Entities holding every tag in `tags`, in spawn order.
    pub fn query(&self, tags: &[ComponentTag]) -> Vec<Entity> {
        self.collect(|e| tags.iter().all(|tag| has_tag(e, *tag)))
    }

    /// Entities holding at least one tag in `tags`, in spawn order.
    pub fn query_any(&self, tags: &[ComponentTag]) -> Vec<Entity> {
        self.collect(|e| tags.iter().any(|tag| has_tag(e, *tag)))
    }

    fn collect(&self, filter: impl Fn(&hecs::EntityRef<'_>) -> bool) -> Vec<Entity> {
        let mut found: Vec<(u64, Entity)> = self
            .ecs
            .iter()
            .filter(|e| filter(e))
            .filter_map(|e| e.get::<&EntityMeta>().map(|meta| (meta.seq, e.entity())))
            .collect();
        found.sort_unstable_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, e)| e).collect()
    }

    /// First entity holding a component of type `C`.
    pub fn find_first<C: Component>(&self) -> Option<Entity> {
        self.query(&[C::TAG]).into_iter().next()
    }

    /// Raw component storage.
    pub fn ecs(&self) -> &hecs::World {
        &self.ecs
    }

    /// Mutable raw component storage. Bypasses replace/destroy hooks.
    pub fn ecs_mut(&mut self) -> &mut hecs::World {
        &mut self.ecs
    }

    // ---- systems ----

    /// Register a system, keeping the list sorted by priority. Systems with
    /// equal priority run in registration order.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        debug!("registered system {} (priority {})", system.name(), system.priority());
        self.systems.push(system);
        self.systems.sort_by_key(|s| s.priority());
    }

    /// Remove a system by name. Returns whether one was removed.
    pub fn remove_system(&mut self, name: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.name() != name);
        self.systems.len() != before
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Run every system once, in ascending priority.
    pub fn update(&mut self, dt: f32, ctx: &mut FrameContext<'_>) {
        self.frame_index += 1;
        self.frame = FrameOutputs::default();
        let mut systems = std::mem::take(&mut self.systems);

        for system in systems.iter_mut() {
            let required = system.required_components();
            let entities = if required.is_empty() {
                Vec::new()
            } else {
                let found = self.query(required);
                if found.is_empty() {
                    trace!("skipping {}: no matching entities", system.name());
                    continue;
                }
                found
            };
            trace!("running {} on {} entities", system.name(), entities.len());
            system.update(self, &entities, dt, ctx);
        }

        // Keep systems registered while the frame ran.
        systems.append(&mut self.systems);
        systems.sort_by_key(|s| s.priority());
        self.systems = systems;
    }

    /// Frames run so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn frame(&self) -> &FrameOutputs {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut FrameOutputs {
        &mut self.frame
    }

    // ---- spatial ----

    pub fn spatial_index(&self) -> &Bvh {
        &self.spatial
    }

    pub(crate) fn spatial_index_mut(&mut self) -> &mut Bvh {
        &mut self.spatial
    }

    /// Aggregate bounds of everything in the spatial index.
    pub fn scene_bounds(&self) -> Option<SceneBounds> {
        self.scene_bounds
    }

    pub(crate) fn set_scene_bounds(&mut self, bounds: Option<SceneBounds>) {
        self.scene_bounds = bounds;
    }

    /// Whether the frustum cull pass left the entity visible. True when
    /// culling did not run.
    pub fn is_visible(&self, entity: Entity) -> bool {
        self.ecs
            .query::<&FrustumCullResults>()
            .iter()
            .next()
            .map(|(_, results)| results.is_visible(entity))
            .unwrap_or(true)
    }

    // ---- selection & groups ----

    pub fn select(&mut self, entity: Entity) -> Result<(), SceneError> {
        if !self.contains(entity) {
            return Err(SceneError::NoSuchEntity(format!("{entity:?}")));
        }
        if !self.selection.contains(&entity) {
            self.selection.push(entity);
        }
        Ok(())
    }

    pub fn deselect(&mut self, entity: Entity) -> bool {
        let before = self.selection.len();
        self.selection.retain(|e| *e != entity);
        self.selection.len() != before
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected entities in selection order.
    pub fn selection(&self) -> &[Entity] {
        &self.selection
    }

    /// Create or replace a named group. Members get a `GroupComponent`.
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        members: &[Entity],
    ) -> Result<(), SceneError> {
        let name = name.into();
        if let Some(missing) = members.iter().find(|e| !self.contains(**e)) {
            return Err(SceneError::NoSuchEntity(format!("{missing:?}")));
        }
        self.dissolve_group(&name);
        for entity in members {
            // Moving between groups drops the old membership.
            self.remove_component::<GroupComponent>(*entity);
            self.add_component(*entity, GroupComponent::new(name.clone()))?;
        }
        let mut unique = Vec::with_capacity(members.len());
        for entity in members {
            if !unique.contains(entity) {
                unique.push(*entity);
            }
        }
        info!("group {name} created with {} members", unique.len());
        self.groups.insert(name, unique);
        Ok(())
    }

    pub fn group_members(&self, name: &str) -> Option<&[Entity]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Remove a group and its members' `GroupComponent`s.
    pub fn dissolve_group(&mut self, name: &str) -> bool {
        let Some(members) = self.groups.remove(name) else {
            return false;
        };
        for entity in members {
            let in_group = self
                .get::<GroupComponent>(entity)
                .is_some_and(|g| g.group == name);
            if in_group {
                let _ = self.ecs.remove_one::<GroupComponent>(entity);
            }
        }
        true
    }

    // ---- serialization ----

    /// Serialize the entity's serializable components.
    pub fn serialize_entity(&self, entity: Entity) -> Result<EntityRecord, SceneError> {
        let entity_ref = self
            .ecs
            .entity(entity)
            .map_err(|_| SceneError::NoSuchEntity(format!("{entity:?}")))?;
        let meta = entity_ref
            .get::<&EntityMeta>()
            .ok_or_else(|| SceneError::NoSuchEntity(format!("{entity:?}")))?;
        let components = ComponentTag::ALL
            .into_iter()
            .filter_map(|tag| {
                serialize_tag(&entity_ref, tag).map(|record| (tag.as_str().to_string(), record))
            })
            .collect();
        Ok(EntityRecord {
            id: meta.id.clone(),
            name: meta.name.clone(),
            components,
        })
    }

    /// Decode a record and attach it to the entity.
    pub fn deserialize_component(
        &mut self,
        entity: Entity,
        tag: ComponentTag,
        record: &ComponentRecord,
    ) -> Result<(), SceneError> {
        if !self.contains(entity) {
            return Err(SceneError::NoSuchEntity(format!("{entity:?}")));
        }
        deserialize_tag(self, entity, tag, record)
    }

    /// Recreate an entity and its components from a record. Unknown tags
    /// and records that fail to decode are logged and skipped.
    pub fn spawn_from_record(&mut self, record: &EntityRecord) -> Result<Entity, SceneError> {
        let entity = self.spawn_with_id(record.id.clone(), record.name.clone())?;
        for (name, component) in &record.components {
            let Some(tag) = ComponentTag::parse(name) else {
                warn!("entity {}: unknown component tag {name}", record.id);
                continue;
            };
            if let Err(err) = self.deserialize_component(entity, tag, component) {
                warn!("entity {}: skipping {tag}: {err}", record.id);
            }
        }
        Ok(entity)
    }

    // ---- reflection probes ----

    /// Complete a probe bake started by the reflection probe system.
    pub fn finish_probe_bake(
        &mut self,
        entity: Entity,
        cubemap: TextureHandle,
    ) -> Result<(), SceneError> {
        let replaced = {
            let mut probe = self
                .get_mut::<ReflectionProbeComponent>(entity)
                .ok_or_else(|| SceneError::NoSuchEntity(format!("{entity:?}")))?;
            probe.complete_bake(cubemap)?
        };
        if let Some(old) = replaced {
            self.released.push(GraphicsResource::Cubemap(old));
        }
        info!("reflection probe on {entity:?} baked");
        Ok(())
    }

    /// Model matrix of the entity, identity without a transform.
    pub fn model_matrix(&self, entity: Entity) -> Mat4 {
        self.get::<TransformComponent>(entity)
            .map(|t| t.model_matrix())
            .unwrap_or(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{MeshComponent, VisibilityComponent};
    use crate::render::GpuMeshId;

    #[test]
    fn test_spawn_ids_unique() {
        let mut world = World::default();
        let a = world.spawn("a");
        let b = world.spawn("b");
        assert_ne!(a, b);
        assert_eq!(world.get_entity("entity-0"), Some(a));
        assert_eq!(world.get_entity("entity-1"), Some(b));
        assert!(matches!(
            world.spawn_with_id("entity-0", "dup"),
            Err(SceneError::DuplicateEntityId(_))
        ));
    }

    #[test]
    fn test_spawn_skips_taken_generated_id() {
        let mut world = World::default();
        world.spawn_with_id("entity-1", "custom").unwrap();
        // seq is now 1 but "entity-1" is taken.
        let e = world.spawn("auto");
        assert_eq!(world.meta(e).unwrap().id, "entity-2");
    }

    #[test]
    fn test_query_all_and_any() {
        let mut world = World::default();
        let a = world.spawn("a");
        let b = world.spawn("b");
        world.add_component(a, TransformComponent::new()).unwrap();
        world.add_component(a, VisibilityComponent::new(true)).unwrap();
        world.add_component(b, TransformComponent::new()).unwrap();

        assert_eq!(world.query(&[ComponentTag::Transform]), vec![a, b]);
        assert_eq!(
            world.query(&[ComponentTag::Transform, ComponentTag::Visibility]),
            vec![a]
        );
        assert_eq!(
            world.query_any(&[ComponentTag::Visibility, ComponentTag::Mesh]),
            vec![a]
        );
    }

    #[test]
    fn test_remove_component_runs_destroy() {
        let mut world = World::default();
        let e = world.spawn("mesh");
        world
            .add_component(e, MeshComponent::new("m").with_mesh_ids([GpuMeshId(5)]))
            .unwrap();
        assert!(world.remove_component::<MeshComponent>(e));
        assert!(!world.remove_component::<MeshComponent>(e));
        assert_eq!(
            world.drain_released_resources(),
            vec![GraphicsResource::Mesh(GpuMeshId(5))]
        );
    }

    #[test]
    fn test_add_component_to_missing_entity() {
        let mut world = World::default();
        let e = world.spawn("gone");
        world.destroy_entity(e).unwrap();
        assert!(matches!(
            world.add_component(e, TransformComponent::new()),
            Err(SceneError::NoSuchEntity(_))
        ));
        assert!(world.destroy_entity(e).is_err());
    }

    #[test]
    fn test_selection_and_groups_follow_destroy() {
        let mut world = World::default();
        let a = world.spawn("a");
        let b = world.spawn("b");
        world.select(a).unwrap();
        world.select(a).unwrap();
        world.select(b).unwrap();
        assert_eq!(world.selection(), &[a, b]);
        world.create_group("pair", &[a, b]).unwrap();
        assert_eq!(world.get::<GroupComponent>(a).unwrap().group, "pair");

        world.destroy_entity(a).unwrap();
        assert_eq!(world.selection(), &[b]);
        assert_eq!(world.group_members("pair"), Some(&[b][..]));

        assert!(world.dissolve_group("pair"));
        assert!(!world.has::<GroupComponent>(b));
        assert_eq!(world.group_members("pair"), None);
    }

    #[test]
    fn test_serialize_entity_and_restore() {
        let mut world = World::default();
        let e = world.spawn_with_id("crate-1", "Crate").unwrap();
        world
            .add_component(e, TransformComponent::from_position(glam::Vec3::X))
            .unwrap();
        world.add_component(e, MeshComponent::new("crate")).unwrap();
        world
            .add_component(e, crate::ecs::components::FrustumCullResults::default())
            .unwrap();

        let record = world.serialize_entity(e).unwrap();
        assert_eq!(record.id, "crate-1");
        assert!(record.components.contains_key("transform"));
        assert!(record.components.contains_key("mesh"));
        // Not serializable.
        assert!(!record.components.contains_key("frustum-cull-results"));

        let mut other = World::default();
        let restored = other.spawn_from_record(&record).unwrap();
        assert!(other.has::<TransformComponent>(restored));
        assert_eq!(other.get::<MeshComponent>(restored).unwrap().source, "crate");
    }

    #[test]
    fn test_deserialize_unsupported() {
        let mut world = World::default();
        let e = world.spawn("e");
        let err = world
            .deserialize_component(e, ComponentTag::Ocean, &ComponentRecord::new())
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::Unsupported {
                tag: ComponentTag::Ocean,
                ..
            }
        ));
    }

    #[test]
    fn test_capabilities_are_checkable() {
        let mut world = World::default();
        let e = world.spawn("e");
        world.add_component(e, MeshComponent::new("m")).unwrap();
        let caps = world.capabilities(e, ComponentTag::Mesh).unwrap();
        assert!(caps.contains(Capabilities::DESTROY | Capabilities::GRAPHICS_RESOURCE));
        assert_eq!(world.capabilities(e, ComponentTag::Light), None);
    }
}
