//! Bounding volume hierarchy over entity world bounds.
//!
//! Entries are written by the bounds system and removed by the World. The
//! tree is rebuilt top-down when entries change; queries against a stale
//! tree fall back to a linear scan so results are always exact.

use std::collections::HashMap;

use hecs::Entity;

use crate::config::BvhConfig;
use crate::math::{Aabb, Frustum, Intersection};

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Aabb,
        start: usize,
        count: usize,
    },
    Branch {
        bounds: Aabb,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn bounds(&self) -> &Aabb {
        match self {
            Node::Leaf { bounds, .. } | Node::Branch { bounds, .. } => bounds,
        }
    }
}

/// Spatial index keyed by entity.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    config: BvhConfig,
    entries: HashMap<Entity, Aabb>,
    nodes: Vec<Node>,
    items: Vec<(Entity, Aabb)>,
    dirty: bool,
}

impl Bvh {
    pub fn new(config: BvhConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Insert or replace an entity's bounds.
    pub fn insert(&mut self, entity: Entity, bounds: Aabb) {
        if self.entries.insert(entity, bounds) != Some(bounds) {
            self.dirty = true;
        }
    }

    /// Remove an entity. Returns whether it was present.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let removed = self.entries.remove(&entity).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn get(&self, entity: Entity) -> Option<&Aabb> {
        self.entries.get(&entity)
    }

    /// Indexed entities in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.keys().copied()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether entries changed since the last rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.nodes.clear();
        self.items.clear();
        self.dirty = false;
    }

    /// Union of all entries.
    pub fn bounds(&self) -> Aabb {
        self.entries
            .values()
            .fold(Aabb::EMPTY, |acc, b| acc.merge(b))
    }

    /// Rebuild the tree if entries changed.
    pub fn rebuild_if_dirty(&mut self) {
        if self.dirty {
            self.rebuild();
        }
    }

    /// Rebuild the tree from the current entries.
    pub fn rebuild(&mut self) {
        self.nodes.clear();
        self.items = self
            .entries
            .iter()
            .filter(|(_, b)| b.is_valid())
            .map(|(e, b)| (*e, *b))
            .collect();
        // Deterministic layout regardless of hash order.
        self.items.sort_by_key(|(e, _)| e.to_bits());
        if !self.items.is_empty() {
            let len = self.items.len();
            self.build_node(0, len);
        }
        self.dirty = false;
        tracing::trace!(
            "bvh rebuilt: {} entries, {} nodes",
            self.items.len(),
            self.nodes.len()
        );
    }

    fn build_node(&mut self, start: usize, count: usize) -> usize {
        let slice = &mut self.items[start..start + count];
        let bounds = slice.iter().fold(Aabb::EMPTY, |acc, (_, b)| acc.merge(b));
        let index = self.nodes.len();

        if count <= self.config.max_leaf_size.max(1) {
            self.nodes.push(Node::Leaf {
                bounds,
                start,
                count,
            });
            return index;
        }

        // Median split along the axis with the lowest surface area cost.
        let mid = count / 2;
        let mut best_axis = 0;
        let mut best_cost = f32::INFINITY;
        for axis in 0..3 {
            sort_by_axis(slice, axis);
            let cost = split_cost(&slice[..mid]) + split_cost(&slice[mid..]);
            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
            }
        }
        sort_by_axis(slice, best_axis);

        // Placeholder, patched once children exist.
        self.nodes.push(Node::Leaf {
            bounds,
            start,
            count,
        });
        let left = self.build_node(start, mid);
        let right = self.build_node(start + mid, count - mid);
        self.nodes[index] = Node::Branch {
            bounds,
            left,
            right,
        };
        index
    }

    /// Entities whose bounds intersect the frustum.
    pub fn query_frustum(&self, frustum: &Frustum) -> Vec<Entity> {
        if self.dirty {
            return self
                .entries
                .iter()
                .filter(|(_, b)| b.is_valid() && frustum.intersects_aabb(b))
                .map(|(e, _)| *e)
                .collect();
        }

        let mut found = Vec::new();
        if self.nodes.is_empty() {
            return found;
        }
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match frustum.test_aabb(node.bounds()) {
                Intersection::Outside => {}
                Intersection::Inside => self.collect_all(index, &mut found),
                Intersection::Intersecting => match node {
                    Node::Leaf { start, count, .. } => {
                        found.extend(
                            self.items[*start..*start + *count]
                                .iter()
                                .filter(|(_, b)| frustum.intersects_aabb(b))
                                .map(|(e, _)| *e),
                        );
                    }
                    Node::Branch { left, right, .. } => {
                        stack.push(*right);
                        stack.push(*left);
                    }
                },
            }
        }
        found
    }

    /// Entities whose bounds overlap `region`.
    pub fn query_aabb(&self, region: &Aabb) -> Vec<Entity> {
        if self.dirty {
            return self
                .entries
                .iter()
                .filter(|(_, b)| b.intersects(region))
                .map(|(e, _)| *e)
                .collect();
        }

        let mut found = Vec::new();
        if self.nodes.is_empty() {
            return found;
        }
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds().intersects(region) {
                continue;
            }
            match node {
                Node::Leaf { start, count, .. } => found.extend(
                    self.items[*start..*start + *count]
                        .iter()
                        .filter(|(_, b)| b.intersects(region))
                        .map(|(e, _)| *e),
                ),
                Node::Branch { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        found
    }

    fn collect_all(&self, index: usize, found: &mut Vec<Entity>) {
        match &self.nodes[index] {
            Node::Leaf { start, count, .. } => {
                found.extend(self.items[*start..*start + *count].iter().map(|(e, _)| *e));
            }
            Node::Branch { left, right, .. } => {
                self.collect_all(*left, found);
                self.collect_all(*right, found);
            }
        }
    }
}

fn sort_by_axis(items: &mut [(Entity, Aabb)], axis: usize) {
    items.sort_by(|(_, a), (_, b)| a.center()[axis].total_cmp(&b.center()[axis]));
}

fn split_cost(items: &[(Entity, Aabb)]) -> f32 {
    let bounds = items.iter().fold(Aabb::EMPTY, |acc, (_, b)| acc.merge(b));
    bounds.surface_area() * items.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    fn grid(world: &mut hecs::World, bvh: &mut Bvh, n: i32) -> Vec<Entity> {
        let mut entities = Vec::new();
        for x in 0..n {
            for z in 0..n {
                let e = world.spawn(());
                let center = Vec3::new(x as f32 * 10.0, 0.0, z as f32 * 10.0);
                bvh.insert(e, Aabb::from_center_half_extents(center, Vec3::ONE));
                entities.push(e);
            }
        }
        entities
    }

    #[test]
    fn test_query_aabb_matches_linear_scan() {
        let mut world = hecs::World::new();
        let mut bvh = Bvh::new(BvhConfig { max_leaf_size: 2 });
        grid(&mut world, &mut bvh, 8);
        let region = Aabb::new(Vec3::new(5.0, -1.0, 5.0), Vec3::new(25.0, 1.0, 25.0));

        let mut stale = bvh.query_aabb(&region);
        bvh.rebuild();
        let mut built = bvh.query_aabb(&region);
        stale.sort_by_key(|e| e.to_bits());
        built.sort_by_key(|e| e.to_bits());
        assert_eq!(stale, built);
        // Centers at 10 and 20 on both axes.
        assert_eq!(built.len(), 4);
    }

    #[test]
    fn test_query_frustum() {
        let mut world = hecs::World::new();
        let mut bvh = Bvh::new(BvhConfig::default());
        let entities = grid(&mut world, &mut bvh, 6);
        bvh.rebuild();

        // Looking down from above at the first cell only.
        let view = Mat4::look_at_rh(Vec3::new(0.0, 50.0, 0.0), Vec3::ZERO, Vec3::Z);
        let proj = Mat4::orthographic_rh(-3.0, 3.0, -3.0, 3.0, 0.1, 100.0);
        let frustum = Frustum::from_view_projection(proj * view);
        let found = bvh.query_frustum(&frustum);
        assert_eq!(found, vec![entities[0]]);
    }

    #[test]
    fn test_remove_marks_dirty() {
        let mut world = hecs::World::new();
        let mut bvh = Bvh::new(BvhConfig::default());
        let entities = grid(&mut world, &mut bvh, 2);
        bvh.rebuild();
        assert!(!bvh.is_dirty());
        assert!(bvh.remove(entities[0]));
        assert!(bvh.is_dirty());
        assert!(!bvh.remove(entities[0]));
        let everything = Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0));
        assert_eq!(bvh.query_aabb(&everything).len(), 3);
    }

    #[test]
    fn test_reinserting_same_bounds_keeps_clean() {
        let mut world = hecs::World::new();
        let mut bvh = Bvh::new(BvhConfig::default());
        let e = world.spawn(());
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        bvh.insert(e, b);
        bvh.rebuild();
        bvh.insert(e, b);
        assert!(!bvh.is_dirty());
    }
}
