//! Authoritative group hierarchy: groups, their membership, and the nesting
//! DAG between them.
//!
//! Every group is stored once in a flat id-keyed map. Nesting is expressed
//! by `child_groups` edges. Each group has at most one *owning* parent (whose
//! container holds its proxy) and any number of *sharing* parents that
//! instance the same content. The store keeps three invariants at all times:
//! the edge graph is acyclic, ids are unique, and every referenced handle or
//! id resolves.
//!
//! Local transforms are authoritative. World transforms are derived on
//! demand by composing proxy placements down the owning chain.

mod cycle;
mod group;
mod mutation;
mod persist;

pub use group::{ContainerRef, EntityHandle, Group, GroupId, Member};
pub use persist::{HierarchyDocument, DOCUMENT_VERSION};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{GroupError, Result};
use crate::host::SceneHost;
use crate::transform::{Bounds, Transform};

/// The in-memory group hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    groups: FxHashMap<GroupId, Group>,
    /// Proxy entity -> group it instances.
    proxies: FxHashMap<EntityHandle, GroupId>,
    /// Member entity -> group that directly holds it.
    owners: FxHashMap<EntityHandle, GroupId>,
    next_id: u32,
    /// Monotonically increasing; bumped on any structural mutation.
    generation: u64,
}

impl Hierarchy {
    /// Empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Mutation counter, for hosts that cache derived data.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // -- Lookup --

    /// Read access to a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Like [`Hierarchy::group`] but reports [`GroupError::GroupNotFound`].
    pub fn get(&self, id: GroupId) -> Result<&Group> {
        self.groups.get(&id).ok_or(GroupError::GroupNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: GroupId) -> Result<&mut Group> {
        self.groups.get_mut(&id).ok_or(GroupError::GroupNotFound(id))
    }

    /// Whether a group with this id is live.
    #[must_use]
    pub fn contains(&self, id: GroupId) -> bool {
        self.groups.contains_key(&id)
    }

    /// Number of live groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All groups in id order.
    #[must_use]
    pub fn groups(&self) -> Vec<&Group> {
        let mut all: Vec<_> = self.groups.values().collect();
        all.sort_unstable_by_key(|g| g.id);
        all
    }

    /// Group instanced by a proxy entity.
    #[must_use]
    pub fn group_by_proxy(&self, proxy: EntityHandle) -> Option<GroupId> {
        self.proxies.get(&proxy).copied()
    }

    /// Group that directly holds `handle` as a plain member.
    #[must_use]
    pub fn owner_of(&self, handle: EntityHandle) -> Option<GroupId> {
        self.owners.get(&handle).copied()
    }

    /// Groups that list `id` among their child groups (owning and sharing),
    /// in id order.
    #[must_use]
    pub fn parents_of(&self, id: GroupId) -> Vec<GroupId> {
        let mut parents: Vec<_> = self
            .groups
            .values()
            .filter(|g| g.has_child(id))
            .map(|g| g.id)
            .collect();
        parents.sort_unstable();
        parents
    }

    /// Groups without an owning parent, in id order.
    #[must_use]
    pub fn top_level(&self) -> Vec<GroupId> {
        let mut ids: Vec<_> = self
            .groups
            .values()
            .filter(|g| g.parent.is_none())
            .map(|g| g.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Container a group's proxy lives in: its owning parent's container, or
    /// the scene root.
    pub(crate) fn context_container(
        &self,
        parent: Option<GroupId>,
    ) -> ContainerRef {
        parent
            .and_then(|p| self.groups.get(&p))
            .map_or(ContainerRef::ROOT, |g| g.container)
    }

    // -- Hierarchy levels --

    /// Number of owning ancestors (0 for a top-level group).
    pub fn depth(&self, id: GroupId) -> Result<usize> {
        let mut depth = 0;
        let mut current = self.get(id)?.parent;
        while let Some(p) = current {
            depth += 1;
            current = self.groups.get(&p).and_then(|g| g.parent);
        }
        Ok(depth)
    }

    /// Owning ancestors from the immediate parent up to the top level.
    pub fn ancestors(&self, id: GroupId) -> Result<Vec<GroupId>> {
        let mut chain = Vec::new();
        let mut current = self.get(id)?.parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.groups.get(&p).and_then(|g| g.parent);
        }
        Ok(chain)
    }

    /// Top-level groups first, then nested groups by depth; ties in id order.
    #[must_use]
    pub fn groups_hierarchically(&self) -> Vec<(GroupId, usize)> {
        let mut levels: Vec<_> = self
            .groups
            .keys()
            .map(|&id| (id, self.depth(id).unwrap_or(0)))
            .collect();
        levels.sort_unstable_by_key(|&(id, depth)| (depth, id));
        levels
    }

    // -- Derived transforms --

    /// World transform of a group's origin: the top-level ancestor's proxy
    /// transform (read from the host) composed with each stored proxy
    /// placement down the owning chain.
    pub fn group_world(
        &self,
        host: &impl SceneHost,
        id: GroupId,
    ) -> Result<Transform> {
        let first = self.get(id)?;
        let mut next = first.parent;
        let mut chain = vec![first];
        while let Some(parent) = next {
            let g = self.get(parent)?;
            next = g.parent;
            chain.push(g);
        }
        let Some((top, below)) = chain.split_last() else {
            return Err(GroupError::GroupNotFound(id));
        };
        Ok(below
            .iter()
            .rev()
            .fold(host.world_transform(top.proxy), |world, g| {
                world.mul_transform(&g.local)
            }))
    }

    /// World transform of any entity. Members are derived from their group;
    /// proxies from the group's origin; everything else is asked of the host.
    #[must_use]
    pub fn entity_world(
        &self,
        host: &impl SceneHost,
        handle: EntityHandle,
    ) -> Transform {
        if let Some(id) = self.group_by_proxy(handle) {
            if let Ok(world) = self.group_world(host, id) {
                return world;
            }
        }
        let derived = self.owner_of(handle).and_then(|id| {
            let local = self.groups.get(&id)?.member(handle)?.local;
            let origin = self.group_world(host, id).ok()?;
            Some(origin.mul_transform(&local))
        });
        derived.unwrap_or_else(|| host.world_transform(handle))
    }

    /// Every plain entity reachable from `id` through owned and shared child
    /// groups, with its composed world transform. A group shared at several
    /// places yields its members once per instance.
    pub fn flatten_world(
        &self,
        host: &impl SceneHost,
        id: GroupId,
    ) -> Result<Vec<(EntityHandle, Transform)>> {
        let origin = self.group_world(host, id)?;
        let mut out = Vec::new();
        self.flatten_into(id, &origin, &mut out);
        Ok(out)
    }

    fn flatten_into(
        &self,
        id: GroupId,
        origin: &Transform,
        out: &mut Vec<(EntityHandle, Transform)>,
    ) {
        let Some(group) = self.groups.get(&id) else {
            return;
        };
        out.extend(
            group
                .members
                .iter()
                .map(|m| (m.handle, origin.mul_transform(&m.local))),
        );
        for &child in &group.child_groups {
            if let Some(c) = self.groups.get(&child) {
                let placement = origin.mul_transform(c.placement_in(id));
                self.flatten_into(child, &placement, out);
            }
        }
    }

    /// Bounding box of the world origins of everything [`flatten_world`]
    /// yields. `None` for a group with no content.
    ///
    /// [`flatten_world`]: Hierarchy::flatten_world
    pub fn origin_bounds(
        &self,
        host: &impl SceneHost,
        id: GroupId,
    ) -> Result<Option<Bounds>> {
        let flat = self.flatten_world(host, id)?;
        Ok(Bounds::from_points(flat.iter().map(|(_, t)| t.translation)))
    }

    /// Distinct materials used by a group's members and nested groups, in
    /// first-seen order.
    pub fn group_materials(&self, id: GroupId) -> Result<Vec<String>> {
        let _ = self.get(id)?;
        let mut seen = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(group) = self.groups.get(&current) else {
                continue;
            };
            let materials =
                group.members.iter().flat_map(|m| &m.material_overrides);
            for material in materials {
                if seen.insert(material.as_str()) {
                    out.push(material.clone());
                }
            }
            stack.extend(group.child_groups.iter().rev());
        }
        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use glam::DVec3;

    use super::*;
    use crate::host::MemoryHost;
    use crate::options::StorageMode;

    pub(crate) fn at(x: f64, y: f64, z: f64) -> Transform {
        Transform::from_translation(DVec3::new(x, y, z))
    }

    /// Group `handles` at top level with the default storage mode.
    pub(crate) fn group(
        h: &mut Hierarchy,
        host: &mut MemoryHost,
        handles: &[EntityHandle],
    ) -> GroupId {
        h.create_group(host, handles, None, "g", StorageMode::Collection)
            .unwrap()
    }

    #[test]
    fn depth_and_hierarchical_order() {
        let mut host = MemoryHost::new();
        let mut h = Hierarchy::new();
        let a = host.spawn("a", at(0.0, 0.0, 0.0));
        let b = host.spawn("b", at(1.0, 0.0, 0.0));
        let c = host.spawn("c", at(5.0, 0.0, 0.0));
        let inner = group(&mut h, &mut host, &[a, b]);
        let inner_proxy = h.get(inner).unwrap().proxy();
        let outer = group(&mut h, &mut host, &[inner_proxy, c]);

        assert_eq!(h.depth(outer).unwrap(), 0);
        assert_eq!(h.depth(inner).unwrap(), 1);
        assert_eq!(h.ancestors(inner).unwrap(), vec![outer]);
        assert_eq!(h.groups_hierarchically(), vec![(outer, 0), (inner, 1)]);
        assert_eq!(h.top_level(), vec![outer]);
        assert_eq!(h.parents_of(inner), vec![outer]);
    }

    #[test]
    fn world_of_nested_member_follows_outer_proxy() {
        let mut host = MemoryHost::new();
        let mut h = Hierarchy::new();
        let a = host.spawn("a", at(0.0, 0.0, 0.0));
        let b = host.spawn("b", at(2.0, 0.0, 0.0));
        let inner = group(&mut h, &mut host, &[a, b]);
        let c = host.spawn("c", at(10.0, 0.0, 0.0));
        let inner_proxy = h.get(inner).unwrap().proxy();
        let outer = group(&mut h, &mut host, &[inner_proxy, c]);

        let outer_proxy = h.get(outer).unwrap().proxy();
        let moved =
            host.world_transform(outer_proxy).translation + DVec3::Y * 3.0;
        host.set_world_transform(
            outer_proxy,
            Transform::from_translation(moved),
        );

        let world_b = h.entity_world(&host, b);
        assert!(world_b.abs_diff_eq(&at(2.0, 3.0, 0.0), 1e-9));
        let world_c = h.entity_world(&host, c);
        assert!(world_c.abs_diff_eq(&at(10.0, 3.0, 0.0), 1e-9));
    }

    #[test]
    fn flatten_and_bounds_cover_nested_content() {
        let mut host = MemoryHost::new();
        let mut h = Hierarchy::new();
        let a = host.spawn("a", at(-1.0, 0.0, 0.0));
        let b = host.spawn("b", at(1.0, 2.0, 0.0));
        let inner = group(&mut h, &mut host, &[a, b]);
        let c = host.spawn("c", at(4.0, -1.0, 3.0));
        let inner_proxy = h.get(inner).unwrap().proxy();
        let outer = group(&mut h, &mut host, &[inner_proxy, c]);

        let flat = h.flatten_world(&host, outer).unwrap();
        let handles: Vec<_> = flat.iter().map(|(h, _)| *h).collect();
        assert_eq!(handles, vec![c, a, b]);
        let bounds = h.origin_bounds(&host, outer).unwrap().unwrap();
        assert!(bounds.min.abs_diff_eq(DVec3::new(-1.0, -1.0, 0.0), 1e-9));
        assert!(bounds.max.abs_diff_eq(DVec3::new(4.0, 2.0, 3.0), 1e-9));
    }

    #[test]
    fn unknown_group_is_reported() {
        let host = MemoryHost::new();
        let h = Hierarchy::new();
        assert!(matches!(
            h.group_world(&host, GroupId(7)),
            Err(GroupError::GroupNotFound(GroupId(7)))
        ));
        assert!(matches!(
            h.depth(GroupId(7)),
            Err(GroupError::GroupNotFound(_))
        ));
    }
}
