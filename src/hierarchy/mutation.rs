//! Hierarchy mutations.
//!
//! Each operation validates everything it needs first and only then starts
//! writing, so an `Err` leaves both the store and the host untouched.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use super::{ContainerRef, EntityHandle, Group, GroupId, Hierarchy, Member};
use crate::error::{GroupError, Result};
use crate::host::SceneHost;
use crate::options::StorageMode;
use crate::transform::{self, Transform};

/// A create-group selection split into plain entities and existing groups.
struct Selection {
    entities: Vec<EntityHandle>,
    groups: Vec<GroupId>,
    /// World transform of every selected item, in selection order.
    worlds: Vec<Transform>,
}

impl Hierarchy {
    // -- Create --

    /// Collapse `handles` into a new group created inside `context` (the
    /// group open for editing, or `None` for the top level).
    ///
    /// Selected proxies of existing groups become nested child groups of the
    /// new group; everything else becomes a plain member. World placement of
    /// every selected item is preserved.
    pub fn create_group(
        &mut self,
        host: &mut impl SceneHost,
        handles: &[EntityHandle],
        context: Option<GroupId>,
        name: &str,
        mode: StorageMode,
    ) -> Result<GroupId> {
        let selection = self.validate_selection(host, handles, context)?;
        let origin = transform::group_origin(&selection.worlds)
            .ok_or(GroupError::EmptySelection)?;

        let id = GroupId(self.next_id);
        self.next_id += 1;
        let container = host.allocate_container(name, mode);
        let proxy = host.bind_proxy(container, name);
        host.set_world_transform(proxy, origin);
        host.move_into_container(proxy, self.context_container(context));

        let mut worlds = selection.worlds.iter();
        let mut members = Vec::with_capacity(selection.entities.len());
        for &handle in &selection.entities {
            let world = worlds.next().copied().unwrap_or_default();
            let previous = self.detach_member(handle);
            host.remove_from_container(handle, previous);
            host.move_into_container(handle, container);
            let local = transform::to_local(&world, &origin);
            members.push(Member::new(handle, local));
            let _ = self.owners.insert(handle, id);
        }

        for &child in &selection.groups {
            let world = worlds.next().copied().unwrap_or_default();
            let Some(c) = self.groups.get_mut(&child) else {
                continue;
            };
            c.local = transform::to_local(&world, &origin);
            let (proxy_handle, previous) = (c.proxy, c.parent.replace(id));
            if let Some(p) = previous.and_then(|p| self.groups.get_mut(&p)) {
                p.remove_child(child);
            }
            let from = self.context_container(previous);
            host.remove_from_container(proxy_handle, from);
            host.move_into_container(proxy_handle, container);
        }

        let local = match context {
            Some(c) => {
                transform::to_local(&origin, &self.group_world(host, c)?)
            }
            None => Transform::IDENTITY,
        };
        if let Some(parent) = context.and_then(|c| self.groups.get_mut(&c)) {
            parent.add_child(id);
        }
        let _ = self.proxies.insert(proxy, id);
        let _ = self.groups.insert(
            id,
            Group {
                id,
                name: name.to_owned(),
                proxy,
                container,
                members,
                child_groups: selection.groups,
                parent: context,
                local,
                shared: BTreeMap::new(),
            },
        );
        self.invalidate();
        log::debug!(
            "created group {id} '{name}' in {} with {} members",
            self.context_container(context),
            handles.len()
        );
        Ok(id)
    }

    fn validate_selection(
        &self,
        host: &impl SceneHost,
        handles: &[EntityHandle],
        context: Option<GroupId>,
    ) -> Result<Selection> {
        if handles.is_empty() {
            return Err(GroupError::EmptySelection);
        }
        if let Some(c) = context {
            let _ = self.get(c)?;
        }

        let mut seen = FxHashSet::default();
        let mut entity_worlds = Vec::new();
        let mut group_worlds = Vec::new();
        let mut selection = Selection {
            entities: Vec::new(),
            groups: Vec::new(),
            worlds: Vec::new(),
        };
        for &handle in handles.iter().filter(|&&h| seen.insert(h)) {
            if let Some(child) = self.group_by_proxy(handle) {
                if let Some(c) = context {
                    if self.would_create_cycle(c, child) {
                        return Err(GroupError::CyclicNesting {
                            parent: c,
                            child,
                        });
                    }
                }
                group_worlds.push(self.group_world(host, child)?);
                selection.groups.push(child);
            } else {
                entity_worlds.push(self.entity_world(host, handle));
                selection.entities.push(handle);
            }
        }

        // An entity already inside the content of a selected group would end
        // up instanced inside itself.
        for &handle in &selection.entities {
            let Some(owner) = self.owner_of(handle) else {
                continue;
            };
            for &child in &selection.groups {
                if child == owner || self.is_descendant(child, owner) {
                    return Err(GroupError::AlreadyGrouped {
                        handle,
                        group: child,
                    });
                }
            }
        }

        selection.worlds = entity_worlds;
        selection.worlds.extend(group_worlds);
        Ok(selection)
    }

    /// Remove `handle` from whichever group holds it. Returns the container
    /// it was linked into.
    fn detach_member(&mut self, handle: EntityHandle) -> ContainerRef {
        let Some(owner) = self.owners.remove(&handle) else {
            return ContainerRef::ROOT;
        };
        match self.groups.get_mut(&owner) {
            Some(g) => {
                let _ = g.take_member(handle);
                g.container
            }
            None => ContainerRef::ROOT,
        }
    }

    // -- Dissolve / extract --

    /// Dissolve a group, flattening its content one level up.
    ///
    /// Direct members get their world transforms written back and move into
    /// the group's former parent context. Owned child groups are re-parented
    /// one level up with their own content untouched. Shared child groups
    /// stay shared by the former parent (dropped at top level). Returns the
    /// freed member handles followed by the freed child-group proxies.
    pub fn dissolve_group(
        &mut self,
        host: &mut impl SceneHost,
        id: GroupId,
    ) -> Result<Vec<EntityHandle>> {
        let group = self.get(id)?.clone();
        let origin = self.group_world(host, id)?;
        let parent = group.parent;
        let target = self.context_container(parent);
        let parent_world = match parent {
            Some(p) => Some(self.group_world(host, p)?),
            None => None,
        };

        let mut freed = Vec::with_capacity(group.members.len());
        for member in &group.members {
            let world = origin.mul_transform(&member.local);
            self.release_member(
                host,
                member.handle,
                world,
                &group,
                parent,
                parent_world.as_ref(),
            );
            freed.push(member.handle);
        }

        for &child in &group.child_groups {
            let Some(c) = self.groups.get(&child) else {
                continue;
            };
            if c.parent == Some(id) {
                let world = origin.mul_transform(&c.local);
                let proxy = c.proxy;
                host.set_world_transform(proxy, world);
                host.remove_from_container(proxy, group.container);
                host.move_into_container(proxy, target);
                if let Some(c) = self.groups.get_mut(&child) {
                    c.parent = parent;
                    // Top-level groups are placed by their proxy alone.
                    if let Some(pw) = &parent_world {
                        c.local = transform::to_local(&world, pw);
                    }
                    if let Some(p) = parent {
                        let _ = c.shared.remove(&p);
                    }
                }
                if let Some(p) = parent.and_then(|p| self.groups.get_mut(&p)) {
                    p.add_child(child);
                }
                freed.push(proxy);
            } else if let Some(p) = parent {
                // The shared instance keeps its world placement inside the
                // former parent.
                let placement = group.local.mul_transform(c.placement_in(id));
                let owned_by_p = c.parent == Some(p);
                if let Some(pg) = self.groups.get_mut(&p) {
                    pg.add_child(child);
                }
                if !owned_by_p {
                    if let Some(c) = self.groups.get_mut(&child) {
                        let _ = c.shared.entry(p).or_insert(placement);
                    }
                }
            } else {
                log::warn!(
                    "dropping shared instance of group {child} held by \
                     dissolved top-level group {id}"
                );
            }
        }

        for g in self.groups.values_mut() {
            g.remove_child(id);
            let _ = g.shared.remove(&id);
        }
        let _ = self.proxies.remove(&group.proxy);
        let _ = self.groups.remove(&id);
        host.remove_from_container(group.proxy, target);
        host.delete_proxy(group.proxy);
        host.release_container(group.container);
        self.invalidate();
        log::debug!("dissolved group {id}, freed {} entities", freed.len());
        Ok(freed)
    }

    /// Move a subset of a group's direct members out to the group's parent
    /// context. The group itself stays, even if left empty.
    pub fn extract_members(
        &mut self,
        host: &mut impl SceneHost,
        id: GroupId,
        handles: &[EntityHandle],
    ) -> Result<()> {
        let group = self.get(id)?;
        if let Some(&handle) = handles.iter().find(|&&h| !group.has_member(h)) {
            return Err(GroupError::NotAMember { group: id, handle });
        }
        let group = group.clone();
        let origin = self.group_world(host, id)?;
        let parent_world = match group.parent {
            Some(p) => Some(self.group_world(host, p)?),
            None => None,
        };

        let mut seen = FxHashSet::default();
        for &handle in handles.iter().filter(|&&h| seen.insert(h)) {
            let Some(member) = self
                .groups
                .get_mut(&id)
                .and_then(|g| g.take_member(handle))
            else {
                continue;
            };
            let world = origin.mul_transform(&member.local);
            self.release_member(
                host,
                handle,
                world,
                &group,
                group.parent,
                parent_world.as_ref(),
            );
        }
        self.invalidate();
        log::debug!("extracted {} members from group {id}", seen.len());
        Ok(())
    }

    /// Place a member of `from` at `world` inside `parent`'s context.
    fn release_member(
        &mut self,
        host: &mut impl SceneHost,
        handle: EntityHandle,
        world: Transform,
        from: &Group,
        parent: Option<GroupId>,
        parent_world: Option<&Transform>,
    ) {
        host.set_world_transform(handle, world);
        host.remove_from_container(handle, from.container);
        host.move_into_container(handle, self.context_container(parent));
        let new_owner = parent.zip(parent_world).and_then(|(p, pw)| {
            let g = self.groups.get_mut(&p)?;
            g.members
                .push(Member::new(handle, transform::to_local(&world, pw)));
            Some(p)
        });
        match new_owner {
            Some(p) => {
                let _ = self.owners.insert(handle, p);
            }
            None => {
                let _ = self.owners.remove(&handle);
            }
        }
    }

    // -- Nesting --

    /// Nest `child` inside `parent`.
    ///
    /// A top-level child is moved: its proxy goes into the parent's
    /// container and its world placement is preserved. A child that already
    /// has an owner is *shared*: the parent gains an edge to the same
    /// content, nothing is copied.
    pub fn nest_group(
        &mut self,
        host: &mut impl SceneHost,
        parent: GroupId,
        child: GroupId,
    ) -> Result<()> {
        let _ = self.get(parent)?;
        let child_group = self.get(child)?;
        if self.would_create_cycle(parent, child) {
            return Err(GroupError::CyclicNesting { parent, child });
        }
        let (owner, placement) = (child_group.parent, child_group.local);
        match owner {
            None => return self.reparent_group(host, child, Some(parent)),
            Some(o) if o == parent => return Ok(()),
            Some(_) => {}
        }
        self.get_mut(parent)?.add_child(child);
        let _ = self.get_mut(child)?.shared.entry(parent).or_insert(placement);
        self.invalidate();
        log::debug!("group {parent} now shares group {child}");
        Ok(())
    }

    /// Move `child`'s owning edge to `new_parent` (or the top level),
    /// preserving its world placement. A sharing edge from `new_parent`, if
    /// any, becomes the owning edge.
    pub fn reparent_group(
        &mut self,
        host: &mut impl SceneHost,
        child: GroupId,
        new_parent: Option<GroupId>,
    ) -> Result<()> {
        let old_parent = self.get(child)?.parent;
        let parent_world = match new_parent {
            Some(p) => {
                let _ = self.get(p)?;
                if self.would_create_cycle(p, child) {
                    return Err(GroupError::CyclicNesting { parent: p, child });
                }
                Some(self.group_world(host, p)?)
            }
            None => None,
        };
        if old_parent == new_parent {
            return Ok(());
        }

        let world = self.group_world(host, child)?;
        if let Some(p) = old_parent.and_then(|p| self.groups.get_mut(&p)) {
            p.remove_child(child);
        }
        if let Some(p) = new_parent.and_then(|p| self.groups.get_mut(&p)) {
            p.add_child(child);
        }
        let from = self.context_container(old_parent);
        let to = self.context_container(new_parent);
        let proxy = self.get_mut(child).map(|c| {
            c.parent = new_parent;
            if let Some(pw) = &parent_world {
                c.local = transform::to_local(&world, pw);
            }
            if let Some(p) = new_parent {
                let _ = c.shared.remove(&p);
            }
            c.proxy
        })?;
        host.set_world_transform(proxy, world);
        host.remove_from_container(proxy, from);
        host.move_into_container(proxy, to);
        self.invalidate();
        log::debug!("moved group {child} from {from} to {to}");
        Ok(())
    }

    // -- Metadata --

    /// Record a per-instance material override for a direct member.
    pub fn add_material_override(
        &mut self,
        host: &mut impl SceneHost,
        id: GroupId,
        handle: EntityHandle,
        material: &str,
    ) -> Result<()> {
        let group = self.get_mut(id)?;
        let container = group.container;
        let member = group
            .member_mut(handle)
            .ok_or(GroupError::NotAMember { group: id, handle })?;
        if !member.material_overrides.iter().any(|m| m == material) {
            member.material_overrides.push(material.to_owned());
        }
        host.set_material_override(handle, container, material);
        Ok(())
    }

    /// Change a group's display name.
    pub fn rename_group(
        &mut self,
        host: &mut impl SceneHost,
        id: GroupId,
        name: &str,
    ) -> Result<String> {
        let group = self.get_mut(id)?;
        let old = std::mem::replace(&mut group.name, name.to_owned());
        host.rename_group(group.proxy, group.container, name);
        Ok(old)
    }

    // -- Edit-time transform sync --

    /// Write the derived world transform of every direct member and owned
    /// child proxy to the host, so the group can be edited in place.
    pub fn materialize(
        &self,
        host: &mut impl SceneHost,
        id: GroupId,
    ) -> Result<()> {
        let origin = self.group_world(host, id)?;
        let group = self.get(id)?;
        for member in &group.members {
            let world = origin.mul_transform(&member.local);
            host.set_world_transform(member.handle, world);
        }
        for c in self.owned_children(group) {
            host.set_world_transform(c.proxy, origin.mul_transform(&c.local));
        }
        Ok(())
    }

    /// Read host-side edits of direct members and owned child proxies back
    /// into local transforms. Changes within `tolerance` are ignored.
    /// Returns how many locals changed.
    pub fn capture_edits(
        &mut self,
        host: &impl SceneHost,
        id: GroupId,
        tolerance: f64,
    ) -> Result<usize> {
        let origin = self.group_world(host, id)?;
        let group = self.get(id)?;
        let member_locals: Vec<_> = group
            .members
            .iter()
            .map(|m| {
                transform::to_local(&host.world_transform(m.handle), &origin)
            })
            .collect();
        let child_locals: Vec<_> = self
            .owned_children(group)
            .map(|c| {
                let world = host.world_transform(c.proxy);
                (c.id, transform::to_local(&world, &origin))
            })
            .collect();

        let mut changed = 0;
        if let Some(group) = self.groups.get_mut(&id) {
            for (member, local) in group.members.iter_mut().zip(member_locals) {
                if !member.local.abs_diff_eq(&local, tolerance) {
                    member.local = local;
                    changed += 1;
                }
            }
        }
        for (child, local) in child_locals {
            if let Some(c) = self.groups.get_mut(&child) {
                if !c.local.abs_diff_eq(&local, tolerance) {
                    c.local = local;
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            log::debug!("captured {changed} edited transforms in group {id}");
        }
        Ok(changed)
    }

    /// Full recheck after membership changed while `id` was open: relink
    /// every direct member and owned child proxy into the group's container,
    /// then capture transforms.
    pub fn reconcile(
        &mut self,
        host: &mut impl SceneHost,
        id: GroupId,
        tolerance: f64,
    ) -> Result<usize> {
        let group = self.get(id)?;
        let container = group.container;
        let handles: Vec<_> = group
            .members
            .iter()
            .map(|m| m.handle)
            .chain(self.owned_children(group).map(|c| c.proxy))
            .collect();
        for handle in handles {
            host.move_into_container(handle, container);
        }
        self.capture_edits(host, id, tolerance)
    }

    fn owned_children<'a>(
        &'a self,
        group: &'a Group,
    ) -> impl Iterator<Item = &'a Group> + 'a {
        group
            .child_groups
            .iter()
            .filter_map(|c| self.groups.get(c))
            .filter(move |c| c.parent == Some(group.id))
    }
}
