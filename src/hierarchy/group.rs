use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of a group, unique among live groups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct GroupId(pub u32);

/// Host-owned identity of a scene entity (plain object or group proxy).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct EntityHandle(pub u64);

/// Host-owned identity of a container (the content set a proxy instances).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ContainerRef(pub u64);

impl ContainerRef {
    /// The host's top-level scene content, where ungrouped entities live.
    pub const ROOT: Self = Self(0);

    /// Whether this is the top-level scene content.
    #[must_use]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "scene root")
        } else {
            write!(f, "container {}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

/// A plain entity held directly by a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// The entity.
    pub handle: EntityHandle,
    /// Placement relative to the owning group's origin.
    pub local: Transform,
    /// Per-instance material overrides, in the order they were added.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub material_overrides: Vec<String>,
}

impl Member {
    /// New member with no material overrides.
    #[must_use]
    pub fn new(handle: EntityHandle, local: Transform) -> Self {
        Self {
            handle,
            local,
            material_overrides: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A named, instanced container of entities and nested groups.
///
/// Content is stored once. Every place the group appears (its owning parent
/// plus any sharing parents) instances the same members, so editing the
/// group once changes every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) name: String,
    pub(crate) proxy: EntityHandle,
    pub(crate) container: ContainerRef,
    pub(crate) members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) child_groups: Vec<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<GroupId>,
    /// Proxy placement relative to the owning parent's origin. Unused for
    /// top-level groups, whose proxy transform is read from the host.
    #[serde(default)]
    pub(crate) local: Transform,
    /// Placement inside each sharing parent, relative to that parent's
    /// origin. Fixed when the sharing edge is made; moving the owner does
    /// not shift the shared instances.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) shared: BTreeMap<GroupId, Transform>,
}

impl Group {
    /// Group identifier.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity instancing this group in its parent context.
    #[must_use]
    pub fn proxy(&self) -> EntityHandle {
        self.proxy
    }

    /// Container the proxy instances.
    #[must_use]
    pub fn container(&self) -> ContainerRef {
        self.container
    }

    /// Direct plain-entity members, in insertion order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Direct nested groups (owned and shared), in insertion order.
    #[must_use]
    pub fn child_groups(&self) -> &[GroupId] {
        &self.child_groups
    }

    /// Owning parent group, `None` at top level.
    #[must_use]
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Proxy placement relative to the owning parent's origin.
    #[must_use]
    pub fn local(&self) -> &Transform {
        &self.local
    }

    /// Placement of this group's instance inside `parent`: the sharing
    /// placement if `parent` shares it, the owned placement otherwise.
    #[must_use]
    pub fn placement_in(&self, parent: GroupId) -> &Transform {
        self.shared.get(&parent).unwrap_or(&self.local)
    }

    /// Direct member by handle.
    #[must_use]
    pub fn member(&self, handle: EntityHandle) -> Option<&Member> {
        self.members.iter().find(|m| m.handle == handle)
    }

    /// Whether `handle` is a direct member.
    #[must_use]
    pub fn has_member(&self, handle: EntityHandle) -> bool {
        self.member(handle).is_some()
    }

    /// Whether `child` is a direct nested group.
    #[must_use]
    pub fn has_child(&self, child: GroupId) -> bool {
        self.child_groups.contains(&child)
    }

    /// Handles shown when this group is opened: direct members followed by
    /// the proxies of direct child groups (resolved by `proxy_of`).
    pub(crate) fn isolation_set(
        &self,
        proxy_of: impl Fn(GroupId) -> Option<EntityHandle>,
    ) -> Vec<EntityHandle> {
        self.members
            .iter()
            .map(|m| m.handle)
            .chain(self.child_groups.iter().filter_map(|&c| proxy_of(c)))
            .collect()
    }

    pub(crate) fn member_mut(
        &mut self,
        handle: EntityHandle,
    ) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.handle == handle)
    }

    pub(crate) fn take_member(
        &mut self,
        handle: EntityHandle,
    ) -> Option<Member> {
        let idx = self.members.iter().position(|m| m.handle == handle)?;
        Some(self.members.remove(idx))
    }

    pub(crate) fn add_child(&mut self, child: GroupId) {
        if !self.child_groups.contains(&child) {
            self.child_groups.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: GroupId) {
        self.child_groups.retain(|&c| c != child);
    }
}
