//! Read-only views that combine the hierarchy with host state.

use super::GroupEngine;
use crate::error::Result;
use crate::hierarchy::{EntityHandle, Group, GroupId};
use crate::host::SceneHost;
use crate::transform::{Bounds, Transform};

impl<H: SceneHost> GroupEngine<H> {
    /// Group record by id.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.hierarchy.group(id)
    }

    /// Group instanced by a selected proxy.
    #[must_use]
    pub fn group_by_proxy(&self, proxy: EntityHandle) -> Option<GroupId> {
        self.hierarchy.group_by_proxy(proxy)
    }

    /// World transform of a group's origin.
    pub fn group_world(&self, id: GroupId) -> Result<Transform> {
        self.hierarchy.group_world(&self.host, id)
    }

    /// World transform of any entity, derived through its group if it has
    /// one.
    #[must_use]
    pub fn entity_world(&self, handle: EntityHandle) -> Transform {
        self.hierarchy.entity_world(&self.host, handle)
    }

    /// Every entity reachable from a group, with its world transform.
    pub fn flatten_world(
        &self,
        id: GroupId,
    ) -> Result<Vec<(EntityHandle, Transform)>> {
        self.hierarchy.flatten_world(&self.host, id)
    }

    /// Box around the world origins of everything in a group.
    pub fn origin_bounds(&self, id: GroupId) -> Result<Option<Bounds>> {
        self.hierarchy.origin_bounds(&self.host, id)
    }

    /// Handles the viewport currently isolates, `None` outside edit mode.
    #[must_use]
    pub fn isolated(&self) -> Option<&[EntityHandle]> {
        self.navigator.top().map(|f| f.isolated.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use crate::engine::tests::engine_with;
    use crate::hierarchy::tests::at;
    use crate::host::SceneHost;

    #[test]
    fn queries_follow_proxy_moves() {
        let (mut engine, e) = engine_with(&[0.0, 2.0]);
        let g = engine.create_group(&e, None).unwrap();
        let proxy = engine.group(g).unwrap().proxy();
        assert_eq!(engine.group_by_proxy(proxy), Some(g));
        assert_eq!(engine.group_by_proxy(e[0]), None);

        engine.host_mut().set_world_transform(proxy, at(1.0, 0.0, 3.0));
        assert!(engine
            .group_world(g)
            .unwrap()
            .abs_diff_eq(&at(1.0, 0.0, 3.0), 1e-12));
        assert!(engine
            .entity_world(e[1])
            .abs_diff_eq(&at(2.0, 0.0, 3.0), 1e-12));
        let flat = engine.flatten_world(g).unwrap();
        assert_eq!(flat.len(), 2);
        let bounds = engine.origin_bounds(g).unwrap().unwrap();
        assert!(bounds.center().abs_diff_eq(DVec3::new(1.0, 0.0, 3.0), 1e-12));
        assert_eq!(engine.isolated(), None);
        engine.enter_edit(g).unwrap();
        assert_eq!(engine.isolated(), Some(&e[..]));
    }
}
