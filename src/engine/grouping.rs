//! Structural group operations: create, ungroup, extract, nest, materials
//! and naming.

use rustc_hash::FxHashSet;

use super::GroupEngine;
use crate::error::Result;
use crate::hierarchy::{EntityHandle, GroupId};
use crate::host::SceneHost;

impl<H: SceneHost> GroupEngine<H> {
    /// Group the selected entities inside the open edit context (or at top
    /// level when nothing is open).
    ///
    /// A blank or missing `name` is resolved through the naming options.
    pub fn create_group(
        &mut self,
        handles: &[EntityHandle],
        name: Option<&str>,
    ) -> Result<GroupId> {
        let last_selected =
            handles.last().and_then(|&h| self.host.entity_name(h));
        let name = self.options.naming.resolve(name, last_selected);
        let mode = self.options.storage.mode;
        let id = self.mutate(|engine| {
            let context = engine.navigator.current_group();
            engine.hierarchy.create_group(
                &mut engine.host,
                handles,
                context,
                &name,
                mode,
            )
        })?;
        log::info!("grouped {} entities as '{name}' ({id})", handles.len());
        Ok(id)
    }

    /// Ungroup one group. Fails with `ActiveEditContext` if the group or
    /// anything below it is open.
    pub fn dissolve_group(
        &mut self,
        id: GroupId,
    ) -> Result<Vec<EntityHandle>> {
        let _ = self.hierarchy.get(id)?;
        self.navigator.ensure_closed(&self.hierarchy, id)?;
        let freed = self.mutate(|engine| {
            engine.hierarchy.dissolve_group(&mut engine.host, id)
        })?;
        log::info!("ungrouped {id}, {} entities freed", freed.len());
        Ok(freed)
    }

    /// Ungroup several groups at once.
    ///
    /// Every id is validated before anything is dissolved. Groups are then
    /// dissolved deepest first so that a selection of nested groups flattens
    /// all the way out. Returns every freed handle once, in the order it was
    /// first freed.
    pub fn dissolve_groups(
        &mut self,
        ids: &[GroupId],
    ) -> Result<Vec<EntityHandle>> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::with_capacity(ids.len());
        for &id in ids.iter().filter(|&&id| seen.insert(id)) {
            let depth = self.hierarchy.depth(id)?;
            self.navigator.ensure_closed(&self.hierarchy, id)?;
            order.push((depth, id));
        }
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let freed = self.mutate(|engine| {
            let mut freed = Vec::new();
            let mut unique = FxHashSet::default();
            for (_, id) in order {
                let handles =
                    engine.hierarchy.dissolve_group(&mut engine.host, id)?;
                freed.extend(handles.into_iter().filter(|&h| unique.insert(h)));
            }
            Ok(freed)
        })?;
        log::info!(
            "ungrouped {} groups, {} entities freed",
            seen.len(),
            freed.len()
        );
        Ok(freed)
    }

    /// Move some direct members of a group out to the group's parent
    /// context.
    pub fn extract_members(
        &mut self,
        id: GroupId,
        handles: &[EntityHandle],
    ) -> Result<()> {
        self.mutate(|engine| {
            engine
                .hierarchy
                .extract_members(&mut engine.host, id, handles)
        })
    }

    /// Nest `child` inside `parent`, moving it if it is top-level and
    /// sharing it otherwise. A move is refused while the child (or anything
    /// below it) is open.
    pub fn nest_group(
        &mut self,
        parent: GroupId,
        child: GroupId,
    ) -> Result<()> {
        if self.hierarchy.get(child)?.parent().is_none() {
            self.navigator.ensure_closed(&self.hierarchy, child)?;
        }
        self.mutate(|engine| {
            engine.hierarchy.nest_group(&mut engine.host, parent, child)
        })
    }

    /// Move a group under a new owning parent, or to the top level. An open
    /// group (or an ancestor of one) cannot be moved.
    pub fn reparent_group(
        &mut self,
        child: GroupId,
        parent: Option<GroupId>,
    ) -> Result<()> {
        let _ = self.hierarchy.get(child)?;
        self.navigator.ensure_closed(&self.hierarchy, child)?;
        self.mutate(|engine| {
            engine
                .hierarchy
                .reparent_group(&mut engine.host, child, parent)
        })
    }

    /// Record a per-instance material override on a direct member.
    pub fn add_material_override(
        &mut self,
        id: GroupId,
        handle: EntityHandle,
        material: &str,
    ) -> Result<()> {
        self.hierarchy
            .add_material_override(&mut self.host, id, handle, material)?;
        log::debug!("material '{material}' on {handle} in {id}");
        Ok(())
    }

    /// Rename a group; a blank name falls back to the default name. Returns
    /// the previous name.
    pub fn rename_group(&mut self, id: GroupId, name: &str) -> Result<String> {
        let name = self.options.naming.resolve(Some(name), None);
        let previous = self.hierarchy.rename_group(&mut self.host, id, &name)?;
        log::info!("renamed {id} from '{previous}' to '{name}'");
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::engine_with;
    use crate::error::GroupError;
    use crate::hierarchy::tests::at;
    use crate::options::{Options, StorageMode};
    use crate::transform::DEFAULT_TOLERANCE;

    #[test]
    fn create_names_after_last_selected() {
        let (mut engine, e) = engine_with(&[0.0, 2.0]);
        let id = engine.create_group(&e, None).unwrap();
        assert_eq!(engine.hierarchy().get(id).unwrap().name(), "e1");
        let id = engine.create_group(&[e[0]], Some("base")).unwrap();
        assert_eq!(engine.hierarchy().get(id).unwrap().name(), "base");
    }

    #[test]
    fn storage_mode_reaches_the_host() {
        let (mut engine, e) = engine_with(&[0.0]);
        let mut options = Options::default();
        options.storage.mode = StorageMode::SeparateScene;
        engine.set_options(options);
        let id = engine.create_group(&e, None).unwrap();
        let container = engine.hierarchy().get(id).unwrap().container();
        assert_eq!(
            engine.host().container_mode(container),
            Some(StorageMode::SeparateScene)
        );
    }

    #[test]
    fn create_inside_edit_context_nests_and_marks_dirty() {
        let (mut engine, e) = engine_with(&[0.0, 2.0, 4.0]);
        let outer = engine.create_group(&e, None).unwrap();
        engine.enter_edit(outer).unwrap();
        let inner = engine.create_group(&e[..2], None).unwrap();

        let h = engine.hierarchy();
        assert_eq!(h.get(inner).unwrap().parent(), Some(outer));
        assert_eq!(h.get(outer).unwrap().child_groups(), &[inner]);
        assert_eq!(h.get(outer).unwrap().members().len(), 1);
        assert!(engine.navigator().top().unwrap().dirty);
        let inner_proxy = h.get(inner).unwrap().proxy();
        assert_eq!(engine.host().isolation(), Some(&[e[2], inner_proxy][..]));

        let _ = engine.exit_edit().unwrap();
        assert!(engine
            .hierarchy()
            .entity_world(engine.host(), e[1])
            .abs_diff_eq(&at(2.0, 0.0, 0.0), DEFAULT_TOLERANCE));
    }

    #[test]
    fn open_group_cannot_be_dissolved() {
        let (mut engine, e) = engine_with(&[0.0, 2.0]);
        let inner = engine.create_group(&e, None).unwrap();
        let inner_proxy = engine.hierarchy().get(inner).unwrap().proxy();
        let outer = engine.create_group(&[inner_proxy], None).unwrap();
        engine.enter_edit(outer).unwrap();
        engine.enter_edit(inner).unwrap();

        assert!(matches!(
            engine.dissolve_group(inner),
            Err(GroupError::ActiveEditContext(id)) if id == inner
        ));
        assert!(matches!(
            engine.dissolve_group(outer),
            Err(GroupError::ActiveEditContext(id)) if id == outer
        ));
        assert_eq!(engine.hierarchy().len(), 2);

        let _ = engine.exit_all().unwrap();
        assert_eq!(engine.dissolve_group(outer).unwrap(), vec![inner_proxy]);
    }

    #[test]
    fn batch_dissolve_flattens_nested_selection() {
        let (mut engine, e) = engine_with(&[0.0, 2.0, 7.0]);
        let inner = engine.create_group(&e[..2], None).unwrap();
        let inner_proxy = engine.hierarchy().get(inner).unwrap().proxy();
        let outer = engine.create_group(&[inner_proxy, e[2]], None).unwrap();

        let freed = engine.dissolve_groups(&[outer, inner, outer]).unwrap();

        assert_eq!(freed, vec![e[0], e[1], e[2]]);
        assert!(engine.hierarchy().is_empty());
        for (handle, x) in e.iter().zip([0.0, 2.0, 7.0]) {
            assert!(engine
                .host()
                .world_transform(*handle)
                .abs_diff_eq(&at(x, 0.0, 0.0), DEFAULT_TOLERANCE));
        }
    }

    #[test]
    fn batch_dissolve_validates_everything_first() {
        let (mut engine, e) = engine_with(&[0.0]);
        let g = engine.create_group(&e, None).unwrap();
        assert!(matches!(
            engine.dissolve_groups(&[g, GroupId(99)]),
            Err(GroupError::GroupNotFound(GroupId(99)))
        ));
        assert!(engine.hierarchy().contains(g));
    }

    #[test]
    fn rename_blank_falls_back_to_default() {
        let (mut engine, e) = engine_with(&[0.0]);
        let g = engine.create_group(&e, Some("crate")).unwrap();
        assert_eq!(engine.rename_group(g, "   ").unwrap(), "crate");
        assert_eq!(engine.hierarchy().get(g).unwrap().name(), "group");
        assert!(matches!(
            engine.rename_group(GroupId(5), "x"),
            Err(GroupError::GroupNotFound(_))
        ));
    }

    #[test]
    fn open_group_cannot_be_reparented() {
        let (mut engine, e) = engine_with(&[0.0, 1.0]);
        let a = engine.create_group(&e[..1], None).unwrap();
        let b = engine.create_group(&e[1..], None).unwrap();
        engine.enter_edit(a).unwrap();
        assert!(matches!(
            engine.reparent_group(a, Some(b)),
            Err(GroupError::ActiveEditContext(_))
        ));
        let _ = engine.exit_edit().unwrap();
        engine.reparent_group(a, Some(b)).unwrap();
        assert_eq!(engine.hierarchy().get(a).unwrap().parent(), Some(b));
    }

    #[test]
    fn failed_create_while_editing_leaves_store_untouched() {
        let (mut engine, e) = engine_with(&[0.0, 2.0]);
        let g = engine.create_group(&e, None).unwrap();
        engine.enter_edit(g).unwrap();
        engine.host_mut().set_world_transform(e[0], at(0.0, 4.0, 0.0));
        let before = engine.hierarchy().to_document();

        assert!(matches!(
            engine.create_group(&[], None),
            Err(GroupError::EmptySelection)
        ));
        assert_eq!(engine.hierarchy().to_document(), before);
        assert!(!engine.navigator().top().unwrap().dirty);

        // The pending edit is still picked up once the group is closed.
        let _ = engine.exit_edit().unwrap();
        assert!(engine
            .entity_world(e[0])
            .abs_diff_eq(&at(0.0, 4.0, 0.0), DEFAULT_TOLERANCE));
    }

    #[test]
    fn selecting_an_open_ancestor_is_cyclic() {
        let (mut engine, e) = engine_with(&[0.0, 2.0, 5.0]);
        let inner = engine.create_group(&e[..2], None).unwrap();
        let inner_proxy = engine.hierarchy().get(inner).unwrap().proxy();
        let outer = engine.create_group(&[inner_proxy, e[2]], None).unwrap();
        let outer_proxy = engine.hierarchy().get(outer).unwrap().proxy();
        engine.enter_edit(outer).unwrap();
        engine.enter_edit(inner).unwrap();
        let before = engine.hierarchy().to_document();

        assert!(matches!(
            engine.create_group(&[outer_proxy], None),
            Err(GroupError::CyclicNesting { parent, child })
                if parent == inner && child == outer
        ));
        assert_eq!(engine.hierarchy().to_document(), before);
        assert_eq!(engine.breadcrumb(), vec![outer, inner]);
    }

    #[test]
    fn open_group_cannot_be_nested_by_move() {
        let (mut engine, e) = engine_with(&[0.0, 1.0]);
        let a = engine.create_group(&e[..1], None).unwrap();
        let b = engine.create_group(&e[1..], None).unwrap();
        engine.enter_edit(a).unwrap();

        assert!(matches!(
            engine.nest_group(b, a),
            Err(GroupError::ActiveEditContext(id)) if id == a
        ));
        assert_eq!(engine.hierarchy().get(a).unwrap().parent(), None);
        assert!(engine.hierarchy().get(b).unwrap().child_groups().is_empty());

        let _ = engine.exit_edit().unwrap();
        engine.nest_group(b, a).unwrap();
        assert_eq!(engine.hierarchy().get(a).unwrap().parent(), Some(b));
    }
}
