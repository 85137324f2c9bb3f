//! Edit-context navigation: the breadcrumb stack of groups opened for
//! in-place editing.
//!
//! The navigator is either closed (empty stack) or editing at some depth.
//! Entering pushes a frame and isolates the group's direct content; exiting
//! pops it and restores whatever the frame below was showing (or the full
//! scene). Navigation follows the hierarchy: a new frame must open a group
//! nested somewhere below the current top.

use crate::error::{GroupError, Result};
use crate::hierarchy::{EntityHandle, GroupId, Hierarchy};
use crate::host::SceneHost;

/// One open group on the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFrame {
    /// The open group.
    pub group: GroupId,
    /// Handles isolated while this frame is on top: direct members followed
    /// by the proxies of direct child groups.
    pub isolated: Vec<EntityHandle>,
    /// Set when a structural mutation happened while this frame was on top.
    pub dirty: bool,
}

/// LIFO stack of [`EditFrame`]s.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    frames: Vec<EditFrame>,
}

impl Navigator {
    /// Closed navigator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group on top of the stack, `None` when closed.
    #[must_use]
    pub fn current_group(&self) -> Option<GroupId> {
        self.frames.last().map(|f| f.group)
    }

    /// Open groups, outermost first.
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<GroupId> {
        self.frames.iter().map(|f| f.group).collect()
    }

    /// Number of open frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether any group is open.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Top frame, if any.
    #[must_use]
    pub fn top(&self) -> Option<&EditFrame> {
        self.frames.last()
    }

    /// Whether `id` is on the stack at any depth.
    #[must_use]
    pub fn is_open(&self, id: GroupId) -> bool {
        self.frames.iter().any(|f| f.group == id)
    }

    /// Fails with [`GroupError::ActiveEditContext`] if `id` is open or lies
    /// above an open group, i.e. removing it would pull the ground out from
    /// under the current edit context.
    pub fn ensure_closed(
        &self,
        hierarchy: &Hierarchy,
        id: GroupId,
    ) -> Result<()> {
        let blocked = self
            .frames
            .iter()
            .any(|f| f.group == id || hierarchy.is_descendant(id, f.group));
        if blocked {
            return Err(GroupError::ActiveEditContext(id));
        }
        Ok(())
    }

    /// Open `id` for editing.
    ///
    /// Allowed when closed, or when `id` is nested (directly or not) below
    /// the current top. Edits made at the current level are captured first,
    /// then the new group's content is materialized in world space and
    /// isolated.
    pub fn enter(
        &mut self,
        hierarchy: &mut Hierarchy,
        host: &mut impl SceneHost,
        id: GroupId,
        tolerance: f64,
    ) -> Result<()> {
        let _ = hierarchy.get(id)?;
        if let Some(current) = self.current_group() {
            if !hierarchy.is_descendant(current, id) {
                return Err(GroupError::NotNestable {
                    requested: id,
                    current,
                });
            }
            let _ = hierarchy.capture_edits(host, current, tolerance)?;
        }

        hierarchy.materialize(host, id)?;
        let isolated = isolation_for(hierarchy, id)?;
        host.request_isolation(&isolated);
        self.frames.push(EditFrame {
            group: id,
            isolated,
            dirty: false,
        });
        log::debug!("entered group {id} (depth {})", self.frames.len());
        Ok(())
    }

    /// Close the top frame and return its group.
    ///
    /// Host-side edits are captured back into local transforms; a dirty frame
    /// additionally relinks the group's content first. The frame below is
    /// re-isolated with its current content, or isolation is cleared.
    pub fn exit(
        &mut self,
        hierarchy: &mut Hierarchy,
        host: &mut impl SceneHost,
        tolerance: f64,
    ) -> Result<GroupId> {
        let top = self.frames.last().ok_or(GroupError::NotEditing)?;
        let (group, dirty) = (top.group, top.dirty);
        if hierarchy.contains(group) {
            let changed = if dirty {
                hierarchy.reconcile(host, group, tolerance)?
            } else {
                hierarchy.capture_edits(host, group, tolerance)?
            };
            log::trace!("exit {group}: {changed} locals updated");
        } else {
            log::warn!("open group {group} vanished while being edited");
        }

        let _ = self.frames.pop();
        self.refresh_isolation(hierarchy, host);
        log::debug!("exited group {group} (depth {})", self.frames.len());
        Ok(group)
    }

    /// Flag the top frame as structurally modified. No-op when closed.
    pub fn mark_dirty(&mut self) {
        if let Some(top) = self.frames.last_mut() {
            top.dirty = true;
        }
    }

    /// Recompute the top frame's isolation set from the hierarchy and send
    /// it to the host; clear isolation when closed.
    pub fn refresh_isolation(
        &mut self,
        hierarchy: &Hierarchy,
        host: &mut impl SceneHost,
    ) {
        let Some(top) = self.frames.last_mut() else {
            host.clear_isolation();
            return;
        };
        if let Ok(isolated) = isolation_for(hierarchy, top.group) {
            top.isolated = isolated;
        }
        host.request_isolation(&top.isolated);
    }
}

fn isolation_for(
    hierarchy: &Hierarchy,
    id: GroupId,
) -> Result<Vec<EntityHandle>> {
    Ok(hierarchy
        .get(id)?
        .isolation_set(|child| hierarchy.group(child).map(|g| g.proxy())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tests::{at, group};
    use crate::host::MemoryHost;
    use crate::transform::DEFAULT_TOLERANCE;

    struct Fixture {
        h: Hierarchy,
        host: MemoryHost,
        nav: Navigator,
        /// `outer` holds `inner` and entity `c`; `inner` holds `a`, `b`.
        outer: GroupId,
        inner: GroupId,
        /// Unrelated top-level group.
        other: GroupId,
        a: EntityHandle,
        c: EntityHandle,
    }

    fn fixture() -> Fixture {
        let mut host = MemoryHost::new();
        let mut h = Hierarchy::new();
        let a = host.spawn("a", at(0.0, 0.0, 0.0));
        let b = host.spawn("b", at(2.0, 0.0, 0.0));
        let inner = group(&mut h, &mut host, &[a, b]);
        let inner_proxy = h.get(inner).unwrap().proxy();
        let c = host.spawn("c", at(5.0, 0.0, 0.0));
        let outer = group(&mut h, &mut host, &[inner_proxy, c]);
        let z = host.spawn("z", at(-9.0, 0.0, 0.0));
        let other = group(&mut h, &mut host, &[z]);
        Fixture {
            h,
            host,
            nav: Navigator::new(),
            outer,
            inner,
            other,
            a,
            c,
        }
    }

    impl Fixture {
        fn enter(&mut self, id: GroupId) -> Result<()> {
            self.nav.enter(&mut self.h, &mut self.host, id, DEFAULT_TOLERANCE)
        }

        fn exit(&mut self) -> Result<GroupId> {
            self.nav.exit(&mut self.h, &mut self.host, DEFAULT_TOLERANCE)
        }
    }

    #[test]
    fn nested_entry_and_lifo_exit() {
        let mut f = fixture();
        assert_eq!(f.nav.current_group(), None);
        f.enter(f.outer).unwrap();
        f.enter(f.inner).unwrap();
        assert_eq!(f.nav.breadcrumb(), vec![f.outer, f.inner]);
        assert_eq!(f.exit().unwrap(), f.inner);
        assert_eq!(f.nav.current_group(), Some(f.outer));
        assert_eq!(f.exit().unwrap(), f.outer);
        assert!(!f.nav.is_editing());
    }

    #[test]
    fn unrelated_entry_is_not_nestable() {
        let mut f = fixture();
        f.enter(f.outer).unwrap();
        f.enter(f.inner).unwrap();
        let err = f.enter(f.other);
        assert!(matches!(
            err,
            Err(GroupError::NotNestable { requested, current })
                if requested == f.other && current == f.inner
        ));
        // Re-entering the open group or its parent is not deeper either.
        for id in [f.inner, f.outer] {
            assert!(matches!(
                f.enter(id),
                Err(GroupError::NotNestable { .. })
            ));
        }
        assert_eq!(f.nav.depth(), 2);
    }

    #[test]
    fn indirect_descendant_can_be_entered() {
        let mut f = fixture();
        let outer_proxy = f.h.get(f.outer).unwrap().proxy();
        let top = group(&mut f.h, &mut f.host, &[outer_proxy]);
        f.enter(top).unwrap();
        f.enter(f.inner).unwrap();
        assert_eq!(f.nav.breadcrumb(), vec![top, f.inner]);
    }

    #[test]
    fn extra_exit_reports_not_editing() {
        let mut f = fixture();
        f.enter(f.outer).unwrap();
        let _ = f.exit().unwrap();
        for _ in 0..3 {
            assert!(matches!(f.exit(), Err(GroupError::NotEditing)));
            assert_eq!(f.nav.depth(), 0);
        }
    }

    #[test]
    fn isolation_follows_the_stack() {
        let mut f = fixture();
        let inner_proxy = f.h.get(f.inner).unwrap().proxy();
        f.enter(f.outer).unwrap();
        assert_eq!(f.host.isolation(), Some(&[f.c, inner_proxy][..]));
        f.enter(f.inner).unwrap();
        assert_eq!(f.host.isolation().map(<[_]>::len), Some(2));
        assert!(f.host.isolation().unwrap().contains(&f.a));
        let _ = f.exit().unwrap();
        assert_eq!(f.host.isolation(), Some(&[f.c, inner_proxy][..]));
        let _ = f.exit().unwrap();
        assert_eq!(f.host.isolation(), None);
    }

    #[test]
    fn edits_made_while_open_are_captured_on_exit() {
        let mut f = fixture();
        f.enter(f.outer).unwrap();
        f.enter(f.inner).unwrap();
        // Materialized world of a is its original placement.
        assert!(f
            .host
            .world_transform(f.a)
            .abs_diff_eq(&at(0.0, 0.0, 0.0), 1e-9));
        f.host.set_world_transform(f.a, at(0.0, 4.0, 0.0));
        let _ = f.exit().unwrap();
        let _ = f.exit().unwrap();

        let outer_proxy = f.h.get(f.outer).unwrap().proxy();
        f.host.set_world_transform(outer_proxy, at(3.0, 0.0, 1.0));
        // Outer origin was (3,0,0); the move adds (0,0,1).
        assert!(f
            .h
            .entity_world(&f.host, f.a)
            .abs_diff_eq(&at(0.0, 4.0, 1.0), 1e-9));
    }

    #[test]
    fn open_groups_and_their_ancestors_are_guarded() {
        let mut f = fixture();
        f.enter(f.outer).unwrap();
        f.enter(f.inner).unwrap();
        assert!(matches!(
            f.nav.ensure_closed(&f.h, f.outer),
            Err(GroupError::ActiveEditContext(_))
        ));
        assert!(f.nav.ensure_closed(&f.h, f.other).is_ok());
        assert!(f.nav.is_open(f.inner));
    }

    #[test]
    fn dirty_flag_is_per_frame() {
        let mut f = fixture();
        f.nav.mark_dirty();
        f.enter(f.outer).unwrap();
        f.nav.mark_dirty();
        f.enter(f.inner).unwrap();
        assert!(!f.nav.top().unwrap().dirty);
        let _ = f.exit().unwrap();
        assert!(f.nav.top().unwrap().dirty);
    }
}
