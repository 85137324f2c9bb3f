//! Entering and leaving edit contexts.

use super::GroupEngine;
use crate::error::Result;
use crate::hierarchy::GroupId;
use crate::host::SceneHost;

impl<H: SceneHost> GroupEngine<H> {
    /// Open a group for in-place editing, nested below whatever is open.
    pub fn enter_edit(&mut self, id: GroupId) -> Result<()> {
        let tolerance = self.tolerance();
        self.navigator
            .enter(&mut self.hierarchy, &mut self.host, id, tolerance)?;
        log::info!("editing {id}");
        Ok(())
    }

    /// Close the innermost open group and return it.
    pub fn exit_edit(&mut self) -> Result<GroupId> {
        let tolerance = self.tolerance();
        let id = self
            .navigator
            .exit(&mut self.hierarchy, &mut self.host, tolerance)?;
        log::info!("left {id}");
        Ok(id)
    }

    /// Close every open group, innermost first. Returns them in the order
    /// they were closed.
    pub fn exit_all(&mut self) -> Result<Vec<GroupId>> {
        let mut closed = Vec::with_capacity(self.navigator.depth());
        while self.navigator.is_editing() {
            closed.push(self.exit_edit()?);
        }
        Ok(closed)
    }

    /// Innermost open group.
    #[must_use]
    pub fn current_group(&self) -> Option<GroupId> {
        self.navigator.current_group()
    }

    /// Open groups, outermost first.
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<GroupId> {
        self.navigator.breadcrumb()
    }
}
