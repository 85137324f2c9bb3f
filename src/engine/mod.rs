//! Group Operations façade.
//!
//! [`GroupEngine`] owns the hierarchy, the edit-context navigator, the host
//! and the runtime options, and is the only thing a host binds its commands
//! to. Every operation validates before it writes, so a failed operation
//! leaves all three pieces exactly as they were.
//!
//! The implementation is split by concern:
//! - `grouping` – create, ungroup, extract, nest, materials, rename
//! - `editing` – entering and leaving edit contexts
//! - `queries` – read-only views that need the host
//! - `persistence` – saving and loading the hierarchy
//! - `command` – the [`GroupCommand`] vocabulary

mod command;
mod editing;
mod grouping;
mod persistence;
mod queries;

pub use command::{CommandOutcome, GroupCommand};

use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::host::SceneHost;
use crate::navigator::Navigator;
use crate::options::Options;

/// Orchestrates the hierarchy store and the navigator on top of a host.
///
/// # Construction
///
/// Use [`GroupEngine::new`] for default options or
/// [`GroupEngine::with_options`] to start from a loaded preset.
/// [`GroupEngine::from_hierarchy`] resumes a saved hierarchy.
///
/// # Edit contexts
///
/// While a group is open, mutations capture host-side edits of the open
/// group first, then mark its frame dirty and refresh viewport isolation.
/// A mutation that fails leaves the captured edits uncommitted.
#[derive(Debug)]
pub struct GroupEngine<H> {
    hierarchy: Hierarchy,
    navigator: Navigator,
    host: H,
    options: Options,
}

impl<H: SceneHost> GroupEngine<H> {
    /// Engine with an empty hierarchy and default options.
    pub fn new(host: H) -> Self {
        Self::with_options(host, Options::default())
    }

    /// Engine with an empty hierarchy.
    pub fn with_options(host: H, options: Options) -> Self {
        Self::from_hierarchy(host, Hierarchy::new(), options)
    }

    /// Engine over an existing hierarchy, e.g. one loaded from disk.
    pub fn from_hierarchy(
        host: H,
        hierarchy: Hierarchy,
        options: Options,
    ) -> Self {
        log::debug!("group engine ready with {} groups", hierarchy.len());
        Self {
            hierarchy,
            navigator: Navigator::new(),
            host,
            options,
        }
    }

    /// The hierarchy store.
    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// The edit-context stack.
    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, for edits made outside the engine (moving
    /// entities, spawning new ones).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replace the options. Takes effect on the next operation.
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Give the host back.
    pub fn into_host(self) -> H {
        self.host
    }

    fn tolerance(&self) -> f64 {
        self.options.transform.tolerance
    }

    /// Read host-side edits of the open group back into the hierarchy so
    /// that derived world transforms are current before validating.
    fn sync_open_context(&mut self) -> Result<()> {
        if let Some(open) = self.navigator.current_group() {
            let tolerance = self.tolerance();
            let _ = self.hierarchy.capture_edits(&self.host, open, tolerance)?;
        }
        Ok(())
    }

    /// Run a structural change on top of freshly captured edits.
    ///
    /// The captured locals only stick if `op` succeeds; on error the store
    /// is put back exactly as it was before the call.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self
            .navigator
            .is_editing()
            .then(|| self.hierarchy.clone());
        match self.sync_open_context().and_then(|()| op(self)) {
            Ok(value) => {
                self.after_mutation();
                Ok(value)
            }
            Err(e) => {
                if let Some(snapshot) = snapshot {
                    self.hierarchy = snapshot;
                }
                Err(e)
            }
        }
    }

    fn after_mutation(&mut self) {
        self.navigator.mark_dirty();
        if self.navigator.is_editing() {
            self.navigator.refresh_isolation(&self.hierarchy, &mut self.host);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hierarchy::tests::at;
    use crate::hierarchy::EntityHandle;
    use crate::host::MemoryHost;

    /// Engine over a host holding one named entity per x coordinate.
    pub(crate) fn engine_with(
        xs: &[f64],
    ) -> (GroupEngine<MemoryHost>, Vec<EntityHandle>) {
        let mut host = MemoryHost::new();
        let handles = xs
            .iter()
            .enumerate()
            .map(|(i, &x)| host.spawn(&format!("e{i}"), at(x, 0.0, 0.0)))
            .collect();
        (GroupEngine::new(host), handles)
    }

    #[test]
    fn options_are_swappable() {
        let (mut engine, _) = engine_with(&[]);
        let mut options = Options::default();
        options.transform.tolerance = 1e-3;
        engine.set_options(options);
        assert!((engine.tolerance() - 1e-3).abs() < f64::EPSILON);
        assert!(engine.hierarchy().is_empty());
        assert!(!engine.navigator().is_editing());
        assert_eq!(engine.into_host().entity_count(), 0);
    }
}
