//! Saving and restoring the hierarchy alongside the host's own file.

use std::path::Path;

use super::GroupEngine;
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::host::SceneHost;

impl<H: SceneHost> GroupEngine<H> {
    /// Write the hierarchy to a JSON file.
    ///
    /// Edits pending in an open group are captured first so the file
    /// matches what the viewport shows.
    pub fn save_hierarchy(&mut self, path: &Path) -> Result<()> {
        self.sync_open_context()?;
        self.hierarchy.save(path)
    }

    /// Replace the hierarchy with one read from a JSON file.
    ///
    /// The file is fully validated before anything changes. Open edit
    /// contexts are closed first, since they refer to the old hierarchy.
    pub fn load_hierarchy(&mut self, path: &Path) -> Result<()> {
        let loaded = Hierarchy::load(path)?;
        let _ = self.exit_all()?;
        self.hierarchy = loaded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tests::engine_with;
    use crate::error::GroupError;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("groupnest-engine-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn save_then_load_restores_groups() {
        let (mut engine, e) = engine_with(&[0.0, 2.0, 4.0]);
        let g = engine.create_group(&e[..2], Some("pair")).unwrap();
        let path = scratch("roundtrip.json");
        engine.save_hierarchy(&path).unwrap();

        let _ = engine.dissolve_group(g).unwrap();
        engine.load_hierarchy(&path).unwrap();
        assert_eq!(engine.group(g).unwrap().name(), "pair");
        assert_eq!(engine.hierarchy().owner_of(e[1]), Some(g));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn loading_closes_edit_contexts() {
        let (mut engine, e) = engine_with(&[0.0]);
        let g = engine.create_group(&e, None).unwrap();
        let path = scratch("closes.json");
        engine.save_hierarchy(&path).unwrap();
        engine.enter_edit(g).unwrap();
        engine.load_hierarchy(&path).unwrap();
        assert_eq!(engine.current_group(), None);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn bad_file_leaves_hierarchy_alone() {
        let (mut engine, e) = engine_with(&[0.0]);
        let g = engine.create_group(&e, None).unwrap();
        let path = scratch("bad.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"version\": 1}").unwrap();
        assert!(matches!(
            engine.load_hierarchy(&path),
            Err(GroupError::Persist(_))
        ));
        assert!(engine.hierarchy().contains(g));
        std::fs::remove_file(&path).unwrap();
    }
}
