//! JSON persistence of the hierarchy.
//!
//! The document is plain data. Loading rebuilds the lookup indices and
//! rejects anything that would break the store's invariants, including
//! cycles introduced by hand-edited files.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{Group, Hierarchy};
use crate::error::{GroupError, Result};

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Serialized form of a [`Hierarchy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyDocument {
    /// Format version, must equal [`DOCUMENT_VERSION`].
    pub version: u32,
    /// Next id to hand out; greater than every stored id.
    pub next_id: u32,
    /// All groups in id order.
    pub groups: Vec<Group>,
}

impl Hierarchy {
    /// Snapshot the hierarchy as a document.
    #[must_use]
    pub fn to_document(&self) -> HierarchyDocument {
        HierarchyDocument {
            version: DOCUMENT_VERSION,
            next_id: self.next_id,
            groups: self.groups().into_iter().cloned().collect(),
        }
    }

    /// Rebuild a hierarchy from a document, validating it first.
    pub fn from_document(doc: HierarchyDocument) -> Result<Self> {
        validate(&doc)?;
        let mut hierarchy = Self {
            next_id: doc.next_id,
            ..Self::default()
        };
        for group in doc.groups {
            let _ = hierarchy.proxies.insert(group.proxy, group.id);
            for member in &group.members {
                let _ = hierarchy.owners.insert(member.handle, group.id);
            }
            let _ = hierarchy.groups.insert(group.id, group);
        }
        if let Some(cycle) = hierarchy.find_cycle() {
            let path: Vec<_> = cycle.iter().map(ToString::to_string).collect();
            return Err(GroupError::Persist(format!(
                "cycle: {}",
                path.join(" -> ")
            )));
        }
        hierarchy.invalidate();
        Ok(hierarchy)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| GroupError::Persist(e.to_string()))
    }

    /// Parse and validate JSON produced by [`Hierarchy::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: HierarchyDocument = serde_json::from_str(json)
            .map_err(|e| GroupError::Persist(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Write the hierarchy to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        log::info!("saved {} groups to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a hierarchy from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let hierarchy = Self::from_json(&json)?;
        log::info!("loaded {} groups from {}", hierarchy.len(), path.display());
        Ok(hierarchy)
    }
}

fn invalid(msg: String) -> GroupError {
    GroupError::Persist(msg)
}

fn validate(doc: &HierarchyDocument) -> Result<()> {
    if doc.version != DOCUMENT_VERSION {
        return Err(invalid(format!(
            "unsupported document version {} (expected {DOCUMENT_VERSION})",
            doc.version
        )));
    }

    let mut by_id = FxHashMap::default();
    let mut proxies = FxHashSet::default();
    let mut owned = FxHashSet::default();
    for group in &doc.groups {
        if group.id.0 >= doc.next_id {
            return Err(invalid(format!(
                "group {} is not below next_id {}",
                group.id, doc.next_id
            )));
        }
        if by_id.insert(group.id, group).is_some() {
            return Err(invalid(format!("duplicate group id {}", group.id)));
        }
        if !proxies.insert(group.proxy) {
            return Err(invalid(format!(
                "proxy {} instances two groups",
                group.proxy
            )));
        }
        for member in &group.members {
            if !owned.insert(member.handle) {
                return Err(invalid(format!(
                    "entity {} is held by two groups",
                    member.handle
                )));
            }
        }
    }
    if let Some(handle) = proxies.intersection(&owned).next() {
        return Err(invalid(format!(
            "proxy {handle} is also listed as a plain member"
        )));
    }

    for group in &doc.groups {
        for &child in &group.child_groups {
            if child == group.id {
                return Err(invalid(format!("group {child} contains itself")));
            }
            if !by_id.contains_key(&child) {
                return Err(invalid(format!(
                    "group {} references missing group {child}",
                    group.id
                )));
            }
        }
        if let Some(parent) = group.parent {
            let holds =
                by_id.get(&parent).is_some_and(|p| p.has_child(group.id));
            if !holds {
                return Err(invalid(format!(
                    "group {} names {parent} as parent but is not its child",
                    group.id
                )));
            }
        }
        for &sharer in group.shared.keys() {
            let shares = group.parent != Some(sharer)
                && by_id.get(&sharer).is_some_and(|s| s.has_child(group.id));
            if !shares {
                return Err(invalid(format!(
                    "group {} has a placement in {sharer}, which does not \
                     share it",
                    group.id
                )));
            }
        }
    }
    Ok(())
}
