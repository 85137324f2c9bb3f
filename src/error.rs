//! Crate-level error types.

use std::fmt;

use crate::hierarchy::{EntityHandle, GroupId};

/// Errors produced by groupnest operations.
///
/// Every hierarchy and navigation failure is reported before any state is
/// touched, so an `Err` always means "nothing changed".
#[derive(Debug)]
pub enum GroupError {
    /// Create-group was called with no entities.
    EmptySelection,
    /// Nesting `child` under `parent` would close a cycle.
    CyclicNesting {
        /// Proposed containing group.
        parent: GroupId,
        /// Proposed nested group.
        child: GroupId,
    },
    /// A selected entity already lives inside a selected group.
    AlreadyGrouped {
        /// The offending entity.
        handle: EntityHandle,
        /// The group that already contains it.
        group: GroupId,
    },
    /// No live group has this id.
    GroupNotFound(GroupId),
    /// The entity is not a direct member of the group.
    NotAMember {
        /// Group that was searched.
        group: GroupId,
        /// Entity that was not found in it.
        handle: EntityHandle,
    },
    /// The group (or one of its descendants) is open for editing.
    ActiveEditContext(GroupId),
    /// Requested entry into a group that is not nested under the open one.
    NotNestable {
        /// Group that was requested.
        requested: GroupId,
        /// Group currently open for editing.
        current: GroupId,
    },
    /// Exit requested with no group open.
    NotEditing,
    /// A saved hierarchy was malformed or violated an invariant.
    Persist(String),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Generic I/O failure.
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = GroupError> = std::result::Result<T, E>;

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySelection => write!(f, "no entities selected"),
            Self::CyclicNesting { parent, child } => write!(
                f,
                "nesting group {child} inside group {parent} would create a \
                 cycle"
            ),
            Self::AlreadyGrouped { handle, group } => {
                write!(f, "entity {handle} is already in group {group}")
            }
            Self::GroupNotFound(id) => write!(f, "group {id} not found"),
            Self::NotAMember { group, handle } => {
                write!(f, "entity {handle} is not a member of group {group}")
            }
            Self::ActiveEditContext(id) => write!(
                f,
                "group {id} is open for editing; exit edit mode first"
            ),
            Self::NotNestable { requested, current } => write!(
                f,
                "group {requested} is not nested inside open group {current}"
            ),
            Self::NotEditing => write!(f, "no group is open for editing"),
            Self::Persist(msg) => write!(f, "hierarchy file error: {msg}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for GroupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GroupError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
