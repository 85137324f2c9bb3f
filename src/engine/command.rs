//! The engine's complete command vocabulary.
//!
//! Every user-facing group operation, whether triggered by a shortcut, a
//! menu entry or a script, is represented as a [`GroupCommand`]. Hosts build
//! commands and pass them to [`GroupEngine::execute`].

use super::GroupEngine;
use crate::error::Result;
use crate::hierarchy::{EntityHandle, GroupId};
use crate::host::SceneHost;

/// A discrete operation the engine can perform.
///
/// ```ignore
/// engine.execute(GroupCommand::CreateGroup { handles, name: None })?;
/// engine.execute(GroupCommand::ToggleEdit { active: Some(proxy) })?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    // -- Structure --
    /// Group the selection inside the open edit context.
    CreateGroup {
        /// Selected entities, in selection order.
        handles: Vec<EntityHandle>,
        /// Explicit name; `None` uses the naming options.
        name: Option<String>,
    },

    /// Ungroup the given groups.
    Ungroup {
        /// Groups to dissolve.
        groups: Vec<GroupId>,
    },

    /// Move some direct members of a group out one level.
    ExtractMembers {
        /// Group to extract from.
        group: GroupId,
        /// Members to extract.
        handles: Vec<EntityHandle>,
    },

    /// Nest one group in another.
    NestGroup {
        /// Containing group.
        parent: GroupId,
        /// Nested group.
        child: GroupId,
    },

    /// Move a group under another owner or to the top level.
    ReparentGroup {
        /// Group to move.
        child: GroupId,
        /// New owner, `None` for top level.
        parent: Option<GroupId>,
    },

    // -- Metadata --
    /// Per-instance material override on a member.
    SetMaterial {
        /// Group holding the member.
        group: GroupId,
        /// The member.
        handle: EntityHandle,
        /// Material name.
        material: String,
    },

    /// Rename a group.
    Rename {
        /// Group to rename.
        group: GroupId,
        /// New name; blank falls back to the default.
        name: String,
    },

    // -- Edit contexts --
    /// Open a group for editing.
    EnterEdit {
        /// Group to open.
        group: GroupId,
    },

    /// Close the innermost open group.
    ExitEdit,

    /// Close every open group.
    ExitAll,

    /// Tab-style toggle: enter the active entity if it is a group proxy,
    /// otherwise leave the current group if one is open.
    ToggleEdit {
        /// The host's active entity.
        active: Option<EntityHandle>,
    },
}

/// What a successful command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A group was created.
    Created(GroupId),
    /// Entities were released to the enclosing context.
    Freed(Vec<EntityHandle>),
    /// A group was opened.
    Entered(GroupId),
    /// Groups were closed, innermost first.
    Exited(Vec<GroupId>),
    /// A group was renamed.
    Renamed {
        /// Name before the rename.
        previous: String,
    },
    /// The command completed with nothing to report.
    Done,
    /// The command did not apply; the host should run its default action.
    PassThrough,
}

impl GroupCommand {
    /// Run this command against `engine`.
    pub fn execute<H: SceneHost>(
        self,
        engine: &mut GroupEngine<H>,
    ) -> Result<CommandOutcome> {
        match self {
            Self::CreateGroup { handles, name } => engine
                .create_group(&handles, name.as_deref())
                .map(CommandOutcome::Created),
            Self::Ungroup { groups } => {
                engine.dissolve_groups(&groups).map(CommandOutcome::Freed)
            }
            Self::ExtractMembers { group, handles } => {
                engine.extract_members(group, &handles)?;
                Ok(CommandOutcome::Freed(handles))
            }
            Self::NestGroup { parent, child } => {
                engine.nest_group(parent, child)?;
                Ok(CommandOutcome::Done)
            }
            Self::ReparentGroup { child, parent } => {
                engine.reparent_group(child, parent)?;
                Ok(CommandOutcome::Done)
            }
            Self::SetMaterial {
                group,
                handle,
                material,
            } => {
                engine.add_material_override(group, handle, &material)?;
                Ok(CommandOutcome::Done)
            }
            Self::Rename { group, name } => engine
                .rename_group(group, &name)
                .map(|previous| CommandOutcome::Renamed { previous }),
            Self::EnterEdit { group } => {
                engine.enter_edit(group)?;
                Ok(CommandOutcome::Entered(group))
            }
            Self::ExitEdit => {
                engine.exit_edit().map(|id| CommandOutcome::Exited(vec![id]))
            }
            Self::ExitAll => engine.exit_all().map(CommandOutcome::Exited),
            Self::ToggleEdit { active } => toggle_edit(engine, active),
        }
    }
}

fn toggle_edit<H: SceneHost>(
    engine: &mut GroupEngine<H>,
    active: Option<EntityHandle>,
) -> Result<CommandOutcome> {
    if let Some(group) = active.and_then(|h| engine.group_by_proxy(h)) {
        engine.enter_edit(group)?;
        return Ok(CommandOutcome::Entered(group));
    }
    if engine.navigator.is_editing() {
        return engine.exit_edit().map(|id| CommandOutcome::Exited(vec![id]));
    }
    Ok(CommandOutcome::PassThrough)
}

impl<H: SceneHost> GroupEngine<H> {
    /// Execute a command. See [`GroupCommand`].
    pub fn execute(&mut self, command: GroupCommand) -> Result<CommandOutcome> {
        log::trace!("execute {command:?}");
        command.execute(self)
    }
}
