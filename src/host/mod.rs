//! Boundary to the host scene editor.
//!
//! The hierarchy never owns geometry. Everything it needs from the editor
//! (transforms, containers, proxies, viewport isolation, materials) goes
//! through [`SceneHost`]. Calls are synchronous and take effect
//! immediately; none of them can fail from the core's point of view.

mod memory;

pub use memory::MemoryHost;

use crate::hierarchy::{ContainerRef, EntityHandle};
use crate::options::StorageMode;
use crate::transform::Transform;

/// Services the host editor provides to the group hierarchy.
pub trait SceneHost {
    /// Current world transform of an entity.
    fn world_transform(&self, handle: EntityHandle) -> Transform;

    /// Overwrite an entity's world transform.
    fn set_world_transform(
        &mut self,
        handle: EntityHandle,
        transform: Transform,
    );

    /// Create an empty container for a new group's content. `mode` selects
    /// where the host stores it; the hierarchy does not care.
    fn allocate_container(
        &mut self,
        name: &str,
        mode: StorageMode,
    ) -> ContainerRef;

    /// Create the single-point instancing entity bound to `container`.
    fn bind_proxy(
        &mut self,
        container: ContainerRef,
        name: &str,
    ) -> EntityHandle;

    /// Delete a proxy entity created by [`SceneHost::bind_proxy`].
    fn delete_proxy(&mut self, proxy: EntityHandle);

    /// Delete an (empty) container created by
    /// [`SceneHost::allocate_container`].
    fn release_container(&mut self, container: ContainerRef);

    /// Link an entity into a container.
    fn move_into_container(
        &mut self,
        handle: EntityHandle,
        container: ContainerRef,
    );

    /// Unlink an entity from a container.
    fn remove_from_container(
        &mut self,
        handle: EntityHandle,
        container: ContainerRef,
    );

    /// Restrict the viewport to exactly `handles`. Fire-and-forget.
    fn request_isolation(&mut self, handles: &[EntityHandle]);

    /// Show the full scene again.
    fn clear_isolation(&mut self);

    /// Apply a material to `handle` as seen through `container`'s instances.
    fn set_material_override(
        &mut self,
        handle: EntityHandle,
        container: ContainerRef,
        material: &str,
    );

    /// Display name of an entity, if the host tracks one.
    fn entity_name(&self, _handle: EntityHandle) -> Option<String> {
        None
    }

    /// Propagate a group rename to its proxy and container.
    fn rename_group(
        &mut self,
        _proxy: EntityHandle,
        _container: ContainerRef,
        _name: &str,
    ) {
    }
}
