use rustc_hash::FxHashMap;

use super::SceneHost;
use crate::hierarchy::{ContainerRef, EntityHandle};
use crate::options::StorageMode;
use crate::transform::Transform;

/// One entity tracked by [`MemoryHost`].
#[derive(Debug, Clone)]
struct HostEntity {
    name: String,
    transform: Transform,
    container: ContainerRef,
    is_proxy: bool,
    materials: Vec<(ContainerRef, String)>,
}

/// One container tracked by [`MemoryHost`].
#[derive(Debug, Clone)]
struct HostContainer {
    name: String,
    mode: StorageMode,
}

/// Headless [`SceneHost`] that keeps the whole scene in memory.
///
/// Useful for tooling, persistence round trips and tests. Entities start in
/// [`ContainerRef::ROOT`].
#[derive(Debug, Clone)]
pub struct MemoryHost {
    entities: FxHashMap<EntityHandle, HostEntity>,
    containers: FxHashMap<ContainerRef, HostContainer>,
    isolation: Option<Vec<EntityHandle>>,
    next_handle: u64,
    next_container: u64,
}

impl MemoryHost {
    /// Empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: FxHashMap::default(),
            containers: FxHashMap::default(),
            isolation: None,
            next_handle: 1,
            next_container: 1,
        }
    }

    /// Add a plain entity at the scene root.
    pub fn spawn(&mut self, name: &str, transform: Transform) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        let _ = self.entities.insert(
            handle,
            HostEntity {
                name: name.to_owned(),
                transform,
                container: ContainerRef::ROOT,
                is_proxy: false,
                materials: Vec::new(),
            },
        );
        handle
    }

    /// Whether the entity exists.
    #[must_use]
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(&handle)
    }

    /// Whether the entity is a group proxy.
    #[must_use]
    pub fn is_proxy(&self, handle: EntityHandle) -> bool {
        self.entities.get(&handle).is_some_and(|e| e.is_proxy)
    }

    /// Container the entity is currently linked into.
    #[must_use]
    pub fn container_of(&self, handle: EntityHandle) -> Option<ContainerRef> {
        self.entities.get(&handle).map(|e| e.container)
    }

    /// Entities linked into `container`, sorted by handle.
    #[must_use]
    pub fn contents(&self, container: ContainerRef) -> Vec<EntityHandle> {
        let mut handles: Vec<_> = self
            .entities
            .iter()
            .filter(|(_, e)| e.container == container)
            .map(|(&h, _)| h)
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Whether the container exists (the root always does).
    #[must_use]
    pub fn has_container(&self, container: ContainerRef) -> bool {
        container.is_root() || self.containers.contains_key(&container)
    }

    /// Storage mode a container was allocated with.
    #[must_use]
    pub fn container_mode(
        &self,
        container: ContainerRef,
    ) -> Option<StorageMode> {
        self.containers.get(&container).map(|c| c.mode)
    }

    /// Name of a container.
    #[must_use]
    pub fn container_name(&self, container: ContainerRef) -> Option<&str> {
        self.containers.get(&container).map(|c| c.name.as_str())
    }

    /// Current viewport isolation, `None` when the full scene is shown.
    #[must_use]
    pub fn isolation(&self) -> Option<&[EntityHandle]> {
        self.isolation.as_deref()
    }

    /// Material overrides applied to an entity, with the container each was
    /// scoped to.
    #[must_use]
    pub fn materials(&self, handle: EntityHandle) -> &[(ContainerRef, String)] {
        match self.entities.get(&handle) {
            Some(e) => &e.materials,
            None => &[],
        }
    }

    /// Number of live entities (plain and proxy).
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live containers, excluding the root.
    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHost for MemoryHost {
    fn world_transform(&self, handle: EntityHandle) -> Transform {
        self.entities
            .get(&handle)
            .map_or(Transform::IDENTITY, |e| e.transform)
    }

    fn set_world_transform(
        &mut self,
        handle: EntityHandle,
        transform: Transform,
    ) {
        if let Some(e) = self.entities.get_mut(&handle) {
            e.transform = transform;
        }
    }

    fn allocate_container(
        &mut self,
        name: &str,
        mode: StorageMode,
    ) -> ContainerRef {
        let container = ContainerRef(self.next_container);
        self.next_container += 1;
        let _ = self.containers.insert(
            container,
            HostContainer {
                name: name.to_owned(),
                mode,
            },
        );
        container
    }

    fn bind_proxy(
        &mut self,
        container: ContainerRef,
        name: &str,
    ) -> EntityHandle {
        let handle = self.spawn(name, Transform::IDENTITY);
        if let Some(e) = self.entities.get_mut(&handle) {
            e.is_proxy = true;
        }
        log::trace!("bound proxy {handle} to {container}");
        handle
    }

    fn delete_proxy(&mut self, proxy: EntityHandle) {
        let _ = self.entities.remove(&proxy);
    }

    fn release_container(&mut self, container: ContainerRef) {
        let _ = self.containers.remove(&container);
    }

    fn move_into_container(
        &mut self,
        handle: EntityHandle,
        container: ContainerRef,
    ) {
        if let Some(e) = self.entities.get_mut(&handle) {
            e.container = container;
        }
    }

    fn remove_from_container(
        &mut self,
        handle: EntityHandle,
        container: ContainerRef,
    ) {
        if let Some(e) = self.entities.get_mut(&handle) {
            if e.container == container {
                e.container = ContainerRef::ROOT;
            }
        }
    }

    fn request_isolation(&mut self, handles: &[EntityHandle]) {
        self.isolation = Some(handles.to_vec());
    }

    fn clear_isolation(&mut self) {
        self.isolation = None;
    }

    fn set_material_override(
        &mut self,
        handle: EntityHandle,
        container: ContainerRef,
        material: &str,
    ) {
        if let Some(e) = self.entities.get_mut(&handle) {
            e.materials.push((container, material.to_owned()));
        }
    }

    fn entity_name(&self, handle: EntityHandle) -> Option<String> {
        self.entities.get(&handle).map(|e| e.name.clone())
    }

    fn rename_group(
        &mut self,
        proxy: EntityHandle,
        container: ContainerRef,
        name: &str,
    ) {
        if let Some(e) = self.entities.get_mut(&proxy) {
            name.clone_into(&mut e.name);
        }
        if let Some(c) = self.containers.get_mut(&container) {
            name.clone_into(&mut c.name);
        }
    }
}
