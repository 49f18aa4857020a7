//! Resource Manager - name and handle registry for one resource type
//!
//! **Responsibilities**:
//! - Owns the name→handle and handle→resource maps; both are updated under a
//!   single write lock so every handle maps to exactly one name
//! - Allocates handles and builds resources through a type-specific factory
//! - Drives load/unload/reload and keeps memory usage within the budget
//! - Notifies a [`ResourceListener`] (normally the resource group manager)
//!
//! **Ownership**: resources are handed out as [`SharedResource`] clones. A
//! resource only the registry holds is "unreferenced" and may be evicted when
//! the budget is exceeded.
//!
//! One manager exists per resource type and is constructed explicitly by the
//! engine assembly; there is no global instance.

use super::{
    ArchiveProvider, HandleAllocator, ManualResourceLoader, Resource, ResourceError, ResourceFactory,
    ResourceHandle, ResourceParams, SharedResource,
};
use crate::core::ResourceConfig;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives registry membership changes
///
/// Implementations must tolerate redundant notifications.
pub trait ResourceListener: Send + Sync {
    /// A resource was registered
    fn on_resource_created(&self, resource: &SharedResource);

    /// A resource was removed from the registry
    fn on_resource_removed(&self, resource: &SharedResource);

    /// Every resource of `resource_type` was removed in one step
    fn on_all_resources_removed(&self, resource_type: &str);
}

#[derive(Default)]
struct ResourceMaps {
    by_name: HashMap<String, ResourceHandle>,
    by_handle: BTreeMap<ResourceHandle, SharedResource>,
}

/// Registry and lifecycle driver for resources of one type
pub struct ResourceManager {
    resource_type: String,
    factory: Box<dyn ResourceFactory>,
    listener: Option<Arc<dyn ResourceListener>>,
    provider: Option<Arc<dyn ArchiveProvider>>,
    handles: HandleAllocator,
    maps: RwLock<ResourceMaps>,
    memory_usage: AtomicUsize,
    memory_budget: AtomicUsize,
}

impl ResourceManager {
    /// Create a manager for `resource_type`
    pub fn new(resource_type: impl Into<String>, factory: Box<dyn ResourceFactory>, config: &ResourceConfig) -> Self {
        let resource_type = resource_type.into();
        log::debug!(
            "Creating {} manager (budget: {})",
            resource_type,
            config
                .memory_budget
                .map_or_else(|| "unbounded".to_string(), |b| format!("{} bytes", b))
        );

        Self {
            resource_type,
            factory,
            listener: None,
            provider: None,
            handles: HandleAllocator::new(),
            maps: RwLock::new(ResourceMaps::default()),
            memory_usage: AtomicUsize::new(0),
            memory_budget: AtomicUsize::new(config.memory_budget.unwrap_or(usize::MAX)),
        }
    }

    /// Set the listener notified about creation and removal
    pub fn with_listener(mut self, listener: Arc<dyn ResourceListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Set the provider used to open streams for non-manual resources
    pub fn with_provider(mut self, provider: Arc<dyn ArchiveProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Type name of the resources this manager creates
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Register a new resource
    ///
    /// Fails with `DuplicateItem` if `name` is already registered; in that
    /// case no handle is consumed and the maps are left untouched.
    pub fn create(
        &self,
        name: &str,
        group: &str,
        is_manual: bool,
        loader: Option<Arc<dyn ManualResourceLoader>>,
    ) -> Result<SharedResource, ResourceError> {
        if self.resource_exists(name) {
            return Err(ResourceError::duplicate("resource", name));
        }

        let params = ResourceParams {
            name,
            handle: self.handles.allocate(),
            group,
            is_manual,
            loader: loader.as_ref(),
        };
        let payload = self.factory.create(&params)?;
        let resource = Arc::new(Resource::new(&params, &self.resource_type, payload));

        self.add_impl(&resource)?;
        log::debug!("Created {} '{}' ({}) in group '{}'", self.resource_type, name, params.handle, group);

        if let Some(listener) = &self.listener {
            listener.on_resource_created(&resource);
        }
        Ok(resource)
    }

    /// Return the resource called `name`, creating it if needed
    ///
    /// The flag is `true` when the resource was created by this call.
    pub fn create_or_retrieve(
        &self,
        name: &str,
        group: &str,
        is_manual: bool,
        loader: Option<Arc<dyn ManualResourceLoader>>,
    ) -> Result<(SharedResource, bool), ResourceError> {
        if let Some(existing) = self.get_by_name(name) {
            return Ok((existing, false));
        }
        self.create(name, group, is_manual, loader).map(|r| (r, true))
    }

    /// Single insertion path into both maps
    ///
    /// A collision on either map leaves both maps as they were.
    fn add_impl(&self, resource: &SharedResource) -> Result<(), ResourceError> {
        let mut maps = self.maps.write();

        if maps.by_name.contains_key(resource.name()) {
            return Err(ResourceError::duplicate("resource", resource.name()));
        }
        maps.by_name.insert(resource.name().to_string(), resource.handle());

        if maps.by_handle.contains_key(&resource.handle()) {
            maps.by_name.remove(resource.name());
            return Err(ResourceError::duplicate("handle", resource.handle().to_string()));
        }
        maps.by_handle.insert(resource.handle(), Arc::clone(resource));

        Ok(())
    }

    /// Look up a resource by name
    pub fn get_by_name(&self, name: &str) -> Option<SharedResource> {
        let maps = self.maps.read();
        maps.by_name
            .get(name)
            .and_then(|handle| maps.by_handle.get(handle))
            .cloned()
    }

    /// Look up a resource by handle
    pub fn get_by_handle(&self, handle: ResourceHandle) -> Option<SharedResource> {
        self.maps.read().by_handle.get(&handle).cloned()
    }

    /// Whether a resource called `name` is registered
    pub fn resource_exists(&self, name: &str) -> bool {
        self.maps.read().by_name.contains_key(name)
    }

    /// Number of registered resources
    pub fn resource_count(&self) -> usize {
        self.maps.read().by_handle.len()
    }

    /// Snapshot of all registered resources in handle order
    pub fn resources(&self) -> Vec<SharedResource> {
        self.maps.read().by_handle.values().cloned().collect()
    }

    /// Load the resource called `name`
    pub fn load(&self, name: &str) -> Result<SharedResource, ResourceError> {
        let resource = self
            .get_by_name(name)
            .ok_or_else(|| ResourceError::not_found("resource", name))?;
        self.load_resource(&resource)?;
        Ok(resource)
    }

    /// Load the resource with `handle`
    pub fn load_by_handle(&self, handle: ResourceHandle) -> Result<SharedResource, ResourceError> {
        let resource = self
            .get_by_handle(handle)
            .ok_or_else(|| ResourceError::not_found("resource", handle.to_string()))?;
        self.load_resource(&resource)?;
        Ok(resource)
    }

    fn load_resource(&self, resource: &SharedResource) -> Result<(), ResourceError> {
        let loaded = resource.load(self.provider.as_deref(), |size| {
            self.memory_usage.fetch_add(size, Ordering::AcqRel);
        })?;
        let Some(size) = loaded else {
            return Ok(());
        };
        self.enforce_budget(resource, size)
    }

    /// Bring usage back under the budget after `loaded` was loaded
    fn enforce_budget(&self, loaded: &SharedResource, size: usize) -> Result<(), ResourceError> {
        let budget = self.memory_budget();
        if self.memory_usage() <= budget {
            return Ok(());
        }

        self.evict_unreferenced(budget, Some(loaded.handle()));
        if self.memory_usage() <= budget {
            return Ok(());
        }

        loaded.unload(|released| self.release(released));
        let usage = self.memory_usage();
        log::warn!(
            "{} '{}' ({} bytes) does not fit the budget ({} bytes, {} in use)",
            self.resource_type,
            loaded.name(),
            size,
            budget,
            usage
        );
        Err(ResourceError::MemoryBudgetExceeded {
            requested: size,
            budget,
            usage,
        })
    }

    /// Unload loaded resources nobody else holds, oldest handle first, until
    /// usage fits `budget`
    fn evict_unreferenced(&self, budget: usize, protected: Option<ResourceHandle>) {
        let candidates: Vec<SharedResource> = {
            let maps = self.maps.read();
            maps.by_handle
                .iter()
                .filter(|(handle, resource)| {
                    Some(**handle) != protected && Arc::strong_count(resource) == 1 && resource.is_loaded()
                })
                .map(|(_, resource)| Arc::clone(resource))
                .collect()
        };

        for resource in candidates {
            if self.memory_usage() <= budget {
                break;
            }
            if resource.unload(|size| self.release(size)).is_some() {
                log::debug!("Evicted {} '{}' to fit the memory budget", self.resource_type, resource.name());
            }
        }
    }

    fn release(&self, size: usize) {
        // Saturating: an unload racing with remove_all must not wrap around
        let _ = self
            .memory_usage
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |usage| Some(usage.saturating_sub(size)));
    }

    /// Remove the resource called `name`; no-op if it is not registered
    pub fn remove(&self, name: &str) {
        let removed = {
            let mut maps = self.maps.write();
            maps.by_name
                .remove(name)
                .and_then(|handle| maps.by_handle.remove(&handle))
        };
        if let Some(resource) = removed {
            self.finish_remove(&resource);
        }
    }

    /// Remove the resource with `handle`; no-op if it is not registered
    pub fn remove_by_handle(&self, handle: ResourceHandle) {
        let removed = {
            let mut maps = self.maps.write();
            let resource = maps.by_handle.remove(&handle);
            if let Some(resource) = &resource {
                maps.by_name.remove(resource.name());
            }
            resource
        };
        if let Some(resource) = removed {
            self.finish_remove(&resource);
        }
    }

    fn finish_remove(&self, resource: &SharedResource) {
        resource.unload(|size| self.release(size));
        log::debug!("Removed {} '{}' ({})", self.resource_type, resource.name(), resource.handle());

        if let Some(listener) = &self.listener {
            listener.on_resource_removed(resource);
        }
    }

    /// Remove every resource, with a single notification
    pub fn remove_all(&self) {
        let removed = std::mem::take(&mut *self.maps.write());

        for resource in removed.by_handle.values() {
            resource.unload(|size| self.release(size));
        }
        log::info!("Removed all {} resources ({})", self.resource_type, removed.by_handle.len());

        if let Some(listener) = &self.listener {
            listener.on_all_resources_removed(&self.resource_type);
        }
    }

    /// Remove every resource nobody else holds; returns how many were removed
    pub fn remove_unreferenced_resources(&self) -> usize {
        let removed: Vec<SharedResource> = {
            let mut guard = self.maps.write();
            let maps = &mut *guard;
            let handles: Vec<ResourceHandle> = maps
                .by_handle
                .iter()
                .filter(|(_, resource)| Arc::strong_count(resource) == 1)
                .map(|(handle, _)| *handle)
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| maps.by_handle.remove(&handle))
                .inspect(|resource| {
                    maps.by_name.remove(resource.name());
                })
                .collect()
        };

        for resource in &removed {
            self.finish_remove(resource);
        }
        removed.len()
    }

    /// Unload the resource called `name`; no-op if missing or not loaded
    pub fn unload(&self, name: &str) {
        if let Some(resource) = self.get_by_name(name) {
            self.unload_resource(&resource);
        }
    }

    /// Unload the resource with `handle`; no-op if missing or not loaded
    pub fn unload_by_handle(&self, handle: ResourceHandle) {
        if let Some(resource) = self.get_by_handle(handle) {
            self.unload_resource(&resource);
        }
    }

    fn unload_resource(&self, resource: &Resource) {
        resource.unload(|size| self.release(size));
    }

    /// Unload every resource, keeping them registered
    pub fn unload_all(&self) {
        for resource in self.resources() {
            self.unload_resource(&resource);
        }
    }

    /// Unload every loaded resource nobody else holds
    pub fn unload_unreferenced_resources(&self) {
        self.evict_unreferenced(0, None);
    }

    /// Unload (if loaded) and load the resource called `name` again
    pub fn reload(&self, name: &str) -> Result<SharedResource, ResourceError> {
        let resource = self
            .get_by_name(name)
            .ok_or_else(|| ResourceError::not_found("resource", name))?;
        if !resource.is_reloadable() {
            return Err(ResourceError::NotReloadable(name.to_string()));
        }

        self.unload_resource(&resource);
        self.load_resource(&resource)?;
        Ok(resource)
    }

    /// Send every reloadable resource back through its load path
    ///
    /// Manual resources without a loader are skipped. A failure does not stop
    /// the remaining reloads; the first error is returned.
    pub fn reload_all(&self) -> Result<(), ResourceError> {
        let mut first_error = None;

        for resource in self.resources() {
            if !resource.is_reloadable() {
                log::debug!("Skipping reload of manual {} '{}'", self.resource_type, resource.name());
                continue;
            }

            self.unload_resource(&resource);
            if let Err(err) = self.load_resource(&resource) {
                log::warn!("Reload of {} '{}' failed: {}", self.resource_type, resource.name(), err);
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Change the budget and re-evaluate usage immediately
    pub fn set_memory_budget(&self, bytes: usize) {
        self.memory_budget.store(bytes, Ordering::Release);
        self.check_usage();
    }

    /// Evict unreferenced resources while usage is above the budget
    pub fn check_usage(&self) {
        let budget = self.memory_budget();
        if self.memory_usage() > budget {
            log::debug!(
                "{} usage {} bytes exceeds budget {} bytes",
                self.resource_type,
                self.memory_usage(),
                budget
            );
            self.evict_unreferenced(budget, None);
        }
    }

    /// Bytes held by loaded resources
    pub fn memory_usage(&self) -> usize {
        self.memory_usage.load(Ordering::Acquire)
    }

    /// Current budget in bytes (`usize::MAX` when unbounded)
    pub fn memory_budget(&self) -> usize {
        self.memory_budget.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("resource_type", &self.resource_type)
            .field("resource_count", &self.resource_count())
            .field("memory_usage", &self.memory_usage())
            .field("memory_budget", &self.memory_budget())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::payloads::{ProgramFactory, ProgramSource};
    use crate::resources::{Archive, DataStream, LoadingState, MemoryArchive};
    use parking_lot::Mutex;

    struct SingleArchive(MemoryArchive);

    impl ArchiveProvider for SingleArchive {
        fn find(&self, _group: &str, pattern: &str) -> Result<Vec<String>, ResourceError> {
            self.0.find(pattern)
        }

        fn open(&self, _group: &str, filename: &str) -> Result<DataStream, ResourceError> {
            self.0.open(filename)
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    impl ResourceListener for RecordingListener {
        fn on_resource_created(&self, resource: &SharedResource) {
            self.events.lock().push(format!("created {}", resource.name()));
        }

        fn on_resource_removed(&self, resource: &SharedResource) {
            self.events.lock().push(format!("removed {}", resource.name()));
        }

        fn on_all_resources_removed(&self, resource_type: &str) {
            self.events.lock().push(format!("all {}", resource_type));
        }
    }

    fn manager_with(files: &[(&str, &str)], budget: Option<usize>) -> ResourceManager {
        let archive = files
            .iter()
            .fold(MemoryArchive::new("test"), |archive, (name, data)| archive.with_file(*name, *data));
        let config = ResourceConfig { memory_budget: budget };

        ResourceManager::new(ProgramSource::RESOURCE_TYPE, Box::new(ProgramFactory), &config)
            .with_provider(Arc::new(SingleArchive(archive)))
    }

    fn manager() -> ResourceManager {
        manager_with(&[("A", "aaaa"), ("B", "bbbbbbbb")], None)
    }

    #[test]
    fn test_handles_increase_and_both_lookups_agree() {
        let manager = manager();
        let mut last = 0;

        for name in ["A", "B", "C", "D"] {
            let resource = manager.create(name, "General", false, None).unwrap();
            assert!(resource.handle().value() > last);
            last = resource.handle().value();

            let by_name = manager.get_by_name(name).unwrap();
            let by_handle = manager.get_by_handle(resource.handle()).unwrap();
            assert!(Arc::ptr_eq(&by_name, &by_handle));
            assert!(Arc::ptr_eq(&by_name, &resource));
        }
        assert_eq!(manager.resource_count(), 4);
    }

    #[test]
    fn test_duplicate_name_leaves_maps_unchanged() {
        let manager = manager();
        let first = manager.create("A", "General", false, None).unwrap();

        let err = manager.create("A", "Other", true, None).unwrap_err();
        assert!(matches!(err, ResourceError::DuplicateItem { kind: "resource", .. }));

        assert_eq!(manager.resource_count(), 1);
        assert!(Arc::ptr_eq(&manager.get_by_name("A").unwrap(), &first));
        assert_eq!(manager.get_by_name("A").unwrap().group(), "General");
        assert!(manager.get_by_handle(ResourceHandle::new(2)).is_none());

        // No handle was consumed by the failed call
        let next = manager.create("B", "General", false, None).unwrap();
        assert_eq!(next.handle(), ResourceHandle::new(2));
    }

    #[test]
    fn test_handle_collision_rolls_back_name() {
        let manager = manager();
        let first = manager.create("A", "General", false, None).unwrap();

        let params = ResourceParams {
            name: "other",
            handle: first.handle(),
            group: "General",
            is_manual: true,
            loader: None,
        };
        let clash: SharedResource = Arc::new(Resource::new(&params, "GpuProgram", Box::new(ProgramSource::default())));

        let err = manager.add_impl(&clash).unwrap_err();
        assert!(matches!(err, ResourceError::DuplicateItem { kind: "handle", .. }));

        assert!(!manager.maps.read().by_name.contains_key("other"));
        assert!(manager.get_by_name("other").is_none());
        assert_eq!(manager.resource_count(), 1);
        assert!(Arc::ptr_eq(&manager.get_by_handle(first.handle()).unwrap(), &first));
    }

    #[test]
    fn test_create_or_retrieve() {
        let manager = manager();
        let (created, is_new) = manager.create_or_retrieve("A", "General", false, None).unwrap();
        assert!(is_new);

        let (existing, is_new) = manager.create_or_retrieve("A", "General", false, None).unwrap();
        assert!(!is_new);
        assert!(Arc::ptr_eq(&created, &existing));
    }

    #[test]
    fn test_remove_and_remove_missing() {
        let listener = Arc::new(RecordingListener::default());
        let manager = manager().with_listener(listener.clone());

        manager.create("A", "General", false, None).unwrap();
        manager.load("A").unwrap();
        assert_eq!(manager.memory_usage(), 4);

        manager.remove("A");
        assert!(manager.get_by_name("A").is_none());
        assert!(manager.get_by_handle(ResourceHandle::new(1)).is_none());
        assert_eq!(manager.memory_usage(), 0);

        manager.remove("A");
        manager.remove("never-existed");
        manager.remove_by_handle(ResourceHandle::new(99));

        assert_eq!(*listener.events.lock(), vec!["created A", "removed A"]);
    }

    #[test]
    fn test_remove_all_notifies_once() {
        let listener = Arc::new(RecordingListener::default());
        let manager = manager().with_listener(listener.clone());

        manager.create("A", "General", false, None).unwrap();
        manager.create("B", "General", false, None).unwrap();
        listener.events.lock().clear();

        manager.remove_all();

        assert_eq!(manager.resource_count(), 0);
        assert!(manager.resources().is_empty());
        assert_eq!(*listener.events.lock(), vec!["all GpuProgram"]);
    }

    #[test]
    fn test_unload_is_idempotent() {
        let manager = manager();
        manager.create("A", "General", false, None).unwrap();
        manager.create("B", "General", false, None).unwrap();
        manager.load("A").unwrap();
        manager.load("B").unwrap();
        assert_eq!(manager.memory_usage(), 12);

        manager.unload("A");
        let after_first = manager.memory_usage();
        manager.unload("A");

        assert_eq!(after_first, 8);
        assert_eq!(manager.memory_usage(), 8);
        assert_eq!(manager.get_by_name("A").unwrap().state(), LoadingState::Unloaded);
    }

    #[test]
    fn test_concurrent_load_unload_keeps_usage_consistent() {
        let manager = manager();
        manager.create("A", "General", false, None).unwrap();
        manager.create("B", "General", false, None).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let manager = &manager;
                scope.spawn(move || {
                    for i in 0..500 {
                        let name = if (worker + i) % 2 == 0 { "A" } else { "B" };
                        if (worker + i) % 3 == 0 {
                            manager.unload(name);
                        } else {
                            manager.load(name).unwrap();
                        }
                    }
                });
            }
        });

        let loaded: usize = manager
            .resources()
            .iter()
            .filter(|r| r.is_loaded())
            .map(|r| r.size())
            .sum();
        assert_eq!(manager.memory_usage(), loaded);

        manager.unload_all();
        assert_eq!(manager.memory_usage(), 0);
    }

    #[test]
    fn test_load_missing_stream_fails() {
        let manager = manager();
        manager.create("missing", "General", false, None).unwrap();

        assert!(matches!(manager.load("missing"), Err(ResourceError::Io(_))));
        assert!(matches!(manager.load("unregistered"), Err(ResourceError::ItemNotFound { .. })));
        assert_eq!(manager.memory_usage(), 0);
    }

    #[test]
    fn test_reload_skips_manual_without_loader() {
        let manager = manager();
        manager.create("A", "General", false, None).unwrap();
        manager.create("manual", "General", true, None).unwrap();

        manager.reload_all().unwrap();
        assert!(manager.get_by_name("A").unwrap().is_loaded());
        assert!(!manager.get_by_name("manual").unwrap().is_loaded());

        assert!(matches!(manager.reload("manual"), Err(ResourceError::NotReloadable(_))));
    }

    #[test]
    fn test_end_to_end_lifecycle() {
        let manager = manager();
        let a = manager.create("A", "General", false, None).unwrap();
        let b = manager.create("B", "General", false, None).unwrap();
        assert_eq!(a.handle(), ResourceHandle::new(1));
        assert_eq!(b.handle(), ResourceHandle::new(2));

        manager.unload_all();
        assert_eq!(a.state(), LoadingState::Unloaded);
        assert_eq!(b.state(), LoadingState::Unloaded);

        manager.reload_all().unwrap();
        assert_eq!(a.state(), LoadingState::Loaded);
        assert_eq!(b.state(), LoadingState::Loaded);

        manager.remove_all();
        assert!(manager.get_by_name("A").is_none());
        assert!(manager.get_by_name("B").is_none());
        assert_eq!(manager.memory_usage(), 0);
    }

    #[test]
    fn test_budget_evicts_unreferenced_resources() {
        let files = [("a", "0123456789"), ("b", "0123456789abcde"), ("c", "0123456789abcdefghij")];
        let manager = manager_with(&files, Some(30));
        for name in ["a", "b", "c"] {
            manager.create(name, "General", false, None).unwrap();
        }

        manager.load("a").unwrap();
        manager.load("b").unwrap();
        assert_eq!(manager.memory_usage(), 25);

        let c = manager.load("c").unwrap();
        assert!(c.is_loaded());
        assert!(!manager.get_by_name("a").unwrap().is_loaded());
        assert!(!manager.get_by_name("b").unwrap().is_loaded());
        assert_eq!(manager.memory_usage(), 20);
    }

    #[test]
    fn test_budget_exceeded_when_nothing_can_be_evicted() {
        let manager = manager_with(&[("a", "0123456789"), ("b", "0123456789")], Some(15));
        manager.create("a", "General", false, None).unwrap();
        manager.create("b", "General", false, None).unwrap();

        let held = manager.load("a").unwrap();
        let err = manager.load("b").unwrap_err();

        assert!(matches!(
            err,
            ResourceError::MemoryBudgetExceeded {
                requested: 10,
                budget: 15,
                usage: 10
            }
        ));
        assert!(held.is_loaded());
        assert!(!manager.get_by_name("b").unwrap().is_loaded());
        assert!(manager.memory_usage() <= manager.memory_budget());
    }

    #[test]
    fn test_set_memory_budget_reevaluates_usage() {
        let manager = manager();
        manager.create("A", "General", false, None).unwrap();
        manager.create("B", "General", false, None).unwrap();
        let held = manager.load("A").unwrap();
        manager.load("B").unwrap();

        manager.set_memory_budget(5);
        assert_eq!(manager.memory_budget(), 5);
        assert!(held.is_loaded());
        assert!(!manager.get_by_name("B").unwrap().is_loaded());
        assert_eq!(manager.memory_usage(), 4);
    }

    #[test]
    fn test_unreferenced_resources() {
        let manager = manager();
        let held = manager.create("A", "General", false, None).unwrap();
        manager.create("B", "General", false, None).unwrap();
        manager.load("A").unwrap();
        manager.load("B").unwrap();

        manager.unload_unreferenced_resources();
        assert!(held.is_loaded());
        assert!(!manager.get_by_name("B").unwrap().is_loaded());

        assert_eq!(manager.remove_unreferenced_resources(), 1);
        assert!(manager.resource_exists("A"));
        assert!(!manager.resource_exists("B"));
    }
}
