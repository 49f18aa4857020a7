//! Resource groups: named collections used for bulk lifecycle operations
//!
//! The group manager sits between the per-type resource managers and the
//! archives:
//!
//! ```text
//! ResourceManager ──notifications──▶ ResourceGroupManager ──▶ Archives
//!        ▲                                   │
//!        └──────── load / unload / remove ───┘ (Weak)
//! ```
//!
//! Group membership is built purely from [`ResourceListener`] notifications
//! and is stored as names, never as resource references, so it does not keep
//! resources alive or count as a client reference.

use super::{
    compile_pattern, Archive, ArchiveProvider, DataStream, ResourceError, ResourceListener, ResourceManager,
    ScriptLoader, SharedResource,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::sync::{Arc, Weak};

/// Group every engine starts with
pub const DEFAULT_GROUP: &str = "General";

#[derive(Default)]
struct ResourceGroup {
    locations: Vec<Box<dyn Archive>>,
    /// Resource type → names of member resources
    members: BTreeMap<String, BTreeSet<String>>,
    initialised: bool,
}

impl ResourceGroup {
    fn member_list(&self) -> Vec<(String, String)> {
        self.members
            .iter()
            .flat_map(|(resource_type, names)| names.iter().map(move |name| (resource_type.clone(), name.clone())))
            .collect()
    }
}

/// Tracks groups, their archive locations and the managers that own their
/// resources
pub struct ResourceGroupManager {
    groups: RwLock<BTreeMap<String, ResourceGroup>>,
    managers: RwLock<BTreeMap<String, Weak<ResourceManager>>>,
    script_loaders: RwLock<Vec<Arc<dyn ScriptLoader>>>,
}

impl ResourceGroupManager {
    /// Create a manager holding only the default group
    pub fn new() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(DEFAULT_GROUP.to_string(), ResourceGroup::default());

        Self {
            groups: RwLock::new(groups),
            managers: RwLock::new(BTreeMap::new()),
            script_loaders: RwLock::new(Vec::new()),
        }
    }

    // ===== Groups =====

    /// Create an empty group
    pub fn create_resource_group(&self, name: &str) -> Result<(), ResourceError> {
        let mut groups = self.groups.write();
        if groups.contains_key(name) {
            return Err(ResourceError::duplicate("resource group", name));
        }
        groups.insert(name.to_string(), ResourceGroup::default());
        log::info!("Created resource group '{}'", name);
        Ok(())
    }

    /// Add an archive to the search path of `group`, creating the group if
    /// needed
    pub fn add_resource_location(&self, group: &str, archive: impl Archive + 'static) {
        log::info!("Added location '{}' to resource group '{}'", archive.name(), group);
        self.groups
            .write()
            .entry(group.to_string())
            .or_default()
            .locations
            .push(Box::new(archive));
    }

    /// Whether a group exists
    pub fn resource_group_exists(&self, name: &str) -> bool {
        self.groups.read().contains_key(name)
    }

    /// Names of all groups
    pub fn resource_groups(&self) -> Vec<String> {
        self.groups.read().keys().cloned().collect()
    }

    /// `(resource type, name)` pairs of the resources in a group
    pub fn list_resources(&self, group: &str) -> Result<Vec<(String, String)>, ResourceError> {
        self.with_group(group, ResourceGroup::member_list)
    }

    /// Whether [`initialise_resource_group`](Self::initialise_resource_group)
    /// has run for a group
    pub fn is_resource_group_initialised(&self, group: &str) -> bool {
        self.groups.read().get(group).is_some_and(|g| g.initialised)
    }

    fn with_group<R>(&self, group: &str, f: impl FnOnce(&ResourceGroup) -> R) -> Result<R, ResourceError> {
        self.groups
            .read()
            .get(group)
            .map(f)
            .ok_or_else(|| ResourceError::not_found("resource group", group))
    }

    /// Remove every resource of a group from its manager, keeping the group
    /// and its locations
    pub fn clear_resource_group(&self, group: &str) -> Result<(), ResourceError> {
        // The removals notify back into this manager, so no lock is held here
        let members = self.list_resources(group)?;
        for (resource_type, name) in &members {
            match self.resource_manager(resource_type) {
                Ok(manager) => manager.remove(name),
                Err(err) => log::warn!("Skipping '{}' while clearing group '{}': {}", name, group, err),
            }
        }

        if let Some(entry) = self.groups.write().get_mut(group) {
            entry.members.clear();
            entry.initialised = false;
        }
        log::info!("Cleared resource group '{}' ({} resources)", group, members.len());
        Ok(())
    }

    /// Clear a group and forget it
    pub fn destroy_resource_group(&self, group: &str) -> Result<(), ResourceError> {
        self.clear_resource_group(group)?;
        self.groups.write().remove(group);
        log::info!("Destroyed resource group '{}'", group);
        Ok(())
    }

    /// Load every resource of a group
    pub fn load_resource_group(&self, group: &str) -> Result<(), ResourceError> {
        let members = self.list_resources(group)?;
        log::info!("Loading resource group '{}' ({} resources)", group, members.len());

        for (resource_type, name) in &members {
            self.resource_manager(resource_type)?.load(name)?;
        }
        Ok(())
    }

    /// Unload every resource of a group, keeping them registered
    pub fn unload_resource_group(&self, group: &str) -> Result<(), ResourceError> {
        let members = self.list_resources(group)?;
        log::info!("Unloading resource group '{}'", group);

        for (resource_type, name) in &members {
            self.resource_manager(resource_type)?.unload(name);
        }
        Ok(())
    }

    // ===== Resource managers =====

    /// Register the manager for its resource type
    ///
    /// Only a weak reference is kept; the engine assembly owns the manager.
    pub fn register_resource_manager(&self, manager: &Arc<ResourceManager>) {
        let resource_type = manager.resource_type().to_string();
        let previous = self
            .managers
            .write()
            .insert(resource_type.clone(), Arc::downgrade(manager));

        if previous.is_some() {
            log::warn!("Replacing resource manager for type '{}'", resource_type);
        } else {
            log::debug!("Registered resource manager for type '{}'", resource_type);
        }
    }

    /// Forget the manager for a resource type
    pub fn unregister_resource_manager(&self, resource_type: &str) {
        if self.managers.write().remove(resource_type).is_some() {
            log::debug!("Unregistered resource manager for type '{}'", resource_type);
        }
    }

    /// Manager for a resource type
    pub fn resource_manager(&self, resource_type: &str) -> Result<Arc<ResourceManager>, ResourceError> {
        self.managers
            .read()
            .get(resource_type)
            .and_then(Weak::upgrade)
            .ok_or_else(|| ResourceError::not_found("resource manager", resource_type))
    }

    // ===== Scripts =====

    /// Register a loader for definition scripts
    pub fn register_script_loader(&self, loader: Arc<dyn ScriptLoader>) {
        log::debug!("Registered script loader for {:?}", loader.script_patterns());
        self.script_loaders.write().push(loader);
    }

    /// Parse every script in a group with the loaders whose patterns match,
    /// in loading order; returns the number of scripts parsed
    pub fn initialise_resource_group(&self, group: &str) -> Result<usize, ResourceError> {
        let mut loaders: Vec<Arc<dyn ScriptLoader>> = self.script_loaders.read().clone();
        loaders.sort_by(|a, b| a.loading_order().total_cmp(&b.loading_order()));

        let mut parsed = 0;
        for loader in &loaders {
            for pattern in loader.script_patterns() {
                for filename in self.find(group, &pattern)? {
                    log::debug!("Parsing script '{}' in group '{}'", filename, group);
                    let stream = self.open(group, &filename)?;
                    loader.parse_script(stream, &filename, group)?;
                    parsed += 1;
                }
            }
        }

        if let Some(entry) = self.groups.write().get_mut(group) {
            entry.initialised = true;
        }
        log::info!("Initialised resource group '{}' ({} scripts)", group, parsed);
        Ok(parsed)
    }
}

impl Default for ResourceGroupManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceGroupManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGroupManager")
            .field("groups", &self.resource_groups())
            .field("managers", &self.managers.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ResourceListener for ResourceGroupManager {
    fn on_resource_created(&self, resource: &SharedResource) {
        self.groups
            .write()
            .entry(resource.group().to_string())
            .or_default()
            .members
            .entry(resource.resource_type().to_string())
            .or_default()
            .insert(resource.name().to_string());
    }

    fn on_resource_removed(&self, resource: &SharedResource) {
        if let Some(group) = self.groups.write().get_mut(resource.group()) {
            if let Some(names) = group.members.get_mut(resource.resource_type()) {
                names.remove(resource.name());
            }
        }
    }

    fn on_all_resources_removed(&self, resource_type: &str) {
        for group in self.groups.write().values_mut() {
            group.members.remove(resource_type);
        }
    }
}

impl ArchiveProvider for ResourceGroupManager {
    fn find(&self, group: &str, pattern: &str) -> Result<Vec<String>, ResourceError> {
        // Validate once up front so a bad pattern fails even for an empty group
        compile_pattern(pattern)?;

        let groups = self.groups.read();
        let entry = groups
            .get(group)
            .ok_or_else(|| ResourceError::not_found("resource group", group))?;

        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        for archive in &entry.locations {
            for name in archive.find(pattern)? {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    fn open(&self, group: &str, filename: &str) -> Result<DataStream, ResourceError> {
        let groups = self.groups.read();
        let entry = groups
            .get(group)
            .ok_or_else(|| ResourceError::not_found("resource group", group))?;

        match entry.locations.iter().find(|archive| archive.exists(filename)) {
            Some(archive) => archive.open(filename),
            None => Err(ResourceError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' not found in resource group '{}'", filename, group),
            ))),
        }
    }
}
