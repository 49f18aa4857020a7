//! Resource identity and per-resource lifecycle
//!
//! A [`Resource`] couples an immutable identity (name, handle, group) with a
//! type-specific [`ResourcePayload`]. The payload sits behind a mutex, so at
//! most one load or unload runs per resource at a time, while the loading
//! state can still be read without blocking.
//!
//! ```text
//!            load()              success
//! Unloaded ───────────▶ Loading ───────────▶ Loaded
//!    ▲                     │ failure            │
//!    └─────────────────────┴────────────────────┘
//!                                  unload()
//! ```

use super::{ArchiveProvider, ResourceError, ResourceHandle};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared reference to a registered resource
pub type SharedResource = Arc<Resource>;

/// Loading state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LoadingState {
    /// Not loaded, no memory accounted
    Unloaded = 0,
    /// A load is in progress
    Loading = 1,
    /// Fully loaded, size accounted against the budget
    Loaded = 2,
}

impl LoadingState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Loading,
            2 => Self::Loaded,
            _ => Self::Unloaded,
        }
    }
}

/// Type-specific resource content
///
/// Implementations hold the loaded data of one resource type (mesh geometry,
/// program source, ...). The registry never looks inside; it only drives the
/// load/unload calls and reads the reported size.
pub trait ResourcePayload: Any + Send + Sync + fmt::Debug {
    /// Populate the payload from a data stream (default, non-manual path)
    fn load_from_stream(&mut self, stream: &mut dyn Read) -> Result<(), ResourceError>;

    /// Release loaded content
    fn unload(&mut self);

    /// Bytes of loaded content, counted against the memory budget
    fn size(&self) -> usize;

    /// Downcast to Any for type-specific access
    fn as_any(&self) -> &dyn Any;

    /// Downcast to Any for mutable type-specific access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// External loader for manually created resources
pub trait ManualResourceLoader: Send + Sync {
    /// Fill the payload of the resource called `name`
    fn load_resource(&self, name: &str, payload: &mut dyn ResourcePayload) -> Result<(), ResourceError>;
}

/// Arguments handed to a [`ResourceFactory`]
#[derive(Clone, Copy)]
pub struct ResourceParams<'a> {
    /// Resource name
    pub name: &'a str,
    /// Freshly allocated handle
    pub handle: ResourceHandle,
    /// Owning resource group
    pub group: &'a str,
    /// Whether the resource is loaded through a manual loader
    pub is_manual: bool,
    /// Manual loader, if any
    pub loader: Option<&'a Arc<dyn ManualResourceLoader>>,
}

/// Type-specific creation callback used by a resource manager
pub trait ResourceFactory: Send + Sync {
    /// Build an empty payload for a new resource
    fn create(&self, params: &ResourceParams<'_>) -> Result<Box<dyn ResourcePayload>, ResourceError>;
}

impl<F> ResourceFactory for F
where
    F: Fn(&ResourceParams<'_>) -> Result<Box<dyn ResourcePayload>, ResourceError> + Send + Sync,
{
    fn create(&self, params: &ResourceParams<'_>) -> Result<Box<dyn ResourcePayload>, ResourceError> {
        self(params)
    }
}

/// A loadable asset tracked by a resource manager
pub struct Resource {
    name: String,
    handle: ResourceHandle,
    group: String,
    resource_type: String,
    is_manual: bool,
    loader: Option<Arc<dyn ManualResourceLoader>>,
    state: AtomicU8,
    size: AtomicUsize,
    payload: Mutex<Box<dyn ResourcePayload>>,
}

impl Resource {
    pub(crate) fn new(
        params: &ResourceParams<'_>,
        resource_type: &str,
        payload: Box<dyn ResourcePayload>,
    ) -> Self {
        Self {
            name: params.name.to_string(),
            handle: params.handle,
            group: params.group.to_string(),
            resource_type: resource_type.to_string(),
            is_manual: params.is_manual,
            loader: params.loader.cloned(),
            state: AtomicU8::new(LoadingState::Unloaded as u8),
            size: AtomicUsize::new(0),
            payload: Mutex::new(payload),
        }
    }

    /// Unique name within the owning manager
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique handle within the owning manager
    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    /// Resource group this resource belongs to
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Type name of the owning manager
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Whether content comes from a manual loader instead of a stream
    pub fn is_manual(&self) -> bool {
        self.is_manual
    }

    /// Whether the resource can be loaded again after an unload
    pub fn is_reloadable(&self) -> bool {
        !self.is_manual || self.loader.is_some()
    }

    /// Current loading state
    pub fn state(&self) -> LoadingState {
        LoadingState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the resource is loaded
    pub fn is_loaded(&self) -> bool {
        self.state() == LoadingState::Loaded
    }

    /// Size reported by the last successful load (0 when unloaded)
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Read the payload as its concrete type
    ///
    /// Returns `None` if the payload is not a `T`.
    pub fn with_payload<T: ResourcePayload, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let payload = self.payload.lock();
        payload.as_any().downcast_ref::<T>().map(f)
    }

    fn set_state(&self, state: LoadingState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Load the resource; `Ok(Some(size))` when newly loaded, `Ok(None)` if
    /// it already was
    ///
    /// `account` receives the new size while the payload lock is still held.
    pub(crate) fn load(
        &self,
        provider: Option<&dyn ArchiveProvider>,
        account: impl FnOnce(usize),
    ) -> Result<Option<usize>, ResourceError> {
        let mut payload = self.payload.lock();
        if self.is_loaded() {
            return Ok(None);
        }

        self.set_state(LoadingState::Loading);
        match self.load_payload(&mut **payload, provider) {
            Ok(()) => {
                let size = payload.size();
                self.size.store(size, Ordering::Release);
                self.set_state(LoadingState::Loaded);
                account(size);
                log::debug!("Loaded {} '{}' ({}, {} bytes)", self.resource_type, self.name, self.handle, size);
                Ok(Some(size))
            }
            Err(err) => {
                payload.unload();
                self.set_state(LoadingState::Unloaded);
                log::warn!("Failed to load {} '{}': {}", self.resource_type, self.name, err);
                Err(err)
            }
        }
    }

    fn load_payload(
        &self,
        payload: &mut dyn ResourcePayload,
        provider: Option<&dyn ArchiveProvider>,
    ) -> Result<(), ResourceError> {
        if self.is_manual {
            return match &self.loader {
                Some(loader) => loader.load_resource(&self.name, payload),
                None => {
                    log::warn!(
                        "{} '{}' is manual but has no loader; its content must be supplied by the caller",
                        self.resource_type,
                        self.name
                    );
                    Ok(())
                }
            };
        }

        let provider = provider.ok_or_else(|| ResourceError::not_found("archive provider", &self.group))?;
        let mut stream = provider.open(&self.group, &self.name)?;
        payload.load_from_stream(&mut stream)
    }

    /// Unload the resource; returns the size released, `None` if it was not
    /// loaded. `release` runs under the payload lock.
    pub(crate) fn unload(&self, release: impl FnOnce(usize)) -> Option<usize> {
        let mut payload = self.payload.lock();
        if !self.is_loaded() {
            return None;
        }

        payload.unload();
        let size = self.size.swap(0, Ordering::AcqRel);
        self.set_state(LoadingState::Unloaded);
        release(size);
        log::debug!("Unloaded {} '{}' ({} bytes released)", self.resource_type, self.name, size);
        Some(size)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("group", &self.group)
            .field("resource_type", &self.resource_type)
            .field("is_manual", &self.is_manual)
            .field("state", &self.state())
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::payloads::ProgramSource;

    struct FixedLoader(&'static str);

    impl ManualResourceLoader for FixedLoader {
        fn load_resource(&self, _name: &str, payload: &mut dyn ResourcePayload) -> Result<(), ResourceError> {
            payload.load_from_stream(&mut self.0.as_bytes())
        }
    }

    fn manual_resource(loader: Option<Arc<dyn ManualResourceLoader>>) -> Resource {
        let params = ResourceParams {
            name: "shader.glsl",
            handle: ResourceHandle::new(1),
            group: "General",
            is_manual: true,
            loader: loader.as_ref(),
        };
        Resource::new(&params, "GpuProgram", Box::new(ProgramSource::default()))
    }

    #[test]
    fn test_manual_load_and_unload() {
        let resource = manual_resource(Some(Arc::new(FixedLoader("void main() {}"))));
        assert_eq!(resource.state(), LoadingState::Unloaded);

        let mut accounted = Vec::new();
        assert_eq!(resource.load(None, |size| accounted.push(size)).unwrap(), Some(14));
        assert_eq!(resource.state(), LoadingState::Loaded);
        assert_eq!(resource.size(), 14);

        // Second load is a no-op
        assert_eq!(resource.load(None, |size| accounted.push(size)).unwrap(), None);
        assert_eq!(accounted, vec![14]);

        let mut released = Vec::new();
        assert_eq!(resource.unload(|size| released.push(size)), Some(14));
        assert_eq!(resource.unload(|size| released.push(size)), None);
        assert_eq!(released, vec![14]);
        assert_eq!(resource.state(), LoadingState::Unloaded);
        assert_eq!(resource.size(), 0);
    }

    #[test]
    fn test_manual_without_loader_is_not_reloadable() {
        let resource = manual_resource(None);
        assert!(!resource.is_reloadable());

        assert_eq!(resource.load(None, |_| {}).unwrap(), Some(0));
        assert!(resource.is_loaded());
    }

    #[test]
    fn test_non_manual_without_provider_fails_and_stays_unloaded() {
        let params = ResourceParams {
            name: "missing.glsl",
            handle: ResourceHandle::new(2),
            group: "General",
            is_manual: false,
            loader: None,
        };
        let resource = Resource::new(&params, "GpuProgram", Box::new(ProgramSource::default()));

        assert!(matches!(resource.load(None, |_| {}), Err(ResourceError::ItemNotFound { .. })));
        assert_eq!(resource.state(), LoadingState::Unloaded);
    }

    #[test]
    fn test_with_payload_downcasts() {
        let resource = manual_resource(Some(Arc::new(FixedLoader("abc"))));
        resource.load(None, |_| {}).unwrap();

        let text = resource.with_payload(|p: &ProgramSource| p.source().to_string());
        assert_eq!(text.as_deref(), Some("abc"));
    }
}
