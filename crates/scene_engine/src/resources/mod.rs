//! Resource lifecycle and handle management
//!
//! ```text
//! client ── create(name) ──▶ ResourceManager ── allocate ──▶ HandleAllocator
//!                                 │  factory(params)
//!                                 ▼
//!                             Resource ── load ──▶ ArchiveProvider / ManualResourceLoader
//!                                 │
//!                                 └── notify ──▶ ResourceGroupManager
//! ```
//!
//! One [`ResourceManager`] exists per resource type. Resources are shared
//! with clients as [`SharedResource`] so the registry can unload them while
//! other holders still exist.

mod archive;
mod error;
mod group_manager;
mod handle;
mod resource;
mod resource_manager;
mod script;

pub mod payloads;

pub use archive::{compile_pattern, Archive, ArchiveProvider, DataStream, FileSystemArchive, MemoryArchive};
pub use error::ResourceError;
pub use group_manager::{ResourceGroupManager, DEFAULT_GROUP};
pub use handle::{HandleAllocator, ResourceHandle};
pub use resource::{
    LoadingState, ManualResourceLoader, Resource, ResourceFactory, ResourceParams, ResourcePayload, SharedResource,
};
pub use resource_manager::{ResourceListener, ResourceManager};
pub use script::{CapabilityScriptLoader, CapabilityTable, ScriptLoader};
