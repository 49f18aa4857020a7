//! # Scene Engine
//!
//! Resource lifecycle management and octree scene partitioning for a
//! real-time 3D engine.
//!
//! ## Features
//!
//! - **Resource Management**: name and handle registries per resource type,
//!   memory budgets with eviction, group-based bulk loading
//! - **Archives**: file system and in-memory sources with wildcard search
//! - **Spatial Partitioning**: loose octree with automatic node reinsertion
//!   and frustum culling into a render queue
//! - **Strategies**: pluggable level-of-detail strategies and zone factories
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!
//!     engine.resource_groups().add_resource_location(
//!         DEFAULT_GROUP,
//!         MemoryArchive::new("builtin").with_file("tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n"),
//!     );
//!     let mesh = engine.meshes().create("tri.obj", DEFAULT_GROUP, false, None)?;
//!     engine.meshes().load("tri.obj")?;
//!
//!     let bounds = AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0));
//!     let object = MovableObject::new("triangle", bounds)
//!         .with_renderable(Renderable::new(mesh.handle(), PassId(0)));
//!
//!     let node = engine.scene_mut().create_node("triangle");
//!     let root = engine.scene().root();
//!     engine.scene_mut().add_child(root, node)?;
//!     engine.scene_mut().attach_object(node, object)?;
//!
//!     let view = AABB::new(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));
//!     let queue = engine.render_queue(&view, VisibilityFlags::ALL);
//!     assert_eq!(queue.len(), 1);
//!
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod resources;
pub mod scene;
pub mod spatial;
pub mod strategy;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::{Config, EngineConfig, LoggingConfig, PartitionConfig, ResourceConfig},
        foundation::{
            collections::{CellId, NodeId},
            math::{Mat4, Vec3},
        },
        resources::{
            Archive, FileSystemArchive, LoadingState, ManualResourceLoader, MemoryArchive, ResourceError,
            ResourceGroupManager, ResourceHandle, ResourceManager, SharedResource, DEFAULT_GROUP,
        },
        scene::{Frustum, MovableObject, PassId, RenderQueue, Renderable, VisibilityFlags, VisibilityVolume, AABB},
        spatial::{ChildRef, OctreeSceneManager, SceneError},
        strategy::{LodStrategy, Strategy, StrategyRegistry, ZoneFactory},
        Engine, EngineError,
    };
}
