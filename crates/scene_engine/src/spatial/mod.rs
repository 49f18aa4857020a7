//! Spatial partitioning
//!
//! ```text
//! OctreeSceneManager
//!   ├── SceneGraph   (node arena: hierarchy, attached objects, bounds)
//!   └── Octree       (cell arena: membership by node center)
//! ```
//!
//! A node refers to its cell by [`CellId`](crate::foundation::collections::CellId)
//! and a cell lists its members by
//! [`NodeId`](crate::foundation::collections::NodeId); neither owns the other.

mod octree;
mod scene_graph;
mod scene_manager;

pub use octree::{Octree, OctreeCell};
pub use scene_graph::{SceneGraph, SceneNode};
pub use scene_manager::{ChildRef, OctreeSceneManager};

use crate::foundation::collections::NodeId;
use thiserror::Error;

/// Scene graph and partitioning errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// The node key does not resolve (destroyed or never created)
    #[error("Scene node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The node already has a parent, or is the root
    #[error("Scene node already has a parent: {0}")]
    AlreadyParented(String),

    /// The attachment would make a node its own ancestor
    #[error("Attaching scene node '{0}' would create a cycle")]
    CycleDetected(String),

    /// The root node cannot be destroyed
    #[error("The root scene node cannot be destroyed")]
    RootNode,

    /// No object with this name is attached to the node
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// An object with this name is already attached to the node
    #[error("Duplicate object: {0}")]
    DuplicateObject(String),

    /// The partition region is empty or inverted
    #[error("Invalid partition region")]
    InvalidRegion,
}
