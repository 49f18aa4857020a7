//! Arena keys for handle-based storage
//!
//! Scene nodes and octree cells live in slot maps. A node refers to its
//! cell (and a cell to its member nodes) by key only, so neither side owns
//! the other and a stale key simply fails to resolve.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable key of a scene node inside a [`crate::spatial::SceneGraph`]
    pub struct NodeId;

    /// Stable key of a partition cell inside a [`crate::spatial::Octree`]
    pub struct CellId;
}
