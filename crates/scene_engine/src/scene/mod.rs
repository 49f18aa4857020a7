//! Scene primitives
//!
//! Bounding volumes, the objects nodes carry, and the render queue the
//! visibility traversal fills.
//!
//! ```text
//! Scene nodes (spatial)
//!      ↓  visible objects
//! Render Queue (this module)
//!      ↓
//! Render back end (external)
//! ```

mod bounds;
mod render_queue;
mod renderable_object;

pub use bounds::{Frustum, Plane, VisibilityVolume, AABB};
pub use render_queue::{LightList, QueueEntry, RenderBatch, RenderQueue};
pub use renderable_object::{MovableObject, PassId, Renderable, VisibilityFlags};
