//! Objects that can be attached to scene nodes
//!
//! A [`MovableObject`] is the unit a scene node carries: it has world-space
//! bounds (which drive the node's bounds) and zero or more [`Renderable`]s
//! that end up in the render queue when the object is visible.

use crate::resources::ResourceHandle;
use crate::scene::AABB;
use bitflags::bitflags;

bitflags! {
    /// Visibility categories used to include or exclude objects per query
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VisibilityFlags: u32 {
        /// Regular scene geometry
        const GEOMETRY = 1 << 0;
        /// Effects and overlays drawn in the world
        const EFFECTS = 1 << 1;
        /// Debug helpers
        const DEBUG = 1 << 2;
        /// Every category
        const ALL = u32::MAX;
    }
}

/// Identifier of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(pub u32);

/// A single draw submission source: a mesh rendered with a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Renderable {
    /// Mesh resource to draw
    pub mesh: ResourceHandle,
    /// Pass used to draw it
    pub pass: PassId,
}

impl Renderable {
    /// Create a new renderable
    pub fn new(mesh: ResourceHandle, pass: PassId) -> Self {
        Self { mesh, pass }
    }
}

/// Object attachable to a scene node
#[derive(Debug, Clone, PartialEq)]
pub struct MovableObject {
    /// Name, unique among the objects of one node
    pub name: String,
    /// World-space bounds
    pub bounds: AABB,
    /// Renderables submitted when the object is visible
    pub renderables: Vec<Renderable>,
    /// Whether this object is visible
    pub visible: bool,
    /// Categories this object belongs to
    pub flags: VisibilityFlags,
}

impl MovableObject {
    /// Create a visible object in the `GEOMETRY` category
    pub fn new(name: impl Into<String>, bounds: AABB) -> Self {
        Self {
            name: name.into(),
            bounds,
            renderables: Vec::new(),
            visible: true,
            flags: VisibilityFlags::GEOMETRY,
        }
    }

    /// Add a renderable
    pub fn with_renderable(mut self, renderable: Renderable) -> Self {
        self.renderables.push(renderable);
        self
    }

    /// Replace the visibility categories
    pub fn with_flags(mut self, flags: VisibilityFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Check if this object should be rendered for a query mask
    pub fn should_render(&self, mask: VisibilityFlags) -> bool {
        self.visible && self.flags.intersects(mask)
    }
}
