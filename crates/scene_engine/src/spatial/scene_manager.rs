//! Octree Scene Manager
//!
//! Owns the scene graph and the octree and keeps them consistent:
//! - A node is an octree member iff it is connected to the root and has at
//!   least one attached object
//! - A node's bounds are the union of its own objects' bounds
//! - When a node's bounds change so that it no longer fits its cell, it is
//!   moved within the same `&mut self` call, so no caller can observe it in
//!   two cells or in none
//!
//! Visibility queries walk the octree and push the renderables of visible
//! objects into a [`RenderQueue`] in traversal order.

use crate::core::PartitionConfig;
use crate::foundation::collections::{CellId, NodeId};
use crate::foundation::math::all_lt;
use crate::scene::{MovableObject, RenderQueue, VisibilityFlags, VisibilityVolume, AABB};
use crate::spatial::{Octree, SceneError, SceneGraph, SceneNode};

/// Which child to remove
#[derive(Debug, Clone, Copy)]
pub enum ChildRef<'a> {
    /// Position in the parent's child list
    Index(usize),
    /// First child with this name
    Name(&'a str),
}

/// Scene manager partitioning nodes with an octree
#[derive(Debug, Clone)]
pub struct OctreeSceneManager {
    graph: SceneGraph,
    octree: Octree,
}

impl OctreeSceneManager {
    /// Create a manager for the world region in `config`
    pub fn new(config: &PartitionConfig) -> Self {
        Self::with_region(config.world_bounds(), config.max_depth)
    }

    /// Create a manager for an explicit region
    pub fn with_region(region: AABB, max_depth: u32) -> Self {
        log::debug!(
            "Creating octree scene manager: {:?}..{:?}, depth {}",
            region.min.as_slice(),
            region.max.as_slice(),
            max_depth
        );
        Self {
            graph: SceneGraph::new(),
            octree: Octree::new(region, max_depth),
        }
    }

    /// The scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The octree
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        self.graph.root()
    }

    /// Look up a node
    pub fn node(&self, node: NodeId) -> Option<&SceneNode> {
        self.graph.node(node)
    }

    /// Cell `node` is a member of
    pub fn cell_of(&self, node: NodeId) -> Option<CellId> {
        self.graph.node(node).and_then(SceneNode::cell)
    }

    /// Number of nodes that are members of `cell` itself
    pub fn node_count_in(&self, cell: CellId) -> usize {
        self.octree.cell(cell).map_or(0, |c| c.nodes().len())
    }

    // ===== Hierarchy =====

    /// Create a detached node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.graph.create_node(name)
    }

    /// Attach `child` below `parent`; if the parent is in the scene, the
    /// child's subtree enters the octree
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.graph.attach_child(parent, child)?;

        if self.graph.is_in_scene(parent) {
            for node in self.graph.subtree(child) {
                self.place(node)?;
            }
        }
        Ok(())
    }

    /// Detach a child; its subtree leaves the octree but stays alive
    pub fn remove_child(&mut self, parent: NodeId, child: ChildRef<'_>) -> Option<NodeId> {
        let index = match child {
            ChildRef::Index(index) => index,
            ChildRef::Name(name) => self.graph.child_index(parent, name)?,
        };
        let child = self.graph.detach_child(parent, index)?;

        for node in self.graph.subtree(child) {
            self.leave_octree(node);
        }
        Some(child)
    }

    /// Destroy a node and its subtree
    pub fn destroy_node(&mut self, node: NodeId) -> Result<(), SceneError> {
        if node == self.graph.root() {
            return Err(SceneError::RootNode);
        }

        if let Some(parent) = self.graph.get(node)?.parent() {
            if let Some(index) = self.graph.get(parent)?.children().iter().position(|c| *c == node) {
                self.graph.detach_child(parent, index);
            }
        }
        for id in self.graph.subtree(node) {
            self.leave_octree(id);
        }

        let destroyed = self.graph.destroy_subtree(node);
        log::debug!("Destroyed {} scene node(s)", destroyed.len());
        Ok(())
    }

    /// Destroy everything below the root and detach the root's objects
    pub fn clear_scene(&mut self) {
        let root = self.graph.root();
        let children: Vec<NodeId> = self.graph.node(root).map(|r| r.children().to_vec()).unwrap_or_default();
        for child in children {
            if let Err(err) = self.destroy_node(child) {
                log::warn!("Failed to destroy scene node: {}", err);
            }
        }

        if let Ok(root) = self.graph.node_mut(root) {
            root.objects.clear();
            root.local_bounds = None;
            root.cell = None;
        }
        self.octree.clear();
        log::debug!("Scene cleared");
    }

    // ===== Objects =====

    /// Attach an object to a node
    pub fn attach_object(&mut self, node: NodeId, object: MovableObject) -> Result<(), SceneError> {
        let entry = self.graph.node_mut(node)?;
        if entry.object(&object.name).is_some() {
            return Err(SceneError::DuplicateObject(object.name));
        }
        entry.objects.push(object);
        self.update_bounds(node)
    }

    /// Detach an object from a node; returns it
    pub fn detach_object(&mut self, node: NodeId, name: &str) -> Result<MovableObject, SceneError> {
        let entry = self.graph.node_mut(node)?;
        let index = entry
            .objects
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
        let object = entry.objects.remove(index);

        self.update_bounds(node)?;
        Ok(object)
    }

    /// Move or resize an attached object
    pub fn set_object_bounds(&mut self, node: NodeId, name: &str, bounds: AABB) -> Result<(), SceneError> {
        let entry = self.graph.node_mut(node)?;
        let object = entry
            .objects
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
        object.bounds = bounds;

        self.update_bounds(node)
    }

    /// Recompute a node's bounds from its objects and fix its octree
    /// membership
    pub fn update_bounds(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.graph.node_mut(node)?.recompute_bounds();
        if self.graph.is_in_scene(node) {
            self.place(node)?;
        }
        Ok(())
    }

    /// Bring one in-scene node's membership in line with its bounds
    fn place(&mut self, node: NodeId) -> Result<(), SceneError> {
        let entry = self.graph.get(node)?;
        let (bounds, cell) = (entry.local_bounds(), entry.cell());

        let new_cell = match (bounds, cell) {
            (None, None) => None,
            (None, Some(cell)) => {
                self.octree.remove(node, cell);
                None
            }
            (Some(bounds), None) => Some(self.octree.insert(node, &bounds, self.octree.root())),
            (Some(bounds), Some(cell)) if self.octree.fits(cell, &bounds) => Some(cell),
            (Some(bounds), Some(cell)) => {
                let moved = self.octree.relocate(node, cell, &bounds);
                log::trace!(
                    "Node '{}' moved from depth {} to depth {}",
                    self.graph.get(node)?.name(),
                    self.octree.cell(cell).map_or(0, |c| c.depth()),
                    self.octree.cell(moved).map_or(0, |c| c.depth())
                );
                Some(moved)
            }
        };

        self.graph.node_mut(node)?.cell = new_cell;
        Ok(())
    }

    fn leave_octree(&mut self, node: NodeId) {
        if let Ok(entry) = self.graph.node_mut(node) {
            if let Some(cell) = entry.cell.take() {
                self.octree.remove(node, cell);
            }
        }
    }

    // ===== Queries =====

    /// Push the renderables of every visible object whose node intersects
    /// `volume` and whose flags match `mask`; returns the number of objects
    /// submitted
    pub fn find_visible_objects(
        &self,
        volume: &dyn VisibilityVolume,
        mask: VisibilityFlags,
        queue: &mut RenderQueue,
    ) -> usize {
        let mut submitted = 0;

        self.octree.walk_visible(volume, |cell| {
            for id in cell.nodes() {
                let Some(node) = self.graph.node(*id) else {
                    continue;
                };
                let Some(bounds) = node.local_bounds() else {
                    continue;
                };
                if !volume.intersects_aabb(&bounds) {
                    continue;
                }

                for object in node.objects().iter().filter(|o| o.should_render(mask)) {
                    for renderable in &object.renderables {
                        queue.add(renderable.pass, *renderable, None);
                    }
                    submitted += 1;
                }
            }
        });

        submitted
    }

    /// Rebuild the octree over a new region and reinsert every in-scene node
    pub fn resize(&mut self, region: AABB) -> Result<(), SceneError> {
        if !all_lt(&region.min, &region.max) {
            return Err(SceneError::InvalidRegion);
        }

        self.octree = Octree::new(region, self.octree.max_depth());
        let nodes = self.graph.subtree(self.graph.root());
        for node in &nodes {
            self.graph.node_mut(*node)?.cell = None;
        }
        for node in nodes {
            self.place(node)?;
        }

        log::debug!("Octree resized, {} node(s) reinserted", self.octree.node_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::resources::ResourceHandle;
    use crate::scene::{PassId, Renderable};

    fn manager() -> OctreeSceneManager {
        OctreeSceneManager::with_region(
            AABB::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0)),
            4,
        )
    }

    fn object_at(name: &str, x: f32, y: f32, z: f32, mesh: u64) -> MovableObject {
        MovableObject::new(name, AABB::from_center_extents(Vec3::new(x, y, z), Vec3::new(0.5, 0.5, 0.5)))
            .with_renderable(Renderable::new(ResourceHandle::new(mesh), PassId(0)))
    }

    #[test]
    fn test_bounds_come_from_objects_only() {
        let mut scene = manager();
        let parent = scene.create_node("parent");
        let child = scene.create_node("child");
        scene.add_child(scene.root(), parent).unwrap();
        scene.add_child(parent, child).unwrap();

        scene.attach_object(parent, object_at("a", 0.0, 0.0, 0.0, 1)).unwrap();
        scene.attach_object(child, object_at("b", 40.0, 0.0, 0.0, 2)).unwrap();

        let bounds = scene.node(parent).unwrap().local_bounds().unwrap();
        assert_eq!(bounds.max, Vec3::new(0.5, 0.5, 0.5));

        scene.attach_object(parent, object_at("c", 2.0, 0.0, 0.0, 3)).unwrap();
        let bounds = scene.node(parent).unwrap().local_bounds().unwrap();
        assert_eq!(bounds.max, Vec3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_detached_nodes_are_not_partitioned() {
        let mut scene = manager();
        let node = scene.create_node("loose");
        scene.attach_object(node, object_at("a", 10.0, 10.0, 10.0, 1)).unwrap();
        assert!(scene.cell_of(node).is_none());

        scene.add_child(scene.root(), node).unwrap();
        assert!(scene.cell_of(node).is_some());

        assert_eq!(scene.remove_child(scene.root(), ChildRef::Name("loose")), Some(node));
        assert!(scene.cell_of(node).is_none());
        assert_eq!(scene.octree().node_count(), 0);
        assert!(scene.remove_child(scene.root(), ChildRef::Index(0)).is_none());
    }

    #[test]
    fn test_moving_object_reinserts_node() {
        let mut scene = manager();
        let node = scene.create_node("ship");
        scene.add_child(scene.root(), node).unwrap();
        scene.attach_object(node, object_at("hull", 50.0, 50.0, 50.0, 1)).unwrap();

        let old_cell = scene.cell_of(node).unwrap();
        assert!(scene.octree().cell(old_cell).unwrap().region().contains_point(Vec3::new(50.0, 50.0, 50.0)));

        let far = AABB::from_center_extents(Vec3::new(-60.0, 20.0, -30.0), Vec3::new(0.5, 0.5, 0.5));
        scene.set_object_bounds(node, "hull", far).unwrap();

        let new_cell = scene.cell_of(node).unwrap();
        assert_ne!(new_cell, old_cell);
        assert!(scene.octree().cell(new_cell).unwrap().region().contains_point(far.center()));
        assert_eq!(scene.node_count_in(new_cell), 1);
        assert_eq!(scene.octree().node_count(), 1);
    }

    #[test]
    fn test_growing_object_in_place_stays_visible() {
        let mut scene = manager();
        let node = scene.create_node("ship");
        scene.add_child(scene.root(), node).unwrap();
        scene.attach_object(node, object_at("hull", 50.0, 50.0, 50.0, 1)).unwrap();

        let grown = AABB::from_center_extents(Vec3::new(50.0, 50.0, 50.0), Vec3::new(60.0, 60.0, 60.0));
        scene.set_object_bounds(node, "hull", grown).unwrap();

        let cell = scene.cell_of(node).unwrap();
        assert!(scene.octree().fits(cell, &grown));

        // Only the far corner of the grown hull reaches the origin
        let view = AABB::from_center_extents(Vec3::zeros(), Vec3::new(5.0, 5.0, 5.0));
        let mut queue = RenderQueue::new();
        assert_eq!(scene.find_visible_objects(&view, VisibilityFlags::ALL, &mut queue), 1);
    }

    #[test]
    fn test_detaching_last_object_leaves_octree() {
        let mut scene = manager();
        let node = scene.create_node("n");
        scene.add_child(scene.root(), node).unwrap();
        scene.attach_object(node, object_at("a", 1.0, 1.0, 1.0, 1)).unwrap();

        let object = scene.detach_object(node, "a").unwrap();
        assert_eq!(object.name, "a");
        assert!(scene.cell_of(node).is_none());
        assert!(scene.node(node).unwrap().local_bounds().is_none());

        assert!(matches!(scene.detach_object(node, "a"), Err(SceneError::ObjectNotFound(_))));
    }

    #[test]
    fn test_find_visible_objects_culls_and_masks() {
        let mut scene = manager();
        let near = scene.create_node("near");
        let far = scene.create_node("far");
        scene.add_child(scene.root(), near).unwrap();
        scene.add_child(scene.root(), far).unwrap();

        scene.attach_object(near, object_at("a", 10.0, 10.0, 10.0, 1)).unwrap();
        scene
            .attach_object(near, object_at("fx", 10.0, 10.0, 11.0, 2).with_flags(VisibilityFlags::EFFECTS))
            .unwrap();
        scene.attach_object(far, object_at("b", -80.0, -80.0, -80.0, 3)).unwrap();

        let view = AABB::from_center_extents(Vec3::new(10.0, 10.0, 10.0), Vec3::new(5.0, 5.0, 5.0));
        let mut queue = RenderQueue::new();

        assert_eq!(scene.find_visible_objects(&view, VisibilityFlags::ALL, &mut queue), 2);
        let meshes: Vec<u64> = queue.entries().iter().map(|e| e.renderable.mesh.value()).collect();
        assert_eq!(meshes, vec![1, 2]);

        queue.clear();
        assert_eq!(scene.find_visible_objects(&view, VisibilityFlags::GEOMETRY, &mut queue), 1);
        assert_eq!(queue.entries()[0].renderable.mesh.value(), 1);
        assert!(queue.entries()[0].lights.is_none());
    }

    #[test]
    fn test_destroy_node_and_resize() {
        let mut scene = manager();
        let a = scene.create_node("a");
        let b = scene.create_node("b");
        scene.add_child(scene.root(), a).unwrap();
        scene.add_child(a, b).unwrap();
        scene.attach_object(a, object_at("x", 5.0, 5.0, 5.0, 1)).unwrap();
        scene.attach_object(b, object_at("y", 500.0, 0.0, 0.0, 2)).unwrap();

        // Outside the world: lives in the root
        assert_eq!(scene.cell_of(b), Some(scene.octree().root()));

        scene
            .resize(AABB::new(Vec3::new(-1000.0, -1000.0, -1000.0), Vec3::new(1000.0, 1000.0, 1000.0)))
            .unwrap();
        assert_ne!(scene.cell_of(b), Some(scene.octree().root()));
        assert_eq!(scene.octree().node_count(), 2);

        assert!(matches!(scene.destroy_node(scene.root()), Err(SceneError::RootNode)));
        scene.destroy_node(a).unwrap();
        assert!(scene.node(b).is_none());
        assert_eq!(scene.octree().node_count(), 0);
        assert!(scene.graph().is_empty());
    }
}
