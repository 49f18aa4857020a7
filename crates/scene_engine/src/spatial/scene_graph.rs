//! Scene node hierarchy
//!
//! Nodes live in a slot map keyed by [`NodeId`]. Parent and child links are
//! keys, so detaching a subtree never invalidates the nodes in it. The graph
//! knows nothing about the octree; it only records the cell a node is in.

use crate::foundation::collections::{CellId, NodeId, SlotMap};
use crate::scene::{MovableObject, AABB};
use crate::spatial::SceneError;

/// A node of the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) objects: Vec<MovableObject>,
    pub(crate) local_bounds: Option<AABB>,
    pub(crate) cell: Option<CellId>,
}

impl SceneNode {
    fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            objects: Vec::new(),
            local_bounds: None,
            cell: None,
        }
    }

    /// Node name (not required to be unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, `None` for the root and for detached nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in attachment order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attached objects
    pub fn objects(&self) -> &[MovableObject] {
        &self.objects
    }

    /// Look up an attached object by name
    pub fn object(&self, name: &str) -> Option<&MovableObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Union of the attached objects' bounds; children are not included
    pub fn local_bounds(&self) -> Option<AABB> {
        self.local_bounds
    }

    /// Octree cell the node is a member of
    pub fn cell(&self) -> Option<CellId> {
        self.cell
    }

    /// Recompute [`local_bounds`](Self::local_bounds) from the attached objects
    pub(crate) fn recompute_bounds(&mut self) -> Option<AABB> {
        self.local_bounds = self
            .objects
            .iter()
            .map(|o| o.bounds)
            .reduce(|acc, b| acc.merged(&b));
        self.local_bounds
    }
}

/// Arena of scene nodes with a fixed root
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    root: NodeId,
}

impl SceneGraph {
    /// Create a graph holding only the root node
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new("root".to_string()));
        Self { nodes, root }
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Number of nodes, root and detached nodes included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Create a detached node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(SceneNode::new(name.into()))
    }

    /// Whether `node` is connected to the root
    pub fn is_in_scene(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Make `child` a child of `parent`
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.get(parent)?;
        let child_node = self.get(child)?;
        if child == self.root || child_node.parent.is_some() {
            return Err(SceneError::AlreadyParented(child_node.name.clone()));
        }

        // Attaching an ancestor below its own descendant would create a cycle
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(SceneError::CycleDetected(child_node.name.clone()));
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }

        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Index of the first child of `parent` called `name`
    pub fn child_index(&self, parent: NodeId, name: &str) -> Option<usize> {
        let parent = self.nodes.get(parent)?;
        parent
            .children
            .iter()
            .position(|c| self.nodes.get(*c).is_some_and(|n| n.name == name))
    }

    /// Detach the child at `index`; returns it
    pub fn detach_child(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let parent = self.nodes.get_mut(parent)?;
        if index >= parent.children.len() {
            return None;
        }
        let child = parent.children.remove(index);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        Some(child)
    }

    /// `node` and all its descendants, parents before children
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.get(id) {
                order.push(id);
                stack.extend(n.children.iter().rev());
            }
        }
        order
    }

    /// Remove `node` and its descendants from the arena
    ///
    /// The node must already be detached from its parent.
    pub(crate) fn destroy_subtree(&mut self, node: NodeId) -> Vec<SceneNode> {
        self.subtree(node)
            .into_iter()
            .filter_map(|id| self.nodes.remove(id))
            .collect()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_detach() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_node("a");
        let b = graph.create_node("b");

        assert!(!graph.is_in_scene(a));
        graph.attach_child(root, a).unwrap();
        graph.attach_child(a, b).unwrap();
        assert!(graph.is_in_scene(b));
        assert_eq!(graph.subtree(root), vec![root, a, b]);

        assert_eq!(graph.child_index(root, "a"), Some(0));
        assert_eq!(graph.detach_child(root, 0), Some(a));
        assert!(!graph.is_in_scene(b));
        assert_eq!(graph.node(a).unwrap().parent(), None);
        assert_eq!(graph.detach_child(root, 0), None);
    }

    #[test]
    fn test_rejects_double_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.attach_child(root, a).unwrap();
        graph.attach_child(a, b).unwrap();

        assert!(matches!(graph.attach_child(root, b), Err(SceneError::AlreadyParented(_))));
        assert!(graph.attach_child(b, root).is_err());
        assert_eq!(graph.node(root).unwrap().children(), &[a]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.attach_child(a, b).unwrap();

        assert!(matches!(graph.attach_child(b, a), Err(SceneError::CycleDetected(_))));
    }

    #[test]
    fn test_destroy_subtree() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.attach_child(a, b).unwrap();

        let removed = graph.destroy_subtree(a);
        assert_eq!(removed.len(), 2);
        assert!(graph.node(b).is_none());
        assert!(graph.is_empty());
    }
}
