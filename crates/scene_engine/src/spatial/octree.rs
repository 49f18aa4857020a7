//! Loose octree over scene nodes
//!
//! Cells live in a slot map and refer to each other by [`CellId`]; a cell
//! owns its children in the sense that destroying it destroys its subtree.
//! Children are created on demand when a node small enough to fit them is
//! inserted, and pruned again once their subtree is empty.
//!
//! **Placement rules**:
//! - A node belongs in the deepest cell reachable by following the octant of
//!   its center, as long as its box is at most half the cell size on every
//!   axis and the depth limit is not reached
//! - A node stays valid in its cell while its center is inside the cell
//!   region and its size is smaller than the cell size
//! - Nodes outside the root region live in the root
//! - A node that outgrows its cell climbs to the nearest ancestor it fits
//!   before descending again
//!
//! Culling tests each cell's loose bounds (the region grown by half its size
//! on every side), since members may stick out of their cell by that much.

use crate::foundation::collections::{CellId, NodeId, SlotMap};
use crate::foundation::math::{all_le, all_lt, Vec3};
use crate::scene::{VisibilityVolume, AABB};

/// One cell of the octree
#[derive(Debug, Clone)]
pub struct OctreeCell {
    region: AABB,
    depth: u32,
    parent: Option<CellId>,
    children: [Option<CellId>; 8],
    nodes: Vec<NodeId>,
    /// Members in this cell and all descendants
    subtree_count: usize,
}

impl OctreeCell {
    fn new(region: AABB, depth: u32, parent: Option<CellId>) -> Self {
        Self {
            region,
            depth,
            parent,
            children: [None; 8],
            nodes: Vec::new(),
            subtree_count: 0,
        }
    }

    /// Region covered by this cell
    pub fn region(&self) -> AABB {
        self.region
    }

    /// Region grown by half its size, used for culling
    pub fn loose_bounds(&self) -> AABB {
        self.region.expanded(self.region.extents())
    }

    /// Depth below the root (root is 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Parent cell, `None` for the root
    pub fn parent(&self) -> Option<CellId> {
        self.parent
    }

    /// Existing child cells
    pub fn children(&self) -> impl Iterator<Item = CellId> + '_ {
        self.children.iter().flatten().copied()
    }

    /// Nodes that are members of this cell
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Members of this cell and all its descendants
    pub fn subtree_count(&self) -> usize {
        self.subtree_count
    }
}

/// Octant index of `point` relative to `center`: bit 0 = +x, bit 1 = +y, bit 2 = +z
fn octant(point: &Vec3, center: &Vec3) -> usize {
    usize::from(point.x > center.x) | usize::from(point.y > center.y) << 1 | usize::from(point.z > center.z) << 2
}

fn octant_region(parent: &AABB, index: usize) -> AABB {
    let center = parent.center();
    let pick = |bit: usize, low: f32, mid: f32, high: f32| {
        if index & bit == 0 {
            (low, mid)
        } else {
            (mid, high)
        }
    };

    let (min_x, max_x) = pick(1, parent.min.x, center.x, parent.max.x);
    let (min_y, max_y) = pick(2, parent.min.y, center.y, parent.max.y);
    let (min_z, max_z) = pick(4, parent.min.z, center.z, parent.max.z);
    AABB::new(Vec3::new(min_x, min_y, min_z), Vec3::new(max_x, max_y, max_z))
}

/// Octree arena
#[derive(Debug, Clone)]
pub struct Octree {
    cells: SlotMap<CellId, OctreeCell>,
    root: CellId,
    max_depth: u32,
}

impl Octree {
    /// Create an octree covering `region` with at most `max_depth` levels
    /// below the root
    pub fn new(region: AABB, max_depth: u32) -> Self {
        let mut cells = SlotMap::with_key();
        let root = cells.insert(OctreeCell::new(region, 0, None));
        Self { cells, root, max_depth }
    }

    /// Root cell
    pub fn root(&self) -> CellId {
        self.root
    }

    /// Region covered by the root cell
    pub fn region(&self) -> AABB {
        self.cells[self.root].region
    }

    /// Maximum subdivision depth
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Look up a cell
    pub fn cell(&self, id: CellId) -> Option<&OctreeCell> {
        self.cells.get(id)
    }

    /// Number of live cells, root included
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total number of member nodes
    pub fn node_count(&self) -> usize {
        self.cells[self.root].subtree_count
    }

    /// Whether a node with `bounds` may stay in `cell`
    ///
    /// The root accepts everything, so nodes outside the world stay put.
    pub fn fits(&self, cell: CellId, bounds: &AABB) -> bool {
        if cell == self.root {
            return true;
        }
        self.cells.get(cell).is_some_and(|c| {
            c.region.contains_point(bounds.center()) && all_lt(&bounds.size(), &c.region.size())
        })
    }

    /// Insert a node, descending from `start`; returns the receiving cell
    pub fn insert(&mut self, node: NodeId, bounds: &AABB, start: CellId) -> CellId {
        let start = if self.cells.contains_key(start) { start } else { self.root };
        let target = self.descend(start, bounds);
        self.attach(node, target);
        target
    }

    /// Remove a node from `cell`, pruning cells left empty
    pub fn remove(&mut self, node: NodeId, cell: CellId) -> bool {
        let Some(entry) = self.cells.get_mut(cell) else {
            return false;
        };
        let Some(position) = entry.nodes.iter().position(|n| *n == node) else {
            return false;
        };
        entry.nodes.swap_remove(position);

        let mut current = Some(cell);
        while let Some(id) = current {
            let c = &mut self.cells[id];
            c.subtree_count -= 1;
            current = c.parent;
        }

        self.prune(cell);
        true
    }

    /// Move a node that no longer fits `from`
    ///
    /// The search restarts at the nearest ancestor of `from` the node fits
    /// (center inside and smaller than the cell, the root if none is). The
    /// node is attached to its new cell before it leaves the old one; both
    /// happen within this call.
    pub fn relocate(&mut self, node: NodeId, from: CellId, bounds: &AABB) -> CellId {
        if !self.cells.contains_key(from) {
            return self.insert(node, bounds, self.root);
        }

        let start = self.nearest_fitting_ancestor(from, bounds);
        let target = self.descend(start, bounds);
        if target != from {
            self.attach(node, target);
            self.remove(node, from);
        }
        target
    }

    /// Nearest cell at or above `cell` that a node with `bounds` fits
    pub fn nearest_fitting_ancestor(&self, cell: CellId, bounds: &AABB) -> CellId {
        let mut current = Some(cell);
        while let Some(id) = current {
            if self.fits(id, bounds) {
                return id;
            }
            current = self.cells.get(id).and_then(|c| c.parent);
        }
        self.root
    }

    /// Drop every member and every cell below the root
    pub fn clear(&mut self) {
        let children: Vec<CellId> = self.cells[self.root].children().collect();
        for child in children {
            self.destroy_subtree(child);
        }

        let root = &mut self.cells[self.root];
        root.children = [None; 8];
        root.nodes.clear();
        root.subtree_count = 0;
    }

    /// Visit non-empty cells whose loose bounds intersect `volume`
    ///
    /// The root is never rejected. Subtrees without members are skipped.
    pub fn walk_visible<F>(&self, volume: &dyn VisibilityVolume, mut visit: F)
    where
        F: FnMut(&OctreeCell),
    {
        self.walk_cell(self.root, volume, &mut visit);
    }

    fn walk_cell<F>(&self, id: CellId, volume: &dyn VisibilityVolume, visit: &mut F)
    where
        F: FnMut(&OctreeCell),
    {
        let Some(cell) = self.cells.get(id) else {
            return;
        };
        if cell.subtree_count == 0 {
            return;
        }
        if cell.parent.is_some() && !volume.intersects_aabb(&cell.loose_bounds()) {
            return;
        }

        visit(cell);
        for child in cell.children() {
            self.walk_cell(child, volume, visit);
        }
    }

    /// Follow octants from `start` while the node is small enough for a child
    fn descend(&mut self, start: CellId, bounds: &AABB) -> CellId {
        let center = bounds.center();
        let size = bounds.size();
        let mut current = start;

        loop {
            let cell = &self.cells[current];
            let half = cell.region.extents();
            if cell.depth >= self.max_depth || !cell.region.contains_point(center) || !all_le(&size, &half) {
                return current;
            }

            let index = octant(&center, &cell.region.center());
            let existing = cell.children[index];
            current = match existing {
                Some(child) => child,
                None => self.create_child(current, index),
            };
        }
    }

    fn create_child(&mut self, parent: CellId, index: usize) -> CellId {
        let (region, depth) = {
            let p = &self.cells[parent];
            (octant_region(&p.region, index), p.depth + 1)
        };
        let child = self.cells.insert(OctreeCell::new(region, depth, Some(parent)));
        self.cells[parent].children[index] = Some(child);
        child
    }

    fn attach(&mut self, node: NodeId, cell: CellId) {
        self.cells[cell].nodes.push(node);

        let mut current = Some(cell);
        while let Some(id) = current {
            let c = &mut self.cells[id];
            c.subtree_count += 1;
            current = c.parent;
        }
    }

    /// Destroy empty cells from `cell` upwards, stopping at the root
    fn prune(&mut self, cell: CellId) {
        let mut current = cell;
        while current != self.root {
            let Some(c) = self.cells.get(current) else {
                return;
            };
            if c.subtree_count > 0 {
                return;
            }

            let parent = c.parent;
            if let Some(parent) = parent.and_then(|p| self.cells.get_mut(p)) {
                for slot in &mut parent.children {
                    if *slot == Some(current) {
                        *slot = None;
                    }
                }
            }
            self.destroy_subtree(current);

            match parent {
                Some(p) => current = p,
                None => return,
            }
        }
    }

    fn destroy_subtree(&mut self, cell: CellId) {
        if let Some(removed) = self.cells.remove(cell) {
            for child in removed.children.iter().flatten() {
                self.destroy_subtree(*child);
            }
        }
    }
}
