//! Render queue filled during visibility traversal
//!
//! Submissions are kept in insertion order; the render back end consumes
//! them once per frame. Grouping by pass is available for back ends that
//! want to minimize state changes.

use crate::scene::{PassId, Renderable};

/// Lights affecting a renderable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightList(pub Vec<u32>);

/// One `(pass, renderable, lights)` submission
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Pass to draw with
    pub pass: PassId,
    /// What to draw
    pub renderable: Renderable,
    /// Lights to apply, if any were gathered
    pub lights: Option<LightList>,
}

/// Submissions sharing one pass
#[derive(Debug, Clone)]
pub struct RenderBatch {
    /// Pass used by all entries in this batch
    pub pass: PassId,

    /// Renderables in submission order
    pub renderables: Vec<Renderable>,
}

impl RenderBatch {
    /// Create a new empty batch for a pass
    pub fn new(pass: PassId) -> Self {
        Self {
            pass,
            renderables: Vec::new(),
        }
    }

    /// Get the number of renderables in this batch
    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    /// Whether the batch has no renderables
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}

/// Ordered collection of submissions for one frame
#[derive(Debug, Default)]
pub struct RenderQueue {
    entries: Vec<QueueEntry>,
}

impl RenderQueue {
    /// Create an empty render queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a renderable
    pub fn add(&mut self, pass: PassId, renderable: Renderable, lights: Option<LightList>) {
        self.entries.push(QueueEntry { pass, renderable, lights });
    }

    /// Submissions in insertion order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Group submissions by pass, batches in first-seen order
    pub fn batches_by_pass(&self) -> Vec<RenderBatch> {
        let mut batches: Vec<RenderBatch> = Vec::new();

        for entry in &self.entries {
            match batches.iter_mut().find(|b| b.pass == entry.pass) {
                Some(batch) => batch.renderables.push(entry.renderable),
                None => {
                    let mut batch = RenderBatch::new(entry.pass);
                    batch.renderables.push(entry.renderable);
                    batches.push(batch);
                }
            }
        }

        batches
    }

    /// Number of submissions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been submitted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all submissions (start of a new frame)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
