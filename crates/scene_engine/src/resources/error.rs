//! Resource subsystem errors

use thiserror::Error;

/// Resource Manager errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A name or handle is already registered
    #[error("Duplicate {kind}: {name}")]
    DuplicateItem {
        /// What collided (`"resource"`, `"handle"`, `"resource group"`)
        kind: &'static str,
        /// The colliding key
        name: String,
    },

    /// A required item (manager, group, archive) does not exist
    #[error("{kind} not found: {name}")]
    ItemNotFound {
        /// What was looked up
        kind: &'static str,
        /// The key that missed
        name: String,
    },

    /// Archive or stream failure, passed through untouched
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream content could not be parsed
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Loading would leave usage above the budget
    #[error("Memory budget exceeded: requested {requested} bytes, budget {budget} bytes, in use {usage} bytes")]
    MemoryBudgetExceeded {
        /// Size of the resource being loaded
        requested: usize,
        /// Current budget
        budget: usize,
        /// Usage without the resource being loaded
        usage: usize,
    },

    /// Manual resource without a loader cannot be loaded again
    #[error("Resource is not reloadable: {0}")]
    NotReloadable(String),
}

impl ResourceError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::ItemNotFound { kind, name: name.into() }
    }

    pub(crate) fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateItem { kind, name: name.into() }
    }
}
