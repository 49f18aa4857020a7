//! Resource handles and their allocator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Small unique integer identifying a resource within a manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceHandle(u64);

impl ResourceHandle {
    /// Wrap a raw handle value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw handle value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues monotonically increasing handles, starting at 1
///
/// Values are never reused for the lifetime of the allocator, even after the
/// resource that held them is removed.
#[derive(Debug)]
pub struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    /// Create an allocator whose first handle is 1
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Allocate the next handle
    pub fn allocate(&self) -> ResourceHandle {
        ResourceHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Handle the next call to [`allocate`](Self::allocate) will return
    pub fn peek(&self) -> ResourceHandle {
        ResourceHandle(self.next.load(Ordering::Relaxed))
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_handles_start_at_one_and_increase() {
        let allocator = HandleAllocator::new();
        assert_eq!(allocator.peek(), ResourceHandle::new(1));

        let first = allocator.allocate();
        let second = allocator.allocate();
        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);
        assert!(second > first);
        assert_eq!(allocator.peek().value(), 3);
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let allocator = Arc::new(HandleAllocator::new());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                std::thread::spawn(move || (0..250).map(|_| allocator.allocate()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<ResourceHandle> = threads
            .into_iter()
            .flat_map(|t| t.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }
}
