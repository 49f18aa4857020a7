//! Name-keyed registry of interchangeable strategies

use super::StrategyError;
use std::collections::BTreeMap;
use std::fmt;

/// A policy object selected by name
pub trait Strategy {
    /// Key the strategy is registered under
    fn name(&self) -> &str;
}

/// Registry owning strategies of one family
///
/// Registering a strategy under a name that is already taken replaces the
/// previous one (last write wins). The displaced strategy is handed back to
/// the caller and a warning is logged, so the replacement is never silent.
pub struct StrategyRegistry<S: ?Sized + Strategy> {
    kind: &'static str,
    strategies: BTreeMap<String, Box<S>>,
}

impl<S: ?Sized + Strategy> StrategyRegistry<S> {
    /// Create an empty registry; `kind` names the family in logs and errors
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            strategies: BTreeMap::new(),
        }
    }

    /// Register a strategy under its own name
    pub fn add_strategy(&mut self, strategy: Box<S>) -> Option<Box<S>> {
        let name = strategy.name().to_string();
        let previous = self.strategies.insert(name.clone(), strategy);

        if previous.is_some() {
            log::warn!("Replacing {} '{}'", self.kind, name);
        } else {
            log::debug!("Registered {} '{}'", self.kind, name);
        }
        previous
    }

    /// Detach a strategy and hand ownership back to the caller
    pub fn remove_strategy(&mut self, name: &str) -> Option<Box<S>> {
        self.strategies.remove(name)
    }

    /// Drop every strategy
    pub fn remove_all_strategies(&mut self) {
        log::debug!("Removing all {}s ({})", self.kind, self.strategies.len());
        self.strategies.clear();
    }

    /// Look up a strategy
    pub fn get_strategy(&self, name: &str) -> Option<&S> {
        self.strategies.get(name).map(Box::as_ref)
    }

    /// Look up a strategy that must exist
    pub fn require(&self, name: &str) -> Result<&S, StrategyError> {
        self.get_strategy(name).ok_or_else(|| StrategyError::ItemNotFound {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    /// Traverse the registry in name order
    ///
    /// The iterator borrows the registry, so it always sees a consistent
    /// mapping; clone it to restart.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &S)> + Clone + '_ {
        self.strategies.iter().map(|(name, strategy)| (name.as_str(), strategy.as_ref()))
    }

    /// Registered names in order
    pub fn names(&self) -> Vec<String> {
        self.strategies.keys().cloned().collect()
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Family name
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl<S: ?Sized + Strategy> fmt::Debug for StrategyRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("kind", &self.kind)
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counted {
        name: String,
        tag: u32,
        drops: Arc<AtomicUsize>,
    }

    impl Strategy for Counted {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted(name: &str, tag: u32, drops: &Arc<AtomicUsize>) -> Box<Counted> {
        Box::new(Counted {
            name: name.to_string(),
            tag,
            drops: Arc::clone(drops),
        })
    }

    #[test]
    fn test_last_write_wins() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut registry: StrategyRegistry<Counted> = StrategyRegistry::new("test strategy");

        assert!(registry.add_strategy(counted("a", 1, &drops)).is_none());
        let displaced = registry.add_strategy(counted("a", 2, &drops)).unwrap();

        assert_eq!(displaced.tag, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_strategy("a").unwrap().tag, 2);
    }

    #[test]
    fn test_remove_returns_ownership() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut registry: StrategyRegistry<Counted> = StrategyRegistry::new("test strategy");
        registry.add_strategy(counted("a", 1, &drops));

        let removed = registry.remove_strategy("a").unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert!(registry.get_strategy("a").is_none());
        assert!(registry.remove_strategy("a").is_none());

        drop(removed);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_all_drops_everything() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut registry: StrategyRegistry<Counted> = StrategyRegistry::new("test strategy");
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            registry.add_strategy(counted(name, i as u32, &drops));
        }

        registry.remove_all_strategies();

        assert!(registry.is_empty());
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        for name in ["a", "b", "c"] {
            assert!(registry.get_strategy(name).is_none());
        }
        assert!(matches!(registry.require("a"), Err(StrategyError::ItemNotFound { .. })));
    }

    #[test]
    fn test_iterator_is_restartable() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut registry: StrategyRegistry<Counted> = StrategyRegistry::new("test strategy");
        registry.add_strategy(counted("b", 2, &drops));
        registry.add_strategy(counted("a", 1, &drops));

        let iter = registry.iter();
        let first: Vec<&str> = iter.clone().map(|(name, _)| name).collect();
        let second: Vec<u32> = iter.map(|(_, s)| s.tag).collect();

        assert_eq!(first, vec!["a", "b"]);
        assert_eq!(second, vec![1, 2]);
    }
}
