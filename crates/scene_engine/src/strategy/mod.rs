//! Strategy registries
//!
//! Level-of-detail strategies and zone factories are interchangeable policy
//! objects selected by name. Both families share [`StrategyRegistry`].

mod lod;
mod registry;
mod zone;

pub use lod::{DistanceLodStrategy, LodCamera, LodStrategy, LodStrategyManager, PixelCountLodStrategy};
pub use registry::{Strategy, StrategyRegistry};
pub use zone::{DefaultZone, DefaultZoneFactory, Zone, ZoneFactory, ZoneFactoryManager};

use thiserror::Error;

/// Strategy lookup errors
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A required strategy or factory is not registered
    #[error("{kind} not found: {name}")]
    ItemNotFound {
        /// Strategy family
        kind: &'static str,
        /// Name or type that missed
        name: String,
    },
}
