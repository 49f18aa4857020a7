//! Zone types and the factories that create them
//!
//! Zones split a scene into regions with their own visibility behaviour.
//! Each zone type is produced by a [`ZoneFactory`]; the
//! [`ZoneFactoryManager`] picks the first registered factory that supports a
//! requested type.

use super::{Strategy, StrategyError, StrategyRegistry};
use std::fmt;

/// A scene region with its own visibility behaviour
pub trait Zone: fmt::Debug + Send + Sync {
    /// Zone name
    fn name(&self) -> &str;

    /// Type name of the factory family that created it
    fn zone_type(&self) -> &str;
}

/// Creates zones of the types it supports
pub trait ZoneFactory: Strategy + Send + Sync {
    /// Whether this factory can create zones of `zone_type`
    fn supports_zone_type(&self, zone_type: &str) -> bool;

    /// Create a zone; only called for supported types
    fn create_zone(&self, zone_type: &str, name: &str) -> Box<dyn Zone>;
}

/// Plain zone without special behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultZone {
    name: String,
}

impl Zone for DefaultZone {
    fn name(&self) -> &str {
        &self.name
    }

    fn zone_type(&self) -> &str {
        DefaultZoneFactory::ZONE_TYPE
    }
}

/// Factory for [`DefaultZone`]
#[derive(Debug, Default)]
pub struct DefaultZoneFactory;

impl DefaultZoneFactory {
    /// Registered factory name
    pub const NAME: &'static str = "default_zone_factory";
    /// Zone type produced by this factory
    pub const ZONE_TYPE: &'static str = "default";
}

impl Strategy for DefaultZoneFactory {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl ZoneFactory for DefaultZoneFactory {
    fn supports_zone_type(&self, zone_type: &str) -> bool {
        zone_type == Self::ZONE_TYPE
    }

    fn create_zone(&self, _zone_type: &str, name: &str) -> Box<dyn Zone> {
        Box::new(DefaultZone { name: name.to_string() })
    }
}

/// Registry of zone factories
#[derive(Debug)]
pub struct ZoneFactoryManager {
    registry: StrategyRegistry<dyn ZoneFactory>,
}

impl ZoneFactoryManager {
    /// Create a manager with the default factory registered
    pub fn new() -> Self {
        let mut registry: StrategyRegistry<dyn ZoneFactory> = StrategyRegistry::new("zone factory");
        registry.add_strategy(Box::new(DefaultZoneFactory));
        Self { registry }
    }

    /// Underlying registry
    pub fn registry(&self) -> &StrategyRegistry<dyn ZoneFactory> {
        &self.registry
    }

    /// Underlying registry, for adding or removing factories
    pub fn registry_mut(&mut self) -> &mut StrategyRegistry<dyn ZoneFactory> {
        &mut self.registry
    }

    /// Create a zone through the first factory supporting `zone_type`
    pub fn create_zone(&self, zone_type: &str, name: &str) -> Result<Box<dyn Zone>, StrategyError> {
        let (factory_name, factory) = self
            .registry
            .iter()
            .find(|(_, factory)| factory.supports_zone_type(zone_type))
            .ok_or_else(|| StrategyError::ItemNotFound {
                kind: "zone factory",
                name: zone_type.to_string(),
            })?;

        log::debug!("Creating {} zone '{}' with '{}'", zone_type, name, factory_name);
        Ok(factory.create_zone(zone_type, name))
    }
}

impl Default for ZoneFactoryManager {
    fn default() -> Self {
        Self::new()
    }
}
