//! # Unified Configuration System
//!
//! All configuration consumed by [`crate::Engine`] lives here. Every section
//! is serializable (TOML, RON) through the [`Config`] trait and has sensible
//! defaults, so a config file only needs to mention what it changes.
//!
//! ## Configuration Categories
//!
//! - **Logging Config**: default log filter
//! - **Resource Config**: memory budget for every resource manager
//! - **Partition Config**: octree world bounds and depth

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::foundation::math::vec3_from_array;
use crate::scene::AABB;

/// # Logging Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// # Resource Configuration
///
/// Settings applied to every resource manager the engine creates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Byte ceiling for loaded resources per manager (`None` = unbounded)
    pub memory_budget: Option<usize>,
}

impl ResourceConfig {
    /// Set the memory budget in bytes
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }
}

/// # Partition Configuration
///
/// Bounds and depth of the octree used by the scene manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Minimum corner of the partitioned world region
    pub world_min: [f32; 3],
    /// Maximum corner of the partitioned world region
    pub world_max: [f32; 3],
    /// Maximum subdivision depth (root is depth 0)
    pub max_depth: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            world_min: [-10000.0; 3],
            world_max: [10000.0; 3],
            max_depth: 8,
        }
    }
}

impl PartitionConfig {
    /// Set the world region
    pub fn with_world_bounds(mut self, min: [f32; 3], max: [f32; 3]) -> Self {
        self.world_min = min;
        self.world_max = max;
        self
    }

    /// Set the maximum depth
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// World region as a bounding box
    pub fn world_bounds(&self) -> AABB {
        AABB::new(vec3_from_array(self.world_min), vec3_from_array(self.world_max))
    }

    /// Validate the partition settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let degenerate = self
            .world_min
            .iter()
            .zip(self.world_max.iter())
            .any(|(min, max)| min >= max);
        if degenerate {
            return Err(ConfigError::Invalid(format!(
                "world bounds {:?}..{:?} are empty",
                self.world_min, self.world_max
            )));
        }
        if self.max_depth > 16 {
            return Err(ConfigError::Invalid(format!(
                "max_depth {} exceeds 16",
                self.max_depth
            )));
        }
        Ok(())
    }
}

/// # Engine Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Resource manager configuration
    pub resources: ResourceConfig,
    /// Scene partitioning configuration
    pub partition: PartitionConfig,
}

impl EngineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Set resource configuration
    pub fn with_resources(mut self, resources: ResourceConfig) -> Self {
        self.resources = resources;
        self
    }

    /// Set partition configuration
    pub fn with_partition(mut self, partition: PartitionConfig) -> Self {
        self.partition = partition;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.is_empty() {
            return Err(ConfigError::Invalid("log level cannot be empty".to_string()));
        }
        self.partition.validate()
    }
}

impl Config for EngineConfig {}
