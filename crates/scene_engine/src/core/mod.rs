//! # Core Engine Module
//!
//! Shared configuration for the engine subsystems.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for logging, resources and partitioning

pub mod config;

pub use config::{EngineConfig, LoggingConfig, PartitionConfig, ResourceConfig};
pub use crate::config::{Config, ConfigError, ConfigFormat};
