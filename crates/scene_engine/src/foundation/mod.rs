//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types
//! - Arena keys for the scene and partition structures
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
