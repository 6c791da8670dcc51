//! Configuration module for similar-media.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument merging (see `cli`)
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{Config, DatabaseConfig, DetectionConfig, StorageBackend, StorageConfig};
pub use validation::validate_config;
