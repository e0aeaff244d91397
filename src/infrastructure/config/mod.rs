//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation and preflight checks

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX};
