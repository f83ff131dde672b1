//! Configuration management infrastructure.
//!
//! Hierarchical configuration using `figment`:
//! - Programmatic defaults
//! - Optional YAML file
//! - `AUDITOR_`-prefixed environment variable overrides
//! - Post-load validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
