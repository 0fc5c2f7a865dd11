//! dbtscope core
//!
//! Version detection and capability profiles for dbt manifest schemas,
//! plus process configuration. Everything version-dependent in the rest
//! of the workspace is driven by the [`SchemaCapabilities`] value built
//! here, so the branching logic lives in exactly one place.

pub mod config;
pub mod version;

pub use config::{Config, ConfigError};
pub use version::{detect_version, MetadataLocation, NodeStructure, SchemaCapabilities, LATEST_KNOWN_VERSION};
