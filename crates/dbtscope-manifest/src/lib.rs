//! dbt manifest.json parsing and lineage extraction
//!
//! This crate handles:
//! - Parsing manifest.json into a loosely-typed document (entity definitions
//!   stay raw JSON, since their shape varies by schema version)
//! - Normalizing version-specific field names into canonical records
//! - Building parent/child lineage maps, natively (v4+) or reconstructed
//!   from per-node `depends_on` declarations (pre-v4)

pub mod document;
pub mod fields;
pub mod lineage;

pub use document::{ManifestDoc, ManifestError};
pub use fields::{MacroRecord, NodeRecord, SourceRecord};
pub use lineage::LineageMaps;
