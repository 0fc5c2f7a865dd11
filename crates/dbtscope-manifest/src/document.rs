//! dbt manifest.json document
//!
//! The manifest's top-level shape has been stable across schema revisions
//! (`metadata`, `nodes`, `sources`, `macros`, optional `parent_map` and
//! `child_map`), but the entity definitions inside it vary, so they are kept
//! as raw JSON and normalized later by [`crate::fields`]. Every top-level
//! key is optional — presence is the only thing checked at parse time.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use dbtscope_core::{detect_version, SchemaCapabilities};

/// A parsed dbt manifest document.
///
/// Read-only after parsing; ingestion traverses it exactly once per refresh.
/// `nodes`, `sources` and `macros` preserve document order, which fixes the
/// iteration order lineage reconstruction depends on.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ManifestDoc {
    /// Manifest metadata block (v1+; absent or at the root in v0)
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Model, test and other node definitions, keyed by unique_id
    #[serde(default)]
    pub nodes: Map<String, Value>,

    /// Source definitions, keyed by unique_id
    #[serde(default)]
    pub sources: Map<String, Value>,

    /// Macro definitions, keyed by unique_id
    #[serde(default)]
    pub macros: Map<String, Value>,

    /// Native parent map (node -> upstream nodes), v4+
    #[serde(default)]
    pub parent_map: HashMap<String, Vec<String>>,

    /// Native child map (node -> downstream nodes), v4+
    #[serde(default)]
    pub child_map: HashMap<String, Vec<String>>,
}

impl ManifestDoc {
    /// Load a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse a manifest from a JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// The manifest's own declared schema version string, if any
    pub fn schema_version(&self) -> Option<&str> {
        self.metadata.get("dbt_schema_version").and_then(Value::as_str)
    }

    /// Detect the schema version and build the capability profile for it
    pub fn detect_capabilities(&self) -> SchemaCapabilities {
        SchemaCapabilities::new(detect_version(self.schema_version()))
    }
}

/// Manifest parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}
