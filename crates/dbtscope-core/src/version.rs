//! Manifest schema version detection and capabilities
//!
//! dbt has shipped a dozen manifest schema revisions; field names and the
//! presence of the native lineage maps vary across them. Detection never
//! fails: an unrecognized or missing version string resolves to the latest
//! known version, on the assumption that newer manifests carry all modern
//! capabilities.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Highest manifest schema version this crate knows about.
///
/// Unrecognized version strings fall back to this value rather than
/// being rejected.
pub const LATEST_KNOWN_VERSION: u32 = 12;

/// Node definition layout for a given schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStructure {
    /// v4+ layout (`compiled_code`, `raw_code`, ...)
    Modern,

    /// pre-v4 layout (`compiled_sql`, `raw_sql`, ...)
    Legacy,
}

impl std::fmt::Display for NodeStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modern => write!(f, "modern"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Where the manifest keeps its metadata block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLocation {
    /// Under a top-level `metadata` key (v1+)
    Metadata,

    /// At the document root (v0 only)
    Root,
}

impl std::fmt::Display for MetadataLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata => write!(f, "metadata"),
            Self::Root => write!(f, "root"),
        }
    }
}

/// Capability profile for a detected manifest schema version.
///
/// Immutable once constructed; one instance drives a whole refresh.
/// Serialized with camelCase keys so the stored profile is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCapabilities {
    /// The detected schema version number
    pub version: u32,

    /// Whether this version ships a native `parent_map`
    pub has_parent_map: bool,

    /// Whether this version ships a native `child_map`
    pub has_child_map: bool,

    /// Node definition layout
    pub node_structure: NodeStructure,

    /// Metadata block location
    pub metadata_location: MetadataLocation,
}

impl SchemaCapabilities {
    /// Build the capability profile for a schema version.
    ///
    /// Native lineage maps and the modern node layout both arrived in v4.
    /// Only v0 kept metadata at the document root; that boundary is a
    /// fixed rule, not inferred.
    pub fn new(version: u32) -> Self {
        Self {
            version,
            has_parent_map: version >= 4,
            has_child_map: version >= 4,
            node_structure: if version >= 4 {
                NodeStructure::Modern
            } else {
                NodeStructure::Legacy
            },
            metadata_location: if version >= 1 {
                MetadataLocation::Metadata
            } else {
                MetadataLocation::Root
            },
        }
    }
}

impl std::fmt::Display for SchemaCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dbt schema v{}", self.version)
    }
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"v(\d+)").expect("version pattern"))
}

/// Detect the manifest schema version from its declared version string.
///
/// The declared string is URI-like, e.g.
/// `https://schemas.getdbt.com/dbt/manifest/v7.json`; the first `v<digits>`
/// run wins. A missing or non-matching string resolves to
/// [`LATEST_KNOWN_VERSION`] — malformed versions are never an error.
pub fn detect_version(schema_version: Option<&str>) -> u32 {
    let version = schema_version
        .and_then(|raw| version_pattern().captures(raw))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(LATEST_KNOWN_VERSION);

    tracing::info!(version, "detected dbt manifest schema version");
    version
}
