//! Manifest store: full-replace ingestion and read-only queries

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;

use dbtscope_core::SchemaCapabilities;
use dbtscope_manifest::{LineageMaps, MacroRecord, ManifestDoc, NodeRecord, SourceRecord};

use crate::error::StoreError;
use crate::schema;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Metadata keys written by the store itself. Original manifest metadata
/// keys are prefixed with `original_` to keep them out of this namespace.
const KEY_DETECTED_VERSION: &str = "detected_schema_version";
const KEY_CAPABILITIES: &str = "schema_capabilities";
const KEY_REFRESHED_AT: &str = "refreshed_at";
const ORIGINAL_KEY_PREFIX: &str = "original_";

/// SQLite-backed store for dbt manifest data.
///
/// Owns one long-lived connection; schema setup happens at construction.
/// Refresh replaces all persisted state inside a single transaction, so a
/// failed refresh leaves the previous state untouched. Not designed for
/// concurrent use — one writer at a time.
#[derive(Debug)]
pub struct ManifestStore {
    conn: Connection,
}

impl ManifestStore {
    /// Open (or create) a store at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(schema::SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Close the store, flushing the underlying connection
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    /// Refresh persisted manifest data from a manifest.json file.
    ///
    /// Full replace: everything previously persisted is cleared and
    /// rewritten inside one transaction. Any failure after the path check
    /// is wrapped uniformly, with the original cause preserved.
    pub fn refresh(&mut self, manifest_path: Option<&Path>) -> Result<RefreshSummary, StoreError> {
        let path = manifest_path.ok_or(StoreError::MissingManifestPath)?;
        self.refresh_inner(path)
            .map_err(|source| StoreError::Refresh { source })
    }

    fn refresh_inner(&mut self, path: &Path) -> Result<RefreshSummary, BoxError> {
        let manifest = ManifestDoc::from_file(path)?;
        let caps = manifest.detect_capabilities();
        let lineage = LineageMaps::build(&manifest, &caps);

        let tx = self.conn.transaction()?;

        tx.execute_batch(
            "DELETE FROM metadata;
             DELETE FROM nodes;
             DELETE FROM sources;
             DELETE FROM macros;
             DELETE FROM parent_map;
             DELETE FROM child_map;",
        )?;

        insert_metadata(&tx, &manifest, &caps)?;
        insert_nodes(&tx, &manifest)?;
        insert_sources(&tx, &manifest)?;
        insert_macros(&tx, &manifest)?;
        insert_lineage(&tx, &lineage)?;

        tx.commit()?;

        let summary = RefreshSummary {
            manifest_path: path.display().to_string(),
            version: caps.version,
            nodes: manifest.nodes.len(),
            sources: manifest.sources.len(),
            macros: manifest.macros.len(),
            parent_entries: lineage.parents.len(),
            child_entries: lineage.children.len(),
        };

        tracing::info!(
            version = summary.version,
            nodes = summary.nodes,
            sources = summary.sources,
            macros = summary.macros,
            "refreshed manifest data"
        );

        Ok(summary)
    }

    /// Direct upstream dependencies of a node, in stored order.
    ///
    /// An unknown identifier yields an empty list, same as a node with no
    /// parents.
    pub fn upstream_of(&self, node_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT parent_id FROM parent_map WHERE child_id = ?1 ORDER BY position")?;
        let ids = stmt
            .query_map(params![node_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Direct downstream dependents of a node, in stored order
    pub fn downstream_of(&self, node_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT child_id FROM child_map WHERE parent_id = ?1 ORDER BY position")?;
        let ids = stmt
            .query_map(params![node_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Detailed information about one node, including dependency counts.
    ///
    /// Unlike the lineage lookups, an unknown identifier here is an error.
    pub fn node_detail(&self, node_id: &str) -> Result<NodeDetail, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT unique_id, name, resource_type, package_name, path,
                        compiled_code, database_name, schema_name, alias
                 FROM nodes WHERE unique_id = ?1",
                params![node_id],
                |row| {
                    Ok(NodeDetail {
                        unique_id: row.get(0)?,
                        name: row.get(1)?,
                        resource_type: row.get(2)?,
                        package_name: row.get(3)?,
                        path: row.get(4)?,
                        compiled_code: row.get(5)?,
                        database: row.get(6)?,
                        schema: row.get(7)?,
                        alias: row.get(8)?,
                        parent_count: 0,
                        child_count: 0,
                    })
                },
            )
            .optional()?;

        let mut detail = row.ok_or_else(|| StoreError::NodeNotFound(node_id.to_owned()))?;

        detail.parent_count = self.conn.query_row(
            "SELECT COUNT(*) FROM parent_map WHERE child_id = ?1",
            params![node_id],
            |row| row.get(0),
        )?;
        detail.child_count = self.conn.query_row(
            "SELECT COUNT(*) FROM child_map WHERE parent_id = ?1",
            params![node_id],
            |row| row.get(0),
        )?;

        Ok(detail)
    }

    /// Version, capabilities and record counts for the loaded manifest
    pub fn schema_info(&self) -> Result<SchemaInfo, StoreError> {
        let detected_version = self
            .metadata_value(KEY_DETECTED_VERSION)?
            .and_then(|v| v.parse().ok());

        let capabilities = self
            .metadata_value(KEY_CAPABILITIES)?
            .and_then(|v| serde_json::from_str(&v).ok());

        // Original metadata values are stored JSON-encoded
        let original_schema_version = self
            .metadata_value("original_dbt_schema_version")?
            .and_then(|v| serde_json::from_str::<serde_json::Value>(&v).ok())
            .map(|v| match v.as_str() {
                Some(s) => s.to_owned(),
                None => v.to_string(),
            });

        let stats = StoreStats {
            nodes: self.table_count("nodes")?,
            sources: self.table_count("sources")?,
            macros: self.table_count("macros")?,
            parent_relationships: self.table_count("parent_map")?,
            child_relationships: self.table_count("child_map")?,
        };

        Ok(SchemaInfo {
            detected_version,
            supported_features: capabilities.map(supported_features).unwrap_or_default(),
            capabilities,
            original_schema_version,
            stats,
        })
    }

    fn metadata_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn table_count(&self, table: &str) -> Result<usize, StoreError> {
        // Table names are fixed internal identifiers, never user input
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }
}

fn insert_metadata(
    tx: &Transaction<'_>,
    manifest: &ManifestDoc,
    caps: &SchemaCapabilities,
) -> Result<(), BoxError> {
    let mut stmt = tx.prepare("INSERT INTO metadata (key, value) VALUES (?1, ?2)")?;

    stmt.execute(params![KEY_DETECTED_VERSION, caps.version.to_string()])?;
    stmt.execute(params![KEY_CAPABILITIES, serde_json::to_string(caps)?])?;
    stmt.execute(params![KEY_REFRESHED_AT, Utc::now().to_rfc3339()])?;

    for (key, value) in &manifest.metadata {
        stmt.execute(params![
            format!("{ORIGINAL_KEY_PREFIX}{key}"),
            serde_json::to_string(value)?
        ])?;
    }

    Ok(())
}

fn insert_nodes(tx: &Transaction<'_>, manifest: &ManifestDoc) -> Result<(), BoxError> {
    let mut stmt = tx.prepare(
        "INSERT INTO nodes (
            unique_id, name, resource_type, package_name, path,
            original_file_path, compiled_code, raw_code,
            database_name, schema_name, alias, full_data
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;

    for (key, raw) in &manifest.nodes {
        let record = NodeRecord::from_raw(key, raw);
        stmt.execute(params![
            record.unique_id,
            record.name,
            record.resource_type,
            record.package_name,
            record.path,
            record.original_file_path,
            record.compiled_code,
            record.raw_code,
            record.database,
            record.schema,
            record.alias,
            serde_json::to_string(&record.full_data)?,
        ])?;
    }

    Ok(())
}

fn insert_sources(tx: &Transaction<'_>, manifest: &ManifestDoc) -> Result<(), BoxError> {
    let mut stmt = tx.prepare(
        "INSERT INTO sources (
            unique_id, name, source_name, package_name,
            database_name, schema_name, full_data
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for (key, raw) in &manifest.sources {
        let record = SourceRecord::from_raw(key, raw);
        stmt.execute(params![
            record.unique_id,
            record.name,
            record.source_name,
            record.package_name,
            record.database,
            record.schema,
            serde_json::to_string(&record.full_data)?,
        ])?;
    }

    Ok(())
}

fn insert_macros(tx: &Transaction<'_>, manifest: &ManifestDoc) -> Result<(), BoxError> {
    let mut stmt = tx.prepare(
        "INSERT INTO macros (
            unique_id, name, package_name, path,
            original_file_path, macro_sql, full_data
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for (key, raw) in &manifest.macros {
        let record = MacroRecord::from_raw(key, raw);
        stmt.execute(params![
            record.unique_id,
            record.name,
            record.package_name,
            record.path,
            record.original_file_path,
            record.macro_sql,
            serde_json::to_string(&record.full_data)?,
        ])?;
    }

    Ok(())
}

fn insert_lineage(tx: &Transaction<'_>, lineage: &LineageMaps) -> Result<(), BoxError> {
    let mut parent_stmt =
        tx.prepare("INSERT INTO parent_map (child_id, parent_id, position) VALUES (?1, ?2, ?3)")?;
    for (child_id, parent_ids) in &lineage.parents {
        for (position, parent_id) in parent_ids.iter().enumerate() {
            parent_stmt.execute(params![child_id, parent_id, position])?;
        }
    }

    let mut child_stmt =
        tx.prepare("INSERT INTO child_map (parent_id, child_id, position) VALUES (?1, ?2, ?3)")?;
    for (parent_id, child_ids) in &lineage.children {
        for (position, child_id) in child_ids.iter().enumerate() {
            child_stmt.execute(params![parent_id, child_id, position])?;
        }
    }

    Ok(())
}

/// Feature names derived from a capability profile.
///
/// Node/source/macro parsing is unconditional; lineage and node-structure
/// entries depend on the profile.
fn supported_features(caps: SchemaCapabilities) -> Vec<String> {
    let mut features = vec![
        "node_parsing".to_owned(),
        "source_parsing".to_owned(),
        "macro_parsing".to_owned(),
    ];

    if caps.has_parent_map {
        features.push("parent_lineage".to_owned());
    }
    if caps.has_child_map {
        features.push("child_lineage".to_owned());
    }

    match caps.node_structure {
        dbtscope_core::NodeStructure::Modern => features.push("modern_node_structure".to_owned()),
        dbtscope_core::NodeStructure::Legacy => features.push("legacy_node_structure".to_owned()),
    }

    features
}

/// Load statistics for one refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub manifest_path: String,
    pub version: u32,
    pub nodes: usize,
    pub sources: usize,
    pub macros: usize,
    /// Number of child entries in the parent map
    pub parent_entries: usize,
    /// Number of parent entries in the child map
    pub child_entries: usize,
}

impl std::fmt::Display for RefreshSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Refreshed manifest data from {}", self.manifest_path)?;
        writeln!(f, "Schema version: v{}", self.version)?;
        writeln!(
            f,
            "Loaded: {} nodes, {} sources, {} macros",
            self.nodes, self.sources, self.macros
        )?;
        write!(
            f,
            "Lineage: {} parent relationships, {} child relationships",
            self.parent_entries, self.child_entries
        )
    }
}

/// Canonical node fields plus dependency counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDetail {
    pub unique_id: String,
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub package_name: Option<String>,
    pub path: Option<String>,
    pub compiled_code: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub alias: Option<String>,
    pub parent_count: usize,
    pub child_count: usize,
}

/// Per-table record counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub nodes: usize,
    pub sources: usize,
    pub macros: usize,
    pub parent_relationships: usize,
    pub child_relationships: usize,
}

/// Schema/version introspection over the currently persisted state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaInfo {
    pub detected_version: Option<u32>,
    pub capabilities: Option<SchemaCapabilities>,
    pub original_schema_version: Option<String>,
    pub supported_features: Vec<String>,
    pub stats: StoreStats,
}
