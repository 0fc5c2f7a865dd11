//! Canonical field extraction across manifest schema versions
//!
//! Several node fields were renamed over dbt's schema history
//! (`compiled_sql` -> `compiled_code`, `raw_sql` -> `raw_code`, ...).
//! Each canonical field resolves through a fixed, first-match-wins chain of
//! candidate names, so a record can be extracted from either layout without
//! consulting the schema version. Extraction is pure and total: a definition
//! matching no candidate yields the field's documented default, not an error.

use serde_json::Value;

fn str_field(raw: &Value, name: &str) -> Option<String> {
    raw.get(name).and_then(Value::as_str).map(str::to_owned)
}

fn first_str(raw: &Value, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|name| str_field(raw, name))
}

/// Canonical record for a manifest node (model, test, snapshot, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Unique identifier; falls back to the manifest mapping key for
    /// legacy manifests whose nodes omit a `unique_id` field
    pub unique_id: String,
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub package_name: Option<String>,
    pub path: Option<String>,
    pub original_file_path: Option<String>,
    pub compiled_code: Option<String>,
    pub raw_code: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub alias: Option<String>,

    /// Full original definition, retained verbatim for forward compatibility
    pub full_data: Value,
}

impl NodeRecord {
    /// Extract a canonical node record from its raw manifest definition.
    ///
    /// `key` is the mapping key the node was stored under in the manifest.
    pub fn from_raw(key: &str, raw: &Value) -> Self {
        Self {
            unique_id: str_field(raw, "unique_id").unwrap_or_else(|| key.to_owned()),
            name: str_field(raw, "name"),
            resource_type: str_field(raw, "resource_type"),
            package_name: str_field(raw, "package_name"),
            path: first_str(raw, &["path", "original_file_path"]),
            original_file_path: str_field(raw, "original_file_path"),
            compiled_code: first_str(raw, &["compiled_code", "compiled_sql"]),
            raw_code: first_str(raw, &["raw_code", "raw_sql", "sql"]).unwrap_or_default(),
            database: first_str(raw, &["database", "database_name"]),
            schema: first_str(raw, &["schema", "schema_name"]),
            alias: first_str(raw, &["alias", "name"]),
            full_data: raw.clone(),
        }
    }
}

/// Canonical record for a source-table definition
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub unique_id: String,
    pub name: Option<String>,
    pub source_name: Option<String>,
    pub package_name: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub full_data: Value,
}

impl SourceRecord {
    pub fn from_raw(key: &str, raw: &Value) -> Self {
        Self {
            unique_id: str_field(raw, "unique_id").unwrap_or_else(|| key.to_owned()),
            name: str_field(raw, "name"),
            source_name: str_field(raw, "source_name"),
            package_name: str_field(raw, "package_name"),
            database: str_field(raw, "database"),
            schema: str_field(raw, "schema"),
            full_data: raw.clone(),
        }
    }
}

/// Canonical record for a macro definition
#[derive(Debug, Clone, PartialEq)]
pub struct MacroRecord {
    pub unique_id: String,
    pub name: Option<String>,
    pub package_name: Option<String>,
    pub path: Option<String>,
    pub original_file_path: Option<String>,
    pub macro_sql: String,
    pub full_data: Value,
}

impl MacroRecord {
    pub fn from_raw(key: &str, raw: &Value) -> Self {
        Self {
            unique_id: str_field(raw, "unique_id").unwrap_or_else(|| key.to_owned()),
            name: str_field(raw, "name"),
            package_name: str_field(raw, "package_name"),
            path: str_field(raw, "path"),
            original_file_path: str_field(raw, "original_file_path"),
            macro_sql: first_str(raw, &["macro_sql", "sql"]).unwrap_or_default(),
            full_data: raw.clone(),
        }
    }
}
