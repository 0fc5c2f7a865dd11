//! SQLite schema for persisted manifest data
//!
//! Lineage edges are stored redundantly in both orientations so each query
//! direction is a point lookup. The `position` column fixes result order to
//! insertion order; the composite primary key would otherwise let the index
//! dictate it.

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS nodes (
    unique_id          TEXT PRIMARY KEY,
    name               TEXT,
    resource_type      TEXT,
    package_name       TEXT,
    path               TEXT,
    original_file_path TEXT,
    compiled_code      TEXT,
    raw_code           TEXT,
    database_name      TEXT,
    schema_name        TEXT,
    alias              TEXT,
    full_data          TEXT
);

CREATE TABLE IF NOT EXISTS sources (
    unique_id     TEXT PRIMARY KEY,
    name          TEXT,
    source_name   TEXT,
    package_name  TEXT,
    database_name TEXT,
    schema_name   TEXT,
    full_data     TEXT
);

CREATE TABLE IF NOT EXISTS macros (
    unique_id          TEXT PRIMARY KEY,
    name               TEXT,
    package_name       TEXT,
    path               TEXT,
    original_file_path TEXT,
    macro_sql          TEXT,
    full_data          TEXT
);

CREATE TABLE IF NOT EXISTS parent_map (
    child_id  TEXT NOT NULL,
    parent_id TEXT NOT NULL,
    position  INTEGER NOT NULL,
    PRIMARY KEY (child_id, parent_id)
);

CREATE TABLE IF NOT EXISTS child_map (
    parent_id TEXT NOT NULL,
    child_id  TEXT NOT NULL,
    position  INTEGER NOT NULL,
    PRIMARY KEY (parent_id, child_id)
);
";
