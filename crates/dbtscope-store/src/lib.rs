//! SQLite-backed storage for dbt manifest data
//!
//! This crate owns the persisted state: the ingestion pipeline that
//! replaces it wholesale on every refresh (inside one transaction, so
//! readers only ever observe pre- or post-refresh state), and the
//! read-only query accessors over whatever is currently persisted.

pub mod error;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use store::{ManifestStore, NodeDetail, RefreshSummary, SchemaInfo, StoreStats};
