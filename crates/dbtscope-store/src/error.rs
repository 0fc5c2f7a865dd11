//! Store error types

/// Errors surfaced by [`crate::ManifestStore`] operations.
///
/// None of these are fatal to the process; the store stays usable for
/// subsequent calls after any single failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `refresh` was called with no path and no configured default.
    /// Raised before any I/O is attempted.
    #[error("manifest path must be provided or DBT_MANIFEST_PATH must be set")]
    MissingManifestPath,

    /// Any read, parse or persistence failure during a refresh, with the
    /// original cause preserved. The prior persisted state is left intact.
    #[error("failed to refresh manifest: {source}")]
    Refresh {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Node detail lookup for an identifier with no matching record
    #[error("node {0} not found")]
    NodeNotFound(String),

    /// Storage-level failure outside a refresh
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
