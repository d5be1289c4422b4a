//! Error types for ingestion and the two store adapters.

use thiserror::Error;

/// Errors surfaced by the library. Adapter failures carry the store name and
/// the stage that failed so callers can tell which side of the dual write
/// broke.
#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("document '{name}' already ingested (id {id})")]
    DuplicateDocument { name: String, id: String },

    #[error("cannot decode '{name}': expected UTF-8 or Windows-1251 bytes")]
    DecodeError { name: String },

    #[error("{store} store unavailable during {stage}: {reason}")]
    StoreUnavailable {
        store: &'static str,
        stage: String,
        reason: String,
    },

    #[error("schema setup for {target} failed: {reason}")]
    SchemaError { target: String, reason: String },

    #[error("document {id}: vector write failed after metadata commit; metadata row rolled back")]
    PartialIngestionFailure {
        id: String,
        #[source]
        source: Box<ShelfError>,
    },

    #[error(
        "document {id}: vector write failed and the metadata rollback failed too ({rollback}); \
         a metadata row without complete chunks remains"
    )]
    CompensationFailure {
        id: String,
        #[source]
        source: Box<ShelfError>,
        rollback: String,
    },
}

pub type ShelfResult<T> = Result<T, ShelfError>;

impl ShelfError {
    /// Metadata-store failure at `stage` (e.g. "insert marketing_files row").
    pub fn metadata(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ShelfError::StoreUnavailable {
            store: "metadata",
            stage: stage.into(),
            reason: err.to_string(),
        }
    }

    /// Vector-store failure at `stage` (e.g. "insert chunk 3 of <id>").
    pub fn vector(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ShelfError::StoreUnavailable {
            store: "vector",
            stage: stage.into(),
            reason: err.to_string(),
        }
    }

    pub fn schema(target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ShelfError::SchemaError {
            target: target.into(),
            reason: err.to_string(),
        }
    }
}
