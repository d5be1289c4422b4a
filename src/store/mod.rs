//! Storage abstraction for the dual-store pipeline.
//!
//! [`MetadataStore`] is the relational bookkeeping side (one row per
//! document); [`VectorStore`] is the chunk collection with per-field
//! vectorization. Production backends live in [`postgres`] and [`weaviate`];
//! [`memory`] provides in-process implementations used by tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod postgres;
pub mod weaviate;

use async_trait::async_trait;

use crate::error::ShelfResult;
use crate::models::{ChunkRecord, DocumentRecord};

/// Document-level bookkeeping operations.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ensure_schema`](MetadataStore::ensure_schema) | Create the document table if absent |
/// | [`insert`](MetadataStore::insert) | Insert a row; first write wins on conflict |
/// | [`delete`](MetadataStore::delete) | Remove a row; absent is a no-op |
/// | [`search`](MetadataStore::search) | List rows by optional name substring |
/// | [`exists`](MetadataStore::exists) | Dedup existence probe |
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Idempotent creation of the document table.
    async fn ensure_schema(&self) -> ShelfResult<()>;

    /// Insert a document row. A primary-key conflict is a silent no-op so
    /// that the first writer wins.
    async fn insert(&self, record: &DocumentRecord) -> ShelfResult<()>;

    /// Remove the row for `id`; removing an absent row succeeds.
    async fn delete(&self, id: &str) -> ShelfResult<()>;

    /// Rows whose name contains `name_filter` case-insensitively, or all
    /// rows when no filter is given. Most recently added first.
    async fn search(&self, name_filter: Option<&str>) -> ShelfResult<Vec<DocumentRecord>>;

    /// Whether a document with this id was already ingested.
    async fn exists(&self, id: &str) -> ShelfResult<bool>;
}

/// Chunk collection operations.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`collection_exists`](VectorStore::collection_exists) | Explicit schema probe |
/// | [`ensure_collection`](VectorStore::ensure_collection) | Create the collection if absent |
/// | [`insert_chunks`](VectorStore::insert_chunks) | Write chunk records one object at a time |
/// | [`delete_by_document`](VectorStore::delete_by_document) | Remove all chunks of a document |
/// | [`fetch_by_document`](VectorStore::fetch_by_document) | Chunk contents plus trailing summary |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether the chunk collection already exists. Absence is a boolean
    /// outcome, not an error.
    async fn collection_exists(&self) -> ShelfResult<bool>;

    /// Create the chunk collection if it does not exist yet. Idempotent.
    async fn ensure_collection(&self) -> ShelfResult<()>;

    /// Write chunk records as independent objects. There is no batch
    /// atomicity here; all-or-nothing ingestion is the orchestrator's job.
    async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> ShelfResult<()>;

    /// Delete every chunk belonging to `id_doc`. A document with zero chunks
    /// deletes successfully.
    async fn delete_by_document(&self, id_doc: &str) -> ShelfResult<()>;

    /// Chunk contents for `id_doc` in store order, followed by one summary
    /// line for the highest-indexed chunk. Unknown ids yield an empty list.
    async fn fetch_by_document(&self, id_doc: &str) -> ShelfResult<Vec<String>>;
}

/// Shared shape of a [`VectorStore::fetch_by_document`] result: the chunk
/// contents in the order the store returned them, then a JSON summary of the
/// chunk with the highest index. No records, no summary.
pub(crate) fn contents_with_summary(records: &[ChunkRecord]) -> Vec<String> {
    let mut out: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
    if let Some(last) = records.iter().max_by_key(|r| r.chunk_index) {
        out.push(
            serde_json::json!({
                "chunk_index": last.chunk_index,
                "name": last.name,
                "id_doc": last.id_doc,
                "added_date_to_weaviate": last.added_date_to_weaviate,
            })
            .to_string(),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: i64, content: &str) -> ChunkRecord {
        ChunkRecord {
            content: content.to_string(),
            name: "demo.txt".to_string(),
            id_doc: "abc123".to_string(),
            added_date_to_weaviate: "2025-06-01T12:00:00Z".to_string(),
            chunk_index: index,
        }
    }

    #[test]
    fn test_summary_uses_highest_index_not_iteration_order() {
        let records = vec![record(2, "third"), record(0, "first"), record(1, "second")];
        let out = contents_with_summary(&records);
        assert_eq!(out.len(), 4);
        assert_eq!(&out[..3], ["third", "first", "second"]);

        let summary: serde_json::Value = serde_json::from_str(&out[3]).unwrap();
        assert_eq!(summary["chunk_index"], 2);
        assert_eq!(summary["id_doc"], "abc123");
        assert_eq!(summary["name"], "demo.txt");
        assert_eq!(summary["added_date_to_weaviate"], "2025-06-01T12:00:00Z");
    }

    #[test]
    fn test_no_records_no_summary() {
        assert!(contents_with_summary(&[]).is_empty());
    }
}
