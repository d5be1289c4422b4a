//! Core data models shared by the chunking pipeline and the two stores.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Metadata row for one ingested document, as stored in `marketing_files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Content fingerprint, also the primary key.
    pub id_doc: String,
    /// Full display name; truncation happens only at presentation time.
    pub name: String,
    /// UTC wall-clock time of ingestion, second precision.
    pub added_date: NaiveDateTime,
    pub chunks_count: i32,
}

/// One bounded sub-chunk produced by the two-stage splitter.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    /// Which kept section this chunk came from.
    pub section_index: usize,
    /// Position among the section's sub-chunks.
    pub subchunk_index: usize,
    /// Dense zero-based index across the whole document in traversal order.
    pub chunk_index: usize,
}

/// Denormalized chunk record as written to the vector store. Field names
/// match the collection schema, so the struct serializes directly into the
/// object properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub content: String,
    pub name: String,
    pub id_doc: String,
    /// ISO-8601 UTC with `Z` suffix, second precision.
    pub added_date_to_weaviate: String,
    pub chunk_index: i64,
}

/// Shorten a document name to a single display line. Names at or below 140
/// characters pass through untouched; longer ones keep the first 134
/// characters plus a spaced ellipsis.
pub fn display_name(name: &str) -> String {
    const MAX_CHARS: usize = 140;
    if name.chars().count() <= MAX_CHARS {
        name.to_string()
    } else {
        let head: String = name.chars().take(MAX_CHARS - 6).collect();
        format!("{head} . . .")
    }
}
