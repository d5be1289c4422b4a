//! Chunk retrieval by document id.
//!
//! Fetches a document's chunk texts from the vector store and joins them for
//! display. Used by both the `shelf chunks` CLI command and the HTTP chunk
//! endpoint.

use anyhow::Result;

use crate::config::Config;
use crate::error::ShelfResult;
use crate::store::weaviate::WeaviateStore;
use crate::store::VectorStore;

/// Visible divider between chunks when a document is rendered as one block.
pub const CHUNK_JOIN: &str =
    "\n\n--------------------------------------------------------\n\n";

/// Core fetch returning the chunk texts joined for display (used by CLI and
/// server). The final block is the summary line for the last chunk; an id
/// with nothing stored joins to the empty string.
pub async fn joined_chunks(vectors: &dyn VectorStore, id_doc: &str) -> ShelfResult<String> {
    let blocks = vectors.fetch_by_document(id_doc).await?;
    Ok(blocks.join(CHUNK_JOIN))
}

/// CLI entry point.
pub async fn run_chunks(config: &Config, id: &str) -> Result<()> {
    let vectors = WeaviateStore::new(&config.vector)?;
    let text = joined_chunks(&vectors, id).await?;
    if text.is_empty() {
        println!("No chunks stored for {id}");
    } else {
        println!("{text}");
    }
    Ok(())
}
