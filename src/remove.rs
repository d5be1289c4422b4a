//! Document deletion from both stores.
//!
//! Each side is attempted independently: a failure on one does not stop the
//! delete on the other, and an id with nothing stored is not an error, so
//! callers can simply retry a partially failed delete.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::error::ShelfResult;
use crate::store::postgres::PostgresMetadataStore;
use crate::store::weaviate::WeaviateStore;
use crate::store::{MetadataStore, VectorStore};

/// Delete `id_doc` from the metadata store and the vector store. Both sides
/// always run; if either failed, the metadata-side error is reported first.
pub async fn delete_document(
    metadata: &dyn MetadataStore,
    vectors: &dyn VectorStore,
    id_doc: &str,
) -> ShelfResult<()> {
    let metadata_result = metadata.delete(id_doc).await;
    let vector_result = vectors.delete_by_document(id_doc).await;

    if let Err(e) = &metadata_result {
        tracing::warn!("metadata delete for {} failed: {}", id_doc, e);
    }
    if let Err(e) = &vector_result {
        tracing::warn!("vector delete for {} failed: {}", id_doc, e);
    }

    metadata_result.and(vector_result)
}

/// CLI entry point.
pub async fn run_remove(config: &Config, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let metadata = PostgresMetadataStore::new(pool.clone());
    let vectors = WeaviateStore::new(&config.vector)?;
    let result = delete_document(&metadata, &vectors, id).await;
    pool.close().await;
    result?;
    println!("removed {id}");
    Ok(())
}
