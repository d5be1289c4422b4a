use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::store::postgres::PostgresMetadataStore;
use crate::store::weaviate::{WeaviateStore, COLLECTION_NAME};
use crate::store::{MetadataStore, VectorStore};

/// Create the metadata table and the chunk collection if either is missing.
/// Safe to run repeatedly.
pub async fn run_init(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let metadata = PostgresMetadataStore::new(pool.clone());
    metadata.ensure_schema().await?;
    println!("table marketing_files ready");

    let vectors = WeaviateStore::new(&config.vector)?;
    let existed = vectors.collection_exists().await?;
    vectors.ensure_collection().await?;
    if existed {
        println!("collection {COLLECTION_NAME} already exists");
    } else {
        println!("collection {COLLECTION_NAME} created");
    }

    pool.close().await;
    Ok(())
}
