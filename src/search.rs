//! Document listing and name search.
//!
//! Queries the metadata table only; chunk contents never leave the vector
//! store on this path. Results come back newest first.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::models::display_name;
use crate::store::postgres::PostgresMetadataStore;
use crate::store::MetadataStore;

/// CLI entry point. With a query, case-insensitive substring match on the
/// document name; without, every document.
pub async fn run_search(config: &Config, query: Option<&str>) -> Result<()> {
    let pool = db::connect(config).await?;
    let metadata = PostgresMetadataStore::new(pool.clone());
    let result = metadata.search(query).await;
    pool.close().await;
    let records = result?;

    if records.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!(
            "{}. {} ({} chunk(s))",
            i + 1,
            display_name(&record.name),
            record.chunks_count
        );
        println!(
            "    added: {}",
            record.added_date.format("%Y-%m-%d %H:%M:%S")
        );
        println!("    id: {}", record.id_doc);
        println!();
    }

    Ok(())
}
