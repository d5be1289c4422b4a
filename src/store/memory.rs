//! In-memory store implementations for testing.
//!
//! `HashMap` and `Vec` behind `std::sync::RwLock`, matching the contracts of
//! the real adapters closely enough to exercise the ingestion pipeline
//! without PostgreSQL or Weaviate running.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::ShelfResult;
use crate::models::{ChunkRecord, DocumentRecord};
use crate::store::{contents_with_summary, MetadataStore, VectorStore};

/// In-memory stand-in for the `marketing_files` table.
pub struct MemoryMetadataStore {
    rows: RwLock<HashMap<String, DocumentRecord>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn row(&self, id_doc: &str) -> Option<DocumentRecord> {
        self.rows.read().unwrap().get(id_doc).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().unwrap().len()
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn ensure_schema(&self) -> ShelfResult<()> {
        Ok(())
    }

    async fn insert(&self, record: &DocumentRecord) -> ShelfResult<()> {
        let mut rows = self.rows.write().unwrap();
        // First write wins, like INSERT .. ON CONFLICT DO NOTHING.
        rows.entry(record.id_doc.clone())
            .or_insert_with(|| record.clone());
        Ok(())
    }

    async fn delete(&self, id_doc: &str) -> ShelfResult<()> {
        self.rows.write().unwrap().remove(id_doc);
        Ok(())
    }

    async fn search(&self, name_filter: Option<&str>) -> ShelfResult<Vec<DocumentRecord>> {
        let rows = self.rows.read().unwrap();
        let mut records: Vec<DocumentRecord> = rows
            .values()
            .filter(|record| match name_filter {
                Some(filter) => record
                    .name
                    .to_lowercase()
                    .contains(&filter.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.added_date.cmp(&a.added_date));
        Ok(records)
    }

    async fn exists(&self, id_doc: &str) -> ShelfResult<bool> {
        Ok(self.rows.read().unwrap().contains_key(id_doc))
    }
}

struct StoredObject {
    _uuid: String,
    record: ChunkRecord,
}

/// In-memory stand-in for the chunk collection. Object ids are assigned at
/// insert, as the real store does.
pub struct MemoryVectorStore {
    objects: RwLock<Vec<StoredObject>>,
    collection_created: AtomicBool,
    create_count: AtomicUsize,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
            collection_created: AtomicBool::new(false),
            create_count: AtomicUsize::new(0),
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    /// How many times the collection was actually created, across any number
    /// of `ensure_collection` calls.
    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    /// Stored records for one document, ordered by chunk index.
    pub fn records_for(&self, id_doc: &str) -> Vec<ChunkRecord> {
        let objects = self.objects.read().unwrap();
        let mut records: Vec<ChunkRecord> = objects
            .iter()
            .filter(|object| object.record.id_doc == id_doc)
            .map(|object| object.record.clone())
            .collect();
        records.sort_by_key(|record| record.chunk_index);
        records
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn collection_exists(&self) -> ShelfResult<bool> {
        Ok(self.collection_created.load(Ordering::SeqCst))
    }

    async fn ensure_collection(&self) -> ShelfResult<()> {
        if !self.collection_created.swap(true, Ordering::SeqCst) {
            self.create_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> ShelfResult<()> {
        let mut objects = self.objects.write().unwrap();
        for chunk in chunks {
            objects.push(StoredObject {
                _uuid: uuid::Uuid::new_v4().to_string(),
                record: chunk.clone(),
            });
        }
        Ok(())
    }

    async fn delete_by_document(&self, id_doc: &str) -> ShelfResult<()> {
        self.objects
            .write()
            .unwrap()
            .retain(|object| object.record.id_doc != id_doc);
        Ok(())
    }

    async fn fetch_by_document(&self, id_doc: &str) -> ShelfResult<Vec<String>> {
        Ok(contents_with_summary(&self.records_for(id_doc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id_doc: &str, name: &str, day: u32) -> DocumentRecord {
        DocumentRecord {
            id_doc: id_doc.to_string(),
            name: name.to_string(),
            added_date: NaiveDate::from_ymd_opt(2025, 6, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            chunks_count: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_keeps_first_write() {
        let store = MemoryMetadataStore::new();
        store.insert(&record("a", "first.txt", 1)).await.unwrap();
        store.insert(&record("a", "second.txt", 2)).await.unwrap();
        assert_eq!(store.row("a").unwrap().name, "first.txt");
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_search_filters_and_orders_newest_first() {
        let store = MemoryMetadataStore::new();
        store.insert(&record("a", "Brochure.txt", 1)).await.unwrap();
        store.insert(&record("b", "pricelist.txt", 3)).await.unwrap();
        store.insert(&record("c", "brochure_v2.txt", 2)).await.unwrap();

        let all = store.search(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id_doc.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let filtered = store.search(Some("BROCH")).await.unwrap();
        let ids: Vec<&str> = filtered.iter().map(|r| r.id_doc.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_ensure_collection_creates_once() {
        let store = MemoryVectorStore::new();
        assert!(!store.collection_exists().await.unwrap());
        store.ensure_collection().await.unwrap();
        store.ensure_collection().await.unwrap();
        assert!(store.collection_exists().await.unwrap());
        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching_document() {
        let store = MemoryVectorStore::new();
        let chunk = |id_doc: &str, index: i64| ChunkRecord {
            content: format!("chunk {index}"),
            name: "doc.txt".to_string(),
            id_doc: id_doc.to_string(),
            added_date_to_weaviate: "2025-06-01T00:00:00Z".to_string(),
            chunk_index: index,
        };
        store
            .insert_chunks(&[chunk("a", 0), chunk("a", 1), chunk("b", 0)])
            .await
            .unwrap();
        store.delete_by_document("a").await.unwrap();
        assert_eq!(store.object_count(), 1);
        assert_eq!(store.records_for("b").len(), 1);
    }
}
