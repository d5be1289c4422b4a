//! Weaviate-backed vector store, speaking the REST API directly.
//!
//! The collection holds one object per chunk. Only `content` is vectorized;
//! the bookkeeping fields (`name`, `id_doc`, `added_date_to_weaviate`,
//! `chunk_index`) are stored with vectorization skipped. Embedding is
//! delegated to the store's `text2vec-openai` module, which receives the API
//! credential through the `X-OpenAI-Api-Key` header on each request.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::VectorStoreConfig;
use crate::error::{ShelfError, ShelfResult};
use crate::models::ChunkRecord;
use crate::store::{contents_with_summary, VectorStore};

pub const COLLECTION_NAME: &str = "MarketingFiles";

const EMBEDDING_MODEL: &str = "text-embedding-3-large";
const PAGE_SIZE: usize = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct WeaviateStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// One object from a GraphQL page: the chunk record plus the store-assigned
/// object id used for deletes.
#[derive(Debug)]
struct FetchedObject {
    uuid: String,
    record: ChunkRecord,
}

impl WeaviateStore {
    pub fn new(config: &VectorStoreConfig) -> ShelfResult<Self> {
        Self::with_base_url(config.base_url(), config.api_key.clone())
    }

    pub fn with_base_url(base_url: String, api_key: Option<String>) -> ShelfResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ShelfError::vector("client construction", e))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-OpenAI-Api-Key", key),
            None => request,
        }
    }

    async fn fetch_page(&self, id_doc: &str, offset: usize) -> ShelfResult<Vec<FetchedObject>> {
        let stage = format!("fetch chunks for {id_doc}");
        let body = serde_json::json!({ "query": page_query(id_doc, offset) });

        let response = self
            .authorized(self.client.post(format!("{}/v1/graphql", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(|e| ShelfError::vector(stage.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShelfError::vector(stage, format!("status {status}: {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ShelfError::vector(stage.clone(), e))?;
        parse_page(&json, &stage)
    }

    /// All objects of a document, walking GraphQL pages until a short page
    /// ends the listing.
    async fn fetch_all(&self, id_doc: &str) -> ShelfResult<Vec<FetchedObject>> {
        let mut objects = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.fetch_page(id_doc, offset).await?;
            let page_len = page.len();
            objects.extend(page);
            if page_len < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }
        Ok(objects)
    }

    async fn delete_object(&self, uuid: &str, id_doc: &str) -> ShelfResult<()> {
        let url = format!("{}/v1/objects/{}/{}", self.base_url, COLLECTION_NAME, uuid);
        let response = self
            .authorized(self.client.delete(url))
            .send()
            .await
            .map_err(|e| ShelfError::vector(format!("delete chunk object of {id_doc}"), e))?;

        let status = response.status();
        // 404 means another deleter got there first; the outcome is the same.
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let text = response.text().await.unwrap_or_default();
            return Err(ShelfError::vector(
                format!("delete chunk object of {id_doc}"),
                format!("status {status}: {text}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for WeaviateStore {
    async fn collection_exists(&self) -> ShelfResult<bool> {
        let url = format!("{}/v1/schema/{}", self.base_url, COLLECTION_NAME);
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| ShelfError::vector("schema probe", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ShelfError::schema(
                COLLECTION_NAME,
                format!("schema probe returned {status}: {text}"),
            ))
        }
    }

    async fn ensure_collection(&self) -> ShelfResult<()> {
        if self.collection_exists().await? {
            tracing::debug!("collection {} already exists", COLLECTION_NAME);
            return Ok(());
        }

        let response = self
            .authorized(self.client.post(format!("{}/v1/schema", self.base_url)))
            .json(&collection_schema())
            .send()
            .await
            .map_err(|e| ShelfError::schema(COLLECTION_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShelfError::schema(
                COLLECTION_NAME,
                format!("create returned {status}: {text}"),
            ));
        }
        tracing::info!("created collection {}", COLLECTION_NAME);
        Ok(())
    }

    async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> ShelfResult<()> {
        for chunk in chunks {
            let stage = format!("insert chunk {} of {}", chunk.chunk_index, chunk.id_doc);
            let body = serde_json::json!({
                "class": COLLECTION_NAME,
                "properties": chunk,
            });

            let response = self
                .authorized(self.client.post(format!("{}/v1/objects", self.base_url)))
                .json(&body)
                .send()
                .await
                .map_err(|e| ShelfError::vector(stage.clone(), e))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ShelfError::vector(stage, format!("status {status}: {text}")));
            }
        }
        Ok(())
    }

    async fn delete_by_document(&self, id_doc: &str) -> ShelfResult<()> {
        // The uuid list is collected before the first delete; removing
        // objects mid-walk would shift the offsets of later pages.
        let objects = self.fetch_all(id_doc).await?;
        for object in &objects {
            self.delete_object(&object.uuid, id_doc).await?;
        }
        tracing::debug!("removed {} chunk object(s) for {}", objects.len(), id_doc);
        Ok(())
    }

    async fn fetch_by_document(&self, id_doc: &str) -> ShelfResult<Vec<String>> {
        let records: Vec<ChunkRecord> = self
            .fetch_all(id_doc)
            .await?
            .into_iter()
            .map(|o| o.record)
            .collect();
        Ok(contents_with_summary(&records))
    }
}

/// Class schema sent on create: `content` goes through the vectorizer, every
/// other field is stored as-is.
fn collection_schema() -> serde_json::Value {
    serde_json::json!({
        "class": COLLECTION_NAME,
        "vectorizer": "text2vec-openai",
        "moduleConfig": {
            "text2vec-openai": { "model": EMBEDDING_MODEL }
        },
        "properties": [
            { "name": "content", "dataType": ["text"] },
            skipped_property("name", "text"),
            skipped_property("id_doc", "text"),
            skipped_property("added_date_to_weaviate", "date"),
            skipped_property("chunk_index", "int"),
        ]
    })
}

fn skipped_property(name: &str, data_type: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "dataType": [data_type],
        "moduleConfig": { "text2vec-openai": { "skip": true } }
    })
}

/// GraphQL page query filtering on `id_doc`. The id is embedded as a JSON
/// string literal so quoting in document ids cannot break the query.
fn page_query(id_doc: &str, offset: usize) -> String {
    let id_literal = serde_json::Value::String(id_doc.to_string()).to_string();
    format!(
        "{{ Get {{ {COLLECTION_NAME}(where: {{path: [\"id_doc\"], operator: Equal, \
         valueText: {id_literal}}}, limit: {PAGE_SIZE}, offset: {offset}) \
         {{ content name id_doc added_date_to_weaviate chunk_index _additional {{ id }} }} }} }}"
    )
}

fn parse_page(json: &serde_json::Value, stage: &str) -> ShelfResult<Vec<FetchedObject>> {
    if let Some(errors) = json.get("errors") {
        return Err(ShelfError::vector(stage, errors.to_string()));
    }

    let objects = match json
        .get("data")
        .and_then(|d| d.get("Get"))
        .and_then(|g| g.get(COLLECTION_NAME))
    {
        Some(serde_json::Value::Array(objects)) => objects,
        Some(serde_json::Value::Null) => return Ok(Vec::new()),
        _ => {
            return Err(ShelfError::vector(
                stage,
                "response missing data.Get object list",
            ))
        }
    };

    let mut out = Vec::with_capacity(objects.len());
    for object in objects {
        let uuid = object
            .get("_additional")
            .and_then(|a| a.get("id"))
            .and_then(|i| i.as_str())
            .ok_or_else(|| ShelfError::vector(stage, "object without _additional.id"))?
            .to_string();
        out.push(FetchedObject {
            uuid,
            record: ChunkRecord {
                content: str_prop(object, "content"),
                name: str_prop(object, "name"),
                id_doc: str_prop(object, "id_doc"),
                added_date_to_weaviate: str_prop(object, "added_date_to_weaviate"),
                chunk_index: object
                    .get("chunk_index")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0),
            },
        });
    }
    Ok(out)
}

fn str_prop(object: &serde_json::Value, key: &str) -> String {
    object
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_vectorizes_only_content() {
        let schema = collection_schema();
        assert_eq!(schema["class"], COLLECTION_NAME);
        assert_eq!(schema["vectorizer"], "text2vec-openai");

        let properties = schema["properties"].as_array().unwrap();
        assert_eq!(properties.len(), 5);
        for property in properties {
            let name = property["name"].as_str().unwrap();
            let skipped = property["moduleConfig"]["text2vec-openai"]["skip"]
                .as_bool()
                .unwrap_or(false);
            if name == "content" {
                assert!(!skipped, "content must go through the vectorizer");
            } else {
                assert!(skipped, "{name} must not be vectorized");
            }
        }
    }

    #[test]
    fn test_page_query_escapes_id() {
        let query = page_query("plain123", 0);
        assert!(query.contains("valueText: \"plain123\""));
        assert!(query.contains("limit: 1000"));
        assert!(query.contains("offset: 0"));

        let tricky = page_query("a\"b", 1000);
        assert!(tricky.contains("valueText: \"a\\\"b\""));
        assert!(tricky.contains("offset: 1000"));
    }

    #[test]
    fn test_parse_page_happy_path() {
        let json = serde_json::json!({
            "data": { "Get": { "MarketingFiles": [
                {
                    "content": "chunk text",
                    "name": "file.txt",
                    "id_doc": "abc",
                    "added_date_to_weaviate": "2025-06-01T00:00:00Z",
                    "chunk_index": 3,
                    "_additional": { "id": "11111111-2222-3333-4444-555555555555" }
                }
            ] } }
        });
        let objects = parse_page(&json, "test").unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].uuid, "11111111-2222-3333-4444-555555555555");
        assert_eq!(objects[0].record.content, "chunk text");
        assert_eq!(objects[0].record.chunk_index, 3);
    }

    #[test]
    fn test_parse_page_surfaces_graphql_errors() {
        let json = serde_json::json!({
            "errors": [ { "message": "no such class" } ]
        });
        let err = parse_page(&json, "test").unwrap_err();
        assert!(err.to_string().contains("no such class"));
    }

    #[test]
    fn test_parse_page_null_class_is_empty() {
        let json = serde_json::json!({ "data": { "Get": { "MarketingFiles": null } } });
        assert!(parse_page(&json, "test").unwrap().is_empty());
    }
}
