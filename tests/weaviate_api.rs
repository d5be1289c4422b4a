//! HTTP-level tests for the Weaviate adapter, run against a local mock
//! server. They pin the wire format the adapter speaks: the schema probe and
//! create calls, per-chunk object writes, the paged GraphQL fetch walk, and
//! per-object deletes.

use httpmock::prelude::*;
use serde_json::{json, Value};

use docshelf::error::ShelfError;
use docshelf::models::ChunkRecord;
use docshelf::store::weaviate::WeaviateStore;
use docshelf::store::VectorStore;

fn store_for(server: &MockServer) -> WeaviateStore {
    WeaviateStore::with_base_url(server.base_url(), None).unwrap()
}

fn record(index: i64) -> ChunkRecord {
    ChunkRecord {
        content: format!("chunk {index}"),
        name: "file.txt".to_string(),
        id_doc: "doc1".to_string(),
        added_date_to_weaviate: "2025-06-01T00:00:00Z".to_string(),
        chunk_index: index,
    }
}

/// One object the way the GraphQL endpoint returns it, uuid derived from the
/// index.
fn page_object(index: i64) -> Value {
    json!({
        "content": format!("chunk {index}"),
        "name": "big.txt",
        "id_doc": "bigdoc",
        "added_date_to_weaviate": "2025-06-01T00:00:00Z",
        "chunk_index": index,
        "_additional": { "id": format!("00000000-0000-0000-0000-{index:012}") }
    })
}

fn page_body(objects: Vec<Value>) -> Value {
    json!({ "data": { "Get": { "MarketingFiles": objects } } })
}

// ─── Schema ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_collection_probe_finds_existing() {
    let server = MockServer::start_async().await;
    let probe = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/schema/MarketingFiles");
            then.status(200).json_body(json!({ "class": "MarketingFiles" }));
        })
        .await;

    let store = store_for(&server);
    assert!(store.collection_exists().await.unwrap());
    probe.assert_async().await;
}

#[tokio::test]
async fn test_collection_probe_absent_is_false_not_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/schema/MarketingFiles");
            then.status(404);
        })
        .await;

    let store = store_for(&server);
    assert!(!store.collection_exists().await.unwrap());
}

#[tokio::test]
async fn test_collection_probe_server_error_is_schema_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/schema/MarketingFiles");
            then.status(500).body("internal");
        })
        .await;

    let store = store_for(&server);
    let err = store.collection_exists().await.unwrap_err();
    match err {
        ShelfError::SchemaError { target, reason } => {
            assert_eq!(target, "MarketingFiles");
            assert!(reason.contains("500"), "reason must carry the status: {reason}");
        }
        other => panic!("expected SchemaError, got: {other}"),
    }
}

#[tokio::test]
async fn test_ensure_collection_creates_when_absent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/schema/MarketingFiles");
            then.status(404);
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/schema").json_body_partial(
                r#"{
                    "class": "MarketingFiles",
                    "vectorizer": "text2vec-openai",
                    "moduleConfig": {
                        "text2vec-openai": { "model": "text-embedding-3-large" }
                    }
                }"#,
            );
            then.status(200).json_body(json!({ "class": "MarketingFiles" }));
        })
        .await;

    let store = store_for(&server);
    store.ensure_collection().await.unwrap();
    create.assert_async().await;
}

#[tokio::test]
async fn test_ensure_collection_skips_existing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/schema/MarketingFiles");
            then.status(200).json_body(json!({ "class": "MarketingFiles" }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/schema");
            then.status(200);
        })
        .await;

    let store = store_for(&server);
    store.ensure_collection().await.unwrap();
    assert_eq!(
        create.hits_async().await,
        0,
        "an existing collection must not be recreated"
    );
}

#[tokio::test]
async fn test_ensure_collection_reports_create_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/schema/MarketingFiles");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/schema");
            then.status(422).body("invalid vectorizer config");
        })
        .await;

    let store = store_for(&server);
    let err = store.ensure_collection().await.unwrap_err();
    assert!(
        err.to_string().contains("422"),
        "create failure must carry the status: {err}"
    );
    assert!(err.to_string().contains("invalid vectorizer config"));
}

// ─── Object writes ──────────────────────────────────────────────────

#[tokio::test]
async fn test_insert_posts_chunk_as_class_properties() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/objects").json_body(json!({
                "class": "MarketingFiles",
                "properties": {
                    "content": "chunk 0",
                    "name": "file.txt",
                    "id_doc": "doc1",
                    "added_date_to_weaviate": "2025-06-01T00:00:00Z",
                    "chunk_index": 0
                }
            }));
            then.status(200)
                .json_body(json!({ "id": "11111111-2222-3333-4444-555555555555" }));
        })
        .await;

    let store = store_for(&server);
    store.insert_chunks(&[record(0)]).await.unwrap();
    insert.assert_async().await;
}

#[tokio::test]
async fn test_insert_makes_one_request_per_chunk() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/objects")
                .json_body_partial(r#"{ "class": "MarketingFiles" }"#);
            then.status(200).json_body(json!({ "id": "ignored" }));
        })
        .await;

    let store = store_for(&server);
    store
        .insert_chunks(&[record(0), record(1), record(2)])
        .await
        .unwrap();
    assert_eq!(insert.hits_async().await, 3);
}

#[tokio::test]
async fn test_insert_failure_names_chunk_and_document() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/objects");
            then.status(500).body("vectorizer down");
        })
        .await;

    let store = store_for(&server);
    let err = store.insert_chunks(&[record(7)]).await.unwrap_err();
    match err {
        ShelfError::StoreUnavailable { stage, reason, .. } => {
            assert_eq!(stage, "insert chunk 7 of doc1");
            assert!(reason.contains("500"));
            assert!(reason.contains("vectorizer down"));
        }
        other => panic!("expected StoreUnavailable, got: {other}"),
    }
}

#[tokio::test]
async fn test_openai_key_forwarded_as_header() {
    let server = MockServer::start_async().await;
    let probe = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/schema/MarketingFiles")
                .header("X-OpenAI-Api-Key", "sk-test");
            then.status(200).json_body(json!({ "class": "MarketingFiles" }));
        })
        .await;

    let store =
        WeaviateStore::with_base_url(server.base_url(), Some("sk-test".to_string())).unwrap();
    assert!(
        store.collection_exists().await.unwrap(),
        "request without the header would not match the mock"
    );
    probe.assert_async().await;
}

// ─── Fetch ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_walks_pages_until_short_page() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/graphql")
                .body_contains("bigdoc")
                .body_contains("offset: 0");
            then.status(200)
                .json_body(page_body((0..1000).map(page_object).collect()));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/graphql")
                .body_contains("bigdoc")
                .body_contains("offset: 1000");
            then.status(200).json_body(page_body(vec![page_object(1000)]));
        })
        .await;

    let store = store_for(&server);
    let blocks = store.fetch_by_document("bigdoc").await.unwrap();

    // 1001 chunk contents plus the trailing summary line.
    assert_eq!(blocks.len(), 1002);
    assert_eq!(blocks[0], "chunk 0");
    assert_eq!(blocks[1000], "chunk 1000");
    let summary: Value = serde_json::from_str(&blocks[1001]).unwrap();
    assert_eq!(summary["chunk_index"], 1000);

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_fetch_unknown_document_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/graphql");
            then.status(200).json_body(page_body(Vec::new()));
        })
        .await;

    let store = store_for(&server);
    assert!(store.fetch_by_document("nosuchdoc").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_surfaces_graphql_errors_from_ok_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/graphql");
            then.status(200).json_body(json!({
                "errors": [ { "message": "explorer: list class: no such class" } ]
            }));
        })
        .await;

    let store = store_for(&server);
    let err = store.fetch_by_document("doc1").await.unwrap_err();
    assert!(
        err.to_string().contains("no such class"),
        "GraphQL errors arrive in 200 responses and must still fail: {err}"
    );
}

#[tokio::test]
async fn test_fetch_http_failure_is_store_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/graphql");
            then.status(503).body("maintenance");
        })
        .await;

    let store = store_for(&server);
    let err = store.fetch_by_document("doc1").await.unwrap_err();
    match err {
        ShelfError::StoreUnavailable { stage, reason, .. } => {
            assert_eq!(stage, "fetch chunks for doc1");
            assert!(reason.contains("503"));
        }
        other => panic!("expected StoreUnavailable, got: {other}"),
    }
}

// ─── Delete ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_removes_each_listed_object() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/graphql").body_contains("bigdoc");
            then.status(200)
                .json_body(page_body(vec![page_object(0), page_object(1)]));
        })
        .await;
    let delete_first = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/objects/MarketingFiles/00000000-0000-0000-0000-000000000000");
            then.status(204);
        })
        .await;
    let delete_second = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/objects/MarketingFiles/00000000-0000-0000-0000-000000000001");
            then.status(204);
        })
        .await;

    let store = store_for(&server);
    store.delete_by_document("bigdoc").await.unwrap();
    delete_first.assert_async().await;
    delete_second.assert_async().await;
}

#[tokio::test]
async fn test_delete_tolerates_already_missing_object() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/graphql");
            then.status(200).json_body(page_body(vec![page_object(0)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/objects/MarketingFiles/00000000-0000-0000-0000-000000000000");
            then.status(404);
        })
        .await;

    let store = store_for(&server);
    store.delete_by_document("bigdoc").await.unwrap();
}

#[tokio::test]
async fn test_delete_with_no_stored_chunks_makes_no_delete_calls() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/graphql");
            then.status(200).json_body(page_body(Vec::new()));
        })
        .await;
    let any_delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path_matches(Regex::new("^/v1/objects/.*$").unwrap());
            then.status(204);
        })
        .await;

    let store = store_for(&server);
    store.delete_by_document("emptydoc").await.unwrap();
    assert_eq!(any_delete.hits_async().await, 0);
}
