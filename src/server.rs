//! HTTP API server.
//!
//! Exposes the ingestion pipeline over JSON for UI consumers. The UI reads
//! uploaded files client-side and posts their text; everything else mirrors
//! the CLI surface.
//!
//! # Endpoints
//!
//! | Method   | Path                     | Description |
//! |----------|--------------------------|-------------|
//! | `GET`    | `/health`                | Health check (returns version) |
//! | `POST`   | `/documents`             | Ingest a document from `{"name", "content"}` |
//! | `GET`    | `/documents?query=`      | List documents, optionally filtered by name |
//! | `GET`    | `/documents/{id}/chunks` | A document's chunk texts, raw and joined |
//! | `DELETE` | `/documents/{id}`        | Delete a document from both stores |
//!
//! # Error Contract
//!
//! All error responses carry:
//!
//! ```json
//! { "error": { "code": "duplicate_document", "message": "document 'a.txt' already ingested (id 9f86d0…)" } }
//! ```
//!
//! Error codes: `duplicate_document` (409), `decode_error` and `bad_request`
//! (400), `store_unavailable` (503), `schema_error`,
//! `partial_ingestion_failure`, `compensation_failure` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the UI is served from a
//! different origin.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::error::ShelfError;
use crate::get::CHUNK_JOIN;
use crate::ingest::ingest_document;
use crate::models::DocumentRecord;
use crate::remove::delete_document;
use crate::store::postgres::PostgresMetadataStore;
use crate::store::weaviate::WeaviateStore;
use crate::store::{MetadataStore, VectorStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorStore>,
}

/// Starts the HTTP API server.
///
/// Binds to the configured address and serves until the process is
/// terminated. Both stores have their schemas ensured before the first
/// request is accepted.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;

    let metadata = PostgresMetadataStore::new(pool);
    let vectors = WeaviateStore::new(&config.vector)?;
    metadata.ensure_schema().await?;
    vectors.ensure_collection().await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        metadata: Arc::new(metadata),
        vectors: Arc::new(vectors),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route(
            "/documents",
            post(handle_add_document).get(handle_list_documents),
        )
        .route("/documents/{id}/chunks", get(handle_get_chunks))
        .route("/documents/{id}", delete(handle_delete_document))
        .layer(cors)
        .with_state(state);

    println!("API server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"duplicate_document"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Maps pipeline errors onto HTTP statuses: a duplicate upload is a client
/// conflict, a store outage is retriable, everything else is on us.
fn classify_error(err: ShelfError) -> AppError {
    let (status, code) = match &err {
        ShelfError::DuplicateDocument { .. } => (StatusCode::CONFLICT, "duplicate_document"),
        ShelfError::DecodeError { .. } => (StatusCode::BAD_REQUEST, "decode_error"),
        ShelfError::StoreUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
        ShelfError::SchemaError { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
        ShelfError::PartialIngestionFailure { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "partial_ingestion_failure")
        }
        ShelfError::CompensationFailure { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "compensation_failure")
        }
    };
    AppError {
        status,
        code: code.to_string(),
        message: err.to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /documents ============

#[derive(Deserialize)]
struct AddDocumentRequest {
    name: String,
    content: String,
}

#[derive(Serialize)]
struct AddDocumentResponse {
    id_doc: String,
    name: String,
    chunks_count: usize,
}

async fn handle_add_document(
    State(state): State<AppState>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<Json<AddDocumentResponse>, AppError> {
    if req.name.trim().is_empty() {
        return Err(bad_request("name must not be empty"));
    }

    let report = ingest_document(
        state.metadata.as_ref(),
        state.vectors.as_ref(),
        &state.config.chunking,
        req.content.as_bytes(),
        &req.name,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(AddDocumentResponse {
        id_doc: report.id_doc,
        name: report.name,
        chunks_count: report.chunks_count,
    }))
}

// ============ GET /documents ============

#[derive(Deserialize)]
struct SearchParams {
    query: Option<String>,
}

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<DocumentRecord>,
}

async fn handle_list_documents(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state
        .metadata
        .search(params.query.as_deref())
        .await
        .map_err(classify_error)?;
    Ok(Json(DocumentListResponse { documents }))
}

// ============ GET /documents/{id}/chunks ============

#[derive(Serialize)]
struct ChunksResponse {
    id_doc: String,
    chunks: Vec<String>,
    text: String,
}

async fn handle_get_chunks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChunksResponse>, AppError> {
    let chunks = state
        .vectors
        .fetch_by_document(&id)
        .await
        .map_err(classify_error)?;
    let text = chunks.join(CHUNK_JOIN);
    Ok(Json(ChunksResponse {
        id_doc: id,
        chunks,
        text,
    }))
}

// ============ DELETE /documents/{id} ============

#[derive(Serialize)]
struct RemovedResponse {
    removed: String,
}

async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>, AppError> {
    delete_document(state.metadata.as_ref(), state.vectors.as_ref(), &id)
        .await
        .map_err(classify_error)?;
    Ok(Json(RemovedResponse { removed: id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err = classify_error(ShelfError::DuplicateDocument {
            name: "a.txt".to_string(),
            id: "abc".to_string(),
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "duplicate_document");

        let err = classify_error(ShelfError::DecodeError {
            name: "a.txt".to_string(),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "decode_error");

        let err = classify_error(ShelfError::metadata("insert row", "pool exhausted"));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, "store_unavailable");

        let err = classify_error(ShelfError::CompensationFailure {
            id: "abc".to_string(),
            source: Box::new(ShelfError::vector("insert chunk 0 of abc", "timeout")),
            rollback: "connection refused".to_string(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "compensation_failure");
    }
}
