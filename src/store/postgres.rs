//! PostgreSQL-backed metadata store.
//!
//! One row per ingested document in `marketing_files`. All operations run on
//! connections acquired from the shared pool and released on every exit path;
//! single-statement writes rely on per-statement commit/rollback.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::{ShelfError, ShelfResult};
use crate::models::DocumentRecord;
use crate::store::MetadataStore;

pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    /// The pool is built once at startup (see [`crate::db::connect`]) and
    /// shared; each call below holds one connection for its duration.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn ensure_schema(&self) -> ShelfResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS marketing_files (
                id_doc TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                added_date TIMESTAMP NOT NULL,
                chunks_count INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ShelfError::schema("marketing_files table", e))?;
        Ok(())
    }

    async fn insert(&self, record: &DocumentRecord) -> ShelfResult<()> {
        sqlx::query(
            "INSERT INTO marketing_files (id_doc, name, added_date, chunks_count)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id_doc) DO NOTHING",
        )
        .bind(&record.id_doc)
        .bind(&record.name)
        .bind(record.added_date)
        .bind(record.chunks_count)
        .execute(&self.pool)
        .await
        .map_err(|e| ShelfError::metadata(format!("insert row for {}", record.id_doc), e))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> ShelfResult<()> {
        let result = sqlx::query("DELETE FROM marketing_files WHERE id_doc = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ShelfError::metadata(format!("delete row for {id}"), e))?;
        tracing::debug!("delete {}: {} row(s) removed", id, result.rows_affected());
        Ok(())
    }

    async fn search(&self, name_filter: Option<&str>) -> ShelfResult<Vec<DocumentRecord>> {
        let rows = match name_filter {
            Some(filter) => {
                sqlx::query(
                    "SELECT id_doc, name, added_date, chunks_count FROM marketing_files
                     WHERE name ILIKE $1
                     ORDER BY added_date DESC",
                )
                .bind(format!("%{filter}%"))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id_doc, name, added_date, chunks_count FROM marketing_files
                     ORDER BY added_date DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| ShelfError::metadata("search marketing_files", e))?;

        Ok(rows
            .iter()
            .map(|row| DocumentRecord {
                id_doc: row.get("id_doc"),
                name: row.get("name"),
                added_date: row.get("added_date"),
                chunks_count: row.get("chunks_count"),
            })
            .collect())
    }

    async fn exists(&self, id: &str) -> ShelfResult<bool> {
        let row = sqlx::query("SELECT 1 FROM marketing_files WHERE id_doc = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShelfError::metadata(format!("existence check for {id}"), e))?;
        Ok(row.is_some())
    }
}
