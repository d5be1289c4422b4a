//! Ingestion pipeline orchestration.
//!
//! Coordinates the full add flow: decode → fingerprint → dedup check →
//! chunking → metadata row → chunk objects. The metadata row is written
//! first; if the chunk upload then fails, the row is deleted again so a
//! half-ingested document never shows up in listings.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sha2::{Digest, Sha256};

use crate::chunk::chunk_document;
use crate::config::{ChunkingConfig, Config};
use crate::db;
use crate::error::{ShelfError, ShelfResult};
use crate::models::{Chunk, ChunkRecord, DocumentRecord};
use crate::store::postgres::PostgresMetadataStore;
use crate::store::weaviate::WeaviateStore;
use crate::store::{MetadataStore, VectorStore};

/// Outcome of one successful ingestion.
#[derive(Debug)]
pub struct IngestReport {
    pub id_doc: String,
    pub name: String,
    pub chunks_count: usize,
}

/// High half of the Windows-1251 code page, indexed by `byte - 0x80`.
/// NUL marks 0x98, the one byte the code page leaves unassigned.
const CP1251_HIGH: [char; 128] = [
    'Ђ', 'Ѓ', '‚', 'ѓ', '„', '…', '†', '‡', // 0x80
    '€', '‰', 'Љ', '‹', 'Њ', 'Ќ', 'Ћ', 'Џ', // 0x88
    'ђ', '‘', '’', '“', '”', '•', '–', '—', // 0x90
    '\0', '™', 'љ', '›', 'њ', 'ќ', 'ћ', 'џ', // 0x98
    '\u{a0}', 'Ў', 'ў', 'Ј', '¤', 'Ґ', '¦', '§', // 0xa0
    'Ё', '©', 'Є', '«', '¬', '\u{ad}', '®', 'Ї', // 0xa8
    '°', '±', 'І', 'і', 'ґ', 'µ', '¶', '·', // 0xb0
    'ё', '№', 'є', '»', 'ј', 'Ѕ', 'ѕ', 'ї', // 0xb8
    'А', 'Б', 'В', 'Г', 'Д', 'Е', 'Ж', 'З', // 0xc0
    'И', 'Й', 'К', 'Л', 'М', 'Н', 'О', 'П', // 0xc8
    'Р', 'С', 'Т', 'У', 'Ф', 'Х', 'Ц', 'Ч', // 0xd0
    'Ш', 'Щ', 'Ъ', 'Ы', 'Ь', 'Э', 'Ю', 'Я', // 0xd8
    'а', 'б', 'в', 'г', 'д', 'е', 'ж', 'з', // 0xe0
    'и', 'й', 'к', 'л', 'м', 'н', 'о', 'п', // 0xe8
    'р', 'с', 'т', 'у', 'ф', 'х', 'ц', 'ч', // 0xf0
    'ш', 'щ', 'ъ', 'ы', 'ь', 'э', 'ю', 'я', // 0xf8
];

fn decode_cp1251(bytes: &[u8]) -> Option<String> {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if byte < 0x80 {
            out.push(byte as char);
        } else {
            let ch = CP1251_HIGH[(byte - 0x80) as usize];
            if ch == '\0' {
                return None;
            }
            out.push(ch);
        }
    }
    Some(out)
}

/// Decode uploaded bytes as UTF-8, falling back to Windows-1251 for legacy
/// exports. Anything else is rejected.
pub fn decode_text(bytes: &[u8], name: &str) -> ShelfResult<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    decode_cp1251(bytes).ok_or_else(|| ShelfError::DecodeError {
        name: name.to_string(),
    })
}

/// Content fingerprint used as the document id. Identical text always maps
/// to the identical id, which is what makes deduplication work.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn chunk_records(
    chunks: &[Chunk],
    name: &str,
    id_doc: &str,
    added: DateTime<Utc>,
) -> Vec<ChunkRecord> {
    let added_iso = added.to_rfc3339_opts(SecondsFormat::Secs, true);
    chunks
        .iter()
        .map(|chunk| ChunkRecord {
            content: chunk.text.clone(),
            name: name.to_string(),
            id_doc: id_doc.to_string(),
            added_date_to_weaviate: added_iso.clone(),
            chunk_index: chunk.chunk_index as i64,
        })
        .collect()
}

/// Ingest one document into both stores.
///
/// Rejects duplicates before any chunking work. On a chunk-upload failure
/// after the metadata row was committed, deletes the row again and reports
/// [`ShelfError::PartialIngestionFailure`]; if even that delete fails, the
/// leftover row is reported loudly as [`ShelfError::CompensationFailure`].
/// A document that chunks to nothing is stored with a chunk count of zero.
pub async fn ingest_document(
    metadata: &dyn MetadataStore,
    vectors: &dyn VectorStore,
    chunking: &ChunkingConfig,
    bytes: &[u8],
    name: &str,
) -> ShelfResult<IngestReport> {
    let text = decode_text(bytes, name)?;
    let id_doc = fingerprint(&text);

    // Duplicate rejection costs one lookup; chunking and store setup only
    // happen for new content.
    if metadata.exists(&id_doc).await? {
        return Err(ShelfError::DuplicateDocument {
            name: name.to_string(),
            id: id_doc,
        });
    }
    vectors.ensure_collection().await?;

    let chunks = chunk_document(&text, chunking.chunk_size, chunking.chunk_overlap);
    let added = Utc::now().trunc_subsecs(0);
    let records = chunk_records(&chunks, name, &id_doc, added);

    let row = DocumentRecord {
        id_doc: id_doc.clone(),
        name: name.to_string(),
        added_date: added.naive_utc(),
        chunks_count: chunks.len() as i32,
    };
    metadata.insert(&row).await?;

    if let Err(vector_err) = vectors.insert_chunks(&records).await {
        tracing::warn!(
            "chunk upload for {} failed, rolling back metadata row: {}",
            id_doc,
            vector_err
        );
        return Err(match metadata.delete(&id_doc).await {
            Ok(()) => ShelfError::PartialIngestionFailure {
                id: id_doc,
                source: Box::new(vector_err),
            },
            Err(rollback_err) => ShelfError::CompensationFailure {
                id: id_doc,
                source: Box::new(vector_err),
                rollback: rollback_err.to_string(),
            },
        });
    }

    tracing::debug!("ingested {} as {} ({} chunk(s))", name, id_doc, chunks.len());
    Ok(IngestReport {
        id_doc,
        name: name.to_string(),
        chunks_count: chunks.len(),
    })
}

/// `shelf add`: ingest files from disk, one report line per file. A bad file
/// does not stop the rest of the batch.
pub async fn run_add(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let pool = db::connect(config).await?;
    let metadata = PostgresMetadataStore::new(pool.clone());
    let vectors = WeaviateStore::new(&config.vector)?;

    let mut added = 0usize;
    let mut failed = 0usize;
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("uploaded.txt")
            .to_string();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("failed {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };
        match ingest_document(&metadata, &vectors, &config.chunking, &bytes, &name).await {
            Ok(report) => {
                println!(
                    "added {} ({} chunk(s), id {})",
                    report.name, report.chunks_count, report.id_doc
                );
                added += 1;
            }
            Err(e) => {
                eprintln!("failed {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    pool.close().await;

    println!("added {} of {} file(s)", added, paths.len());
    if failed > 0 {
        bail!("{} file(s) failed", failed);
    }
    Ok(())
}
