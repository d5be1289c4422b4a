//! # Docshelf
//!
//! Ingestion and retrieval for a marketing document base.
//!
//! Text files are fingerprinted, split into bounded overlapping chunks, and
//! written to two stores: chunk objects go to a Weaviate collection (where
//! the `text2vec-openai` module embeds them), document bookkeeping goes to a
//! PostgreSQL table. Ingestion keeps the two in sync by rolling the metadata
//! row back when the chunk upload fails partway.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────────┐
//! │   Files   │──▶│   Pipeline   │──▶│  Dual store   │
//! │  (.txt)   │   │ hash + chunk │   │ PG + Weaviate │
//! └───────────┘   └──────────────┘   └───────┬───────┘
//!                                            │
//!                         ┌──────────────────┤
//!                         ▼                  ▼
//!                    ┌─────────┐       ┌──────────┐
//!                    │   CLI   │       │   HTTP   │
//!                    │ (shelf) │       │  (axum)  │
//!                    └─────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shelf init                    # create table and collection
//! shelf add docs/*.txt          # ingest files
//! shelf search "price"          # list matching documents
//! shelf chunks <id>             # print a document's chunks
//! shelf remove <id>             # delete from both stores
//! shelf serve                   # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment configuration |
//! | [`models`] | Core data types |
//! | [`chunk`] | Section split and bounded chunking |
//! | [`ingest`] | Decoding, fingerprinting, dual-store orchestration |
//! | [`store`] | Store traits plus PostgreSQL, Weaviate, and in-memory adapters |
//! | [`search`] | Document listing |
//! | [`get`] | Chunk retrieval |
//! | [`remove`] | Dual-store deletion |
//! | [`server`] | HTTP API server |
//! | [`db`] | Connection pool |
//! | [`migrate`] | Schema bootstrap |
//! | [`error`] | Error types |

pub mod chunk;
pub mod config;
pub mod db;
pub mod error;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod remove;
pub mod search;
pub mod server;
pub mod store;
