//! # Docshelf CLI (`shelf`)
//!
//! The `shelf` binary is the primary interface for Docshelf. It provides
//! commands for schema bootstrap, document ingestion, listing, chunk
//! retrieval, deletion, and starting the HTTP API server.
//!
//! ## Usage
//!
//! ```bash
//! shelf <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf init` | Create the metadata table and the chunk collection |
//! | `shelf add <PATH>...` | Ingest text files into both stores |
//! | `shelf search [QUERY]` | List documents, newest first |
//! | `shelf chunks <ID>` | Print a document's chunks in order |
//! | `shelf remove <ID>` | Delete a document from both stores |
//! | `shelf serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Create the table and the collection
//! shelf init
//!
//! # Ingest a directory of text exports
//! shelf add docs/*.txt
//!
//! # Find documents by name substring
//! shelf search "price"
//!
//! # Show one document's chunks
//! shelf chunks 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//!
//! # Start the API for the UI
//! shelf serve
//! ```
//!
//! Configuration comes from environment variables (a `.env` file is honored):
//! `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`, `POSTGRES_USER`,
//! `POSTGRES_PASSWORD`, `WEAVIATE_HOST`, `WEAVIATE_PORT`, `OPENAI_API_KEY`,
//! `SHELF_HTTP_ADDR`, `SHELF_CHUNK_SIZE`, `SHELF_CHUNK_OVERLAP`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use docshelf::{config, get, ingest, migrate, remove, search, server};

/// Docshelf CLI: ingestion and retrieval for a marketing document base.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Document ingestion into a PostgreSQL + Weaviate dual store",
    version,
    long_about = "Docshelf ingests text documents, deduplicates them by content \
    fingerprint, splits them into bounded overlapping chunks, and stores the chunks \
    in a Weaviate collection alongside a PostgreSQL metadata table, keeping the two \
    in sync under partial failure."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the metadata table and the chunk collection.
    ///
    /// This command is idempotent; running it multiple times is safe.
    Init,

    /// Ingest text files into both stores.
    ///
    /// Each file is decoded (UTF-8, falling back to Windows-1251), rejected
    /// if its content was already ingested, chunked, and written to both
    /// stores. Files are processed independently; a failing file does not
    /// abort the rest, but the exit code reports it.
    Add {
        /// Files to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List documents, most recently added first.
    Search {
        /// Case-insensitive name substring; omit to list everything.
        query: Option<String>,
    },

    /// Print a document's chunks in order, separated by a visible divider.
    Chunks {
        /// Document id (content fingerprint).
        id: String,
    },

    /// Delete a document from both stores.
    ///
    /// Best effort on each side independently; safe to retry.
    Remove {
        /// Document id (content fingerprint).
        id: String,
    },

    /// Start the HTTP API server.
    ///
    /// Binds to `SHELF_HTTP_ADDR` and serves the JSON API used by the UI.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;

    match cli.command {
        Commands::Init => {
            migrate::run_init(&cfg).await?;
        }
        Commands::Add { paths } => {
            ingest::run_add(&cfg, &paths).await?;
        }
        Commands::Search { query } => {
            search::run_search(&cfg, query.as_deref()).await?;
        }
        Commands::Chunks { id } => {
            get::run_chunks(&cfg, &id).await?;
        }
        Commands::Remove { id } => {
            remove::run_remove(&cfg, &id).await?;
        }
        Commands::Serve => {
            cfg.log_summary();
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
