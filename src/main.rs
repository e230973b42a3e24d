//! # Lorebase CLI (`lore`)
//!
//! The `lore` binary is the primary interface for Lorebase. It provides
//! commands for schema bootstrap, batch migration of documentation sources,
//! dual-path search, domain listings, document retrieval, and store
//! statistics.
//!
//! ## Usage
//!
//! ```bash
//! lore --config ./config/lore.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lore init` | Create the SQLite database and bootstrap the schema |
//! | `lore migrate` | Ingest all configured sources into the store |
//! | `lore search "<query>"` | Search documents and patterns |
//! | `lore list` | List documents by category or patterns by domain |
//! | `lore get <path>` | Retrieve a full document by its stored path |
//! | `lore stats` | Print document and pattern counts |

mod classify;
mod config;
mod db;
mod error;
mod get;
mod ingest;
mod list;
mod models;
mod scanner;
mod search;
mod stats;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::store::Store;

/// Lorebase CLI — a local knowledge-base storage and retrieval engine for
/// technical documentation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lore.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lore",
    about = "Lorebase — a local knowledge-base storage and retrieval engine",
    version,
    long_about = "Lorebase ingests markdown-like documentation from configured source roots, \
    classifies it, and stores reference documents and curated problem/solution patterns in a \
    single SQLite file with full-text search and a substring fallback."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the document and pattern tables,
    /// and (when the runtime supports fts5) their full-text mirror tables.
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Run a full migration across all configured sources.
    ///
    /// Scans each source root, classifies the files it yields, merges the
    /// source's policy metadata, and upserts the records. Individual file
    /// failures are skipped and counted; the command fails only when the
    /// store itself cannot be opened or its schema cannot be created.
    Migrate,

    /// Search stored documents and patterns.
    ///
    /// Uses full-text search ranked by bm25 when available, falling back to
    /// a capped substring scan otherwise.
    Search {
        /// The search query string.
        query: String,

        /// Restrict results to one domain (document category / pattern domain).
        #[arg(long)]
        domain: Option<String>,

        /// Maximum number of results per entity type.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// List documents by category or patterns by domain.
    List {
        /// List documents with this exact category.
        #[arg(long, conflicts_with = "domain")]
        category: Option<String>,

        /// List patterns with this exact domain.
        #[arg(long)]
        domain: Option<String>,
    },

    /// Retrieve a document by its stored path.
    ///
    /// Prints the document's metadata and full content.
    Get {
        /// Source-relative document path (e.g. `guides/shared-state.md`).
        path: String,
    },

    /// Print store statistics.
    ///
    /// Shows total, technical, and process document counts plus the number
    /// of stored patterns.
    Stats,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LORE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    // Fatal store errors (connection, schema) propagate out of Store::open
    // and terminate with a non-zero status. The pool is released on every
    // path: explicitly via close() on success, by Drop when unwinding.
    match cli.command {
        Commands::Init => {
            let store = Store::open(&cfg.db.path).await?;
            store.close().await;
            println!("Store initialized successfully.");
        }
        Commands::Migrate => {
            let store = Store::open(&cfg.db.path).await?;
            ingest::run_migrate_command(&cfg, &store).await?;
            store.close().await;
        }
        Commands::Search {
            query,
            domain,
            limit,
        } => {
            let store = Store::open(&cfg.db.path).await?;
            let limit = limit.unwrap_or(cfg.search.default_limit);
            search::run_search(&store, &query, domain.as_deref(), limit).await?;
            store.close().await;
        }
        Commands::List { category, domain } => {
            let store = Store::open(&cfg.db.path).await?;
            match (category, domain) {
                (Some(category), None) => list::run_list_documents(&store, &category).await?,
                (None, Some(domain)) => list::run_list_patterns(&store, &domain).await?,
                _ => anyhow::bail!("pass exactly one of --category or --domain"),
            }
            store.close().await;
        }
        Commands::Get { path } => {
            let store = Store::open(&cfg.db.path).await?;
            let result = get::run_get(&store, &path).await;
            store.close().await;
            result?;
        }
        Commands::Stats => {
            let store = Store::open(&cfg.db.path).await?;
            stats::run_stats(&cfg, &store).await?;
            store.close().await;
        }
    }

    Ok(())
}
