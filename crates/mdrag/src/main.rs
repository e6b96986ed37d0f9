//! # mdrag CLI
//!
//! Command-line interface for mdrag, a Markdown ingestion and semantic
//! search pipeline.
//!
//! ## Commands
//!
//! - `mdrag ingest [ROOT]` - Chunk, embed, and store all Markdown under a directory
//! - `mdrag query <TEXT>` - Search the stored chunks by similarity
//! - `mdrag status` - Show how many chunks are stored
//! - `mdrag config` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! # Ingest the default ./markdown_pages directory
//! mdrag ingest
//!
//! # Ingest a specific directory with custom chunking
//! mdrag ingest ~/notes --chunk-size 300 --chunk-overlap 30
//!
//! # Search, top three matches
//! mdrag query "futures and streams"
//!
//! # Get JSON output
//! mdrag query "error handling" --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdrag_chunker::RecursiveCharacterChunker;
use mdrag_core::{ChunkConfig, QueryMatch, StoreError, VectorStore};
use mdrag_embed::CandleEmbedder;
use mdrag_extract::MarkdownExtractor;
use mdrag_pipeline::{IngestPipeline, QueryExecutor};
use mdrag_store::LanceStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::{data_dir, Config};

/// Embedding dimension for all-MiniLM-L6-v2.
const EMBEDDING_DIM: usize = 384;

#[derive(Parser)]
#[command(name = "mdrag")]
#[command(about = "Semantic search over a folder of Markdown files")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/mdrag/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest Markdown files into the vector store
    Ingest {
        /// Directory of Markdown files (default from config)
        root: Option<PathBuf>,

        /// Maximum chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Overlap between chunks in characters
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Vector database path (default from config)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Query the stored chunks
    Query {
        /// Query text
        text: String,

        /// Maximum results
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Vector database path (default from config)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Show store status
    Status {
        /// Vector database path (default from config)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for ingest results.
#[derive(Serialize)]
struct IngestOutput {
    root: String,
    documents: usize,
    chunks: usize,
}

/// Output structure for query results.
#[derive(Serialize)]
struct QueryOutput {
    query: String,
    results: Vec<ResultItem>,
}

#[derive(Serialize)]
struct ResultItem {
    id: String,
    distance: f32,
    text: String,
}

/// Output structure for status.
#[derive(Serialize)]
struct StatusOutput {
    db_path: String,
    chunks: u64,
}

/// Create the embedder with its model loaded, so a model-load failure
/// aborts before any document is touched.
async fn create_embedder() -> Result<Arc<CandleEmbedder>> {
    let cache_dir = data_dir()
        .context("failed to get data directory")?
        .join("models");
    let embedder = CandleEmbedder::new(cache_dir);

    info!("Initializing embedder (this may download the model on first run)...");
    embedder
        .init()
        .await
        .context("failed to initialize embedder")?;

    Ok(Arc::new(embedder))
}

fn load_config(cli_path: Option<&PathBuf>) -> Result<Config> {
    if let Some(path) = cli_path {
        Config::load_from(Some(path.clone()))
            .with_context(|| format!("failed to load config from {}", path.display()))
    } else {
        Config::load().context("failed to load config")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Ingest {
            root,
            chunk_size,
            chunk_overlap,
            db,
        } => {
            let root = root.unwrap_or_else(|| config.ingest.root.clone());
            let db_path = db.unwrap_or_else(|| config.ingest.db_path.clone());
            let chunk_config = ChunkConfig::new(
                chunk_size.unwrap_or(config.chunking.chunk_size),
                chunk_overlap.unwrap_or(config.chunking.chunk_overlap),
            );
            chunk_config
                .validate()
                .context("invalid chunking settings")?;

            if !root.exists() {
                anyhow::bail!("document root does not exist: {}", root.display());
            }

            let embedder = create_embedder().await?;
            let store = Arc::new(LanceStore::new(db_path, EMBEDDING_DIM));

            let pipeline = IngestPipeline::new(
                Arc::new(MarkdownExtractor::new()),
                Arc::new(RecursiveCharacterChunker::new()),
                embedder,
                store,
                chunk_config,
            );

            let report = pipeline
                .run(&root)
                .await
                .context("ingestion failed")?;

            match cli.format {
                OutputFormat::Json => {
                    let output = IngestOutput {
                        root: root.to_string_lossy().to_string(),
                        documents: report.documents,
                        chunks: report.chunks,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!(
                        "Ingested {} documents ({} chunks) from {}",
                        report.documents,
                        report.chunks,
                        root.display()
                    );
                }
            }
        }

        Commands::Query { text, top_n, db } => {
            let db_path = db.unwrap_or_else(|| config.ingest.db_path.clone());
            let top_n = top_n.unwrap_or(config.query.top_n);

            let embedder = create_embedder().await?;
            let store = Arc::new(LanceStore::new(db_path, EMBEDDING_DIM));

            let executor = QueryExecutor::new(store, embedder);
            let results = executor
                .execute(&text, top_n)
                .await
                .context("query execution failed")?;

            print_matches(&text, &results, cli.format)?;
        }

        Commands::Status { db } => {
            let db_path = db.unwrap_or_else(|| config.ingest.db_path.clone());
            let store = LanceStore::new(db_path.clone(), EMBEDDING_DIM);

            match store.count().await {
                Ok(chunks) => match cli.format {
                    OutputFormat::Json => {
                        let output = StatusOutput {
                            db_path: db_path.to_string_lossy().to_string(),
                            chunks,
                        };
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("Store at {}", db_path.display());
                        println!("  Chunks: {chunks}");
                    }
                },
                Err(StoreError::CollectionMissing(_)) => match cli.format {
                    OutputFormat::Json => {
                        println!(r#"{{"error": "store not found"}}"#);
                    }
                    OutputFormat::Text => {
                        println!("No store found at {}", db_path.display());
                        println!("Run 'mdrag ingest' to create it.");
                    }
                },
                Err(e) => return Err(e).context("failed to read store status"),
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

fn print_matches(query: &str, results: &[QueryMatch], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = QueryOutput {
                query: query.to_string(),
                results: results
                    .iter()
                    .map(|m| ResultItem {
                        id: m.id.clone(),
                        distance: m.distance,
                        text: truncate(&m.text, 200),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Query: {query}\n");
            if results.is_empty() {
                println!("No results found.");
            } else {
                for (i, m) in results.iter().enumerate() {
                    println!("{}. (distance: {:.4})", i + 1, m.distance);
                    println!("   {}", truncate(&m.text, 100));
                    println!();
                }
            }
        }
    }
    Ok(())
}

/// Truncate a string to max characters, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ").replace('\r', "");
    if s.chars().count() <= max_len {
        s
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
