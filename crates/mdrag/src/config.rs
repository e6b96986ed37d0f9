//! Configuration handling for mdrag.
//!
//! Settings come from a TOML file (explicit `--config` path or the platform
//! config directory), with CLI flags taking precedence and serde defaults
//! filling the rest.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,
}

/// Ingestion-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory scanned for Markdown files
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Local path of the vector database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("./markdown_pages")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./mdrag_db")
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            db_path: default_db_path(),
        }
    }
}

/// Chunking-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size (characters)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks (characters)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Query-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default number of results
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    3
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists.
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(Some(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path. A missing file is an error
    /// here, unlike [`load`](Config::load).
    pub fn load_from(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Default config file path.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Sample configuration file contents.
    pub fn sample_toml() -> String {
        let sample = Self::default();
        toml::to_string_pretty(&sample)
            .unwrap_or_else(|_| String::from("# failed to render sample config\n"))
    }
}

/// Get the XDG data directory for mdrag (model cache lives here).
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MDRAG_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "mdrag").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the XDG config directory for mdrag.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MDRAG_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "mdrag").map(|dirs| dirs.config_dir().to_path_buf())
}
