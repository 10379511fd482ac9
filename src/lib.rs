//! Quote Archiver: an incremental quote site archiver
//!
//! This crate walks the main and abyss-best feeds of a quote site, saves every
//! quote newer than the last run's high-water mark as its own text file, and
//! records the new high-water marks in a small JSON state file.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archiver operations
#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to save crawl state to {}: {source}", .path.display())]
    StateSave {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode crawl state: {0}")]
    StateEncode(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Walker task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ArchiverError {
    /// Returns true for errors raised while fetching a page
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown charset: {0}")]
    UnknownCharset(String),
}

/// Result type alias for archiver operations
pub type Result<T> = std::result::Result<T, ArchiverError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Record};
pub use output::CrawlSummary;
pub use state::{CrawlState, Cursor, IdOrdering};
