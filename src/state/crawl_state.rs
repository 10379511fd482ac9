//! Persisted cursor state
//!
//! The state file is the only artifact carried between runs. It is read once
//! at startup and replaced wholesale after a fully successful crawl.

use crate::state::Cursor;
use crate::ArchiverError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading the state file
///
/// These are never fatal: the coordinator falls back to the default state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed state file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Cursors of both feeds, as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    #[serde(rename = "mainQuoteId", default = "default_main")]
    pub main: Cursor,

    #[serde(rename = "abyssBestQuoteId", default = "default_abyss_best")]
    pub abyss_best: Cursor,
}

fn default_main() -> Cursor {
    Cursor::new(Cursor::MAIN_SENTINEL)
}

fn default_abyss_best() -> Cursor {
    Cursor::new(Cursor::ABYSS_BEST_SENTINEL)
}

impl Default for CrawlState {
    fn default() -> Self {
        Self {
            main: default_main(),
            abyss_best: default_abyss_best(),
        }
    }
}

impl CrawlState {
    /// Reads the state file
    ///
    /// A key missing from the file keeps its sentinel value.
    pub async fn load(path: &Path) -> Result<Self, StateError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reads the state file, treating any failure as a first run
    pub async fn load_or_default(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(state) => {
                tracing::debug!(
                    "Loaded state from {}: main={}, abyss-best={}",
                    path.display(),
                    state.main,
                    state.abyss_best
                );
                state
            }
            Err(StateError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No state file at {}, starting from scratch", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable state file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Replaces the state file
    ///
    /// The JSON is written to a sibling temporary file first and renamed over
    /// the target, so readers only ever observe the old or the new state.
    pub async fn save(&self, path: &Path) -> Result<(), ArchiverError> {
        let body = serde_json::to_string(self)?;
        let tmp_path = temp_path(path);

        tokio::fs::write(&tmp_path, body)
            .await
            .map_err(|source| ArchiverError::StateSave {
                path: tmp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ArchiverError::StateSave {
                path: path.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
