//! Error types for the indexing and caching core.
//!
//! Metadata parse failures and unreadable caches never show up here: both
//! are collapsed to "absent" where they happen.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StashError {
    /// The repository's local path does not exist.
    #[error("Repository path does not exist: {}", path.display())]
    Path { path: PathBuf },

    /// Traversal of a repository subtree failed.
    #[error("Failed to index {}: {source}", path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or deleting a cache file failed.
    #[error("Failed to write cache {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StashError {
    pub(crate) fn index(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        StashError::Index {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn cache_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StashError::CacheWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StashError>;
