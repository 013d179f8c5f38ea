//! Per-repository artifact cache.
//!
//! Each repository's indexed artifacts are stored as one JSON file,
//! `<root>/<alias>.json`, holding `{ "items": [...], "timestamp": ... }`.
//! Writes go to a temp file that is renamed over the target. A missing or
//! unparseable file reads back as "no cache".

use chrono::Utc;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Repository;
use crate::error::{Result, StashError};
use crate::models::{ArtifactRecord, CachedCollection};

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, alias: &str) -> PathBuf {
        self.root.join(format!("{}.json", alias))
    }

    /// Replace the cache for `alias` with `items`.
    pub fn save(&self, alias: &str, items: &[ArtifactRecord]) -> Result<()> {
        let path = self.path_for(alias);
        fs::create_dir_all(&self.root).map_err(|e| StashError::cache_write(&self.root, e))?;

        let envelope = CachedCollection {
            items: items.to_vec(),
            timestamp: Utc::now(),
        };
        let serialized = serde_json::to_string_pretty(&envelope)
            .map_err(|e| StashError::cache_write(&path, e.into()))?;

        let temp_path = path.with_extension(format!("json.{}.tmp", std::process::id()));
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(serialized.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&temp_path, &path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(StashError::cache_write(&path, e));
        }

        debug!("cached {} artifacts for '{}'", items.len(), alias);
        Ok(())
    }

    /// Read the full envelope, or `None` if absent or unreadable.
    pub fn load_collection(&self, alias: &str) -> Option<CachedCollection> {
        let path = self.path_for(alias);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("unreadable cache {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(collection) => Some(collection),
            Err(e) => {
                debug!("corrupt cache {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Cached items for `alias`, or `None` meaning the repository must be reindexed.
    pub fn load(&self, alias: &str) -> Option<Vec<ArtifactRecord>> {
        self.load_collection(alias).map(|c| c.items)
    }

    /// Concatenate cached items in repository order, skipping repositories without a cache.
    pub fn load_all(&self, repositories: &[Repository]) -> Vec<ArtifactRecord> {
        repositories
            .iter()
            .filter_map(|repo| self.load(&repo.alias))
            .flatten()
            .collect()
    }

    /// Remove the cache for `alias`, or every cache file when `alias` is `None`.
    pub fn clear(&self, alias: Option<&str>) -> Result<()> {
        match alias {
            Some(alias) => remove_if_exists(&self.path_for(alias)),
            None => {
                let entries = match fs::read_dir(&self.root) {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
                    Err(e) => return Err(StashError::cache_write(&self.root, e)),
                };
                for entry in entries {
                    let entry = entry.map_err(|e| StashError::cache_write(&self.root, e))?;
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                        remove_if_exists(&path)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StashError::cache_write(path, e)),
    }
}
