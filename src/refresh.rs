//! Cache refresh orchestration.
//!
//! Decides which repositories need re-indexing, re-indexes them
//! concurrently, and aggregates every repository's artifacts in config
//! order. A repository that fails to refresh is reported and falls back to
//! whatever it had cached; the others are unaffected.

use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::{save_config, Config, Repository};
use crate::error::Result;
use crate::indexer::index_repository;
use crate::models::ArtifactRecord;

/// A repository's cache is expired when it was never indexed or when more
/// than `expiry` has passed since it was.
pub fn is_expired(repo: &Repository, now: DateTime<Utc>, expiry: Duration) -> bool {
    match repo.last_updated {
        Some(last) => now - last > expiry,
        None => true,
    }
}

/// Re-index one repository and replace its cache.
pub fn refresh_repository(repo: &Repository, cache: &CacheStore) -> Result<Vec<ArtifactRecord>> {
    let items = index_repository(repo)?;
    cache.save(&repo.alias, &items)?;
    Ok(items)
}

#[derive(Debug, Clone)]
pub struct RefreshFailure {
    pub alias: String,
    pub error: String,
    /// Whether older cached artifacts were served instead.
    pub served_stale: bool,
}

#[derive(Debug, Default, Clone)]
pub struct RefreshReport {
    /// `(alias, artifact count)` for each repository re-indexed.
    pub refreshed: Vec<(String, usize)>,
    pub failures: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Bring every configured repository's cache up to date and return all
/// artifacts in repository order.
///
/// A repository is re-indexed when `force` is set, its timestamp is
/// expired, or it has no usable cache. Successful refreshes reset the
/// repository's `last_updated` in `config`; persisting the config is up to
/// the caller.
pub async fn collect_artifacts(
    config: &mut Config,
    cache: &CacheStore,
    now: DateTime<Utc>,
    force: bool,
) -> (Vec<ArtifactRecord>, RefreshReport) {
    let expiry = config.cache.expiry();

    let mut slots: Vec<Option<Vec<ArtifactRecord>>> = Vec::with_capacity(config.repositories.len());
    let mut tasks = Vec::new();

    for (idx, repo) in config.repositories.iter().enumerate() {
        let cached = cache.load(&repo.alias);
        let stale = force || cached.is_none() || is_expired(repo, now, expiry);
        slots.push(cached);

        if stale {
            let repo = repo.clone();
            let cache = cache.clone();
            let handle =
                tokio::task::spawn_blocking(move || refresh_repository(&repo, &cache));
            tasks.push((idx, handle));
        }
    }

    let mut report = RefreshReport::default();
    for (idx, handle) in tasks {
        let alias = config.repositories[idx].alias.clone();
        let outcome = match handle.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(join_err) => Err(format!("indexing task failed: {}", join_err)),
        };

        match outcome {
            Ok(items) => {
                info!("re-indexed '{}': {} artifacts", alias, items.len());
                config.touch_repository(&alias, now);
                report.refreshed.push((alias, items.len()));
                slots[idx] = Some(items);
            }
            Err(error) => {
                let served_stale = slots[idx].is_some();
                warn!(
                    "failed to refresh '{}': {}{}",
                    alias,
                    error,
                    if served_stale { " (using stale cache)" } else { "" }
                );
                report.failures.push(RefreshFailure {
                    alias,
                    error,
                    served_stale,
                });
            }
        }
    }

    let items = slots.into_iter().flatten().flatten().collect();
    (items, report)
}

/// [`collect_artifacts`] against the configured cache, writing refreshed
/// timestamps back to `config_path`.
pub async fn collect_and_persist(
    config_path: &Path,
    config: &mut Config,
    force: bool,
) -> anyhow::Result<(Vec<ArtifactRecord>, RefreshReport)> {
    let cache = CacheStore::new(config.storage.cache_dir());
    let (items, report) = collect_artifacts(config, &cache, Utc::now(), force).await;
    if !report.refreshed.is_empty() {
        save_config(config_path, config)?;
    }
    Ok((items, report))
}

/// Run the index command for one repository or all of them.
pub async fn run_index(
    config_path: &Path,
    config: &mut Config,
    alias: Option<&str>,
    force: bool,
) -> anyhow::Result<()> {
    if let Some(alias) = alias {
        let repo = config
            .repository(alias)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown repository: '{}'", alias))?;
        let cache = CacheStore::new(config.storage.cache_dir());
        let now = Utc::now();
        if !force && cache.load(alias).is_some() && !is_expired(&repo, now, config.cache.expiry()) {
            println!("index {}", alias);
            println!("  cache is fresh (use --force to re-index)");
            return Ok(());
        }

        let items = tokio::task::spawn_blocking(move || refresh_repository(&repo, &cache)).await??;
        config.touch_repository(alias, now);
        save_config(config_path, config)?;

        println!("index {}", alias);
        println!("  artifacts: {}", items.len());
        println!("ok");
        return Ok(());
    }

    let (items, report) = collect_and_persist(config_path, config, force).await?;

    println!("index");
    for (alias, count) in &report.refreshed {
        println!("  {}: {} artifacts", alias, count);
    }
    for failure in &report.failures {
        println!("  {}: FAILED ({})", failure.alias, failure.error);
    }
    if report.refreshed.is_empty() && report.failures.is_empty() {
        println!("  all caches fresh (use --force to re-index)");
    }
    println!("  total artifacts: {}", items.len());
    if report.is_clean() {
        println!("ok");
    }
    Ok(())
}
