//! Repository, scope and cache management commands.
//!
//! These edit the config store and print to stdout. Fetching repository
//! content is not done here: a repository is registered by the local path
//! its checkout lives at.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::Path;

use crate::cache::CacheStore;
use crate::config::{load_or_default, save_config, Config, Repository};
use crate::refresh::is_expired;
use crate::scope::{autocomplete_scopes, is_valid_scope};

pub fn run_repo_add(config_path: &Path, alias: &str, path: &Path, url: Option<String>) -> Result<()> {
    let mut config = load_or_default(config_path)?;

    let path = if path.exists() {
        std::fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?
    } else {
        path.to_path_buf()
    };

    config.add_repository(Repository {
        alias: alias.to_string(),
        url: url.unwrap_or_default(),
        path: path.clone(),
        last_updated: None,
    })?;
    save_config(config_path, &config)?;

    println!("Added repository '{}' at {}", alias, path.display());
    if !path.exists() {
        println!("  note: path does not exist yet; it will be indexed once populated");
    }
    Ok(())
}

pub fn run_repo_remove(config_path: &Path, config: &mut Config, alias: &str) -> Result<()> {
    let removed = config.remove_repository(alias)?;
    if config.search.default_scope.as_deref().is_some_and(|s| {
        s == removed.alias || s.starts_with(&format!("{}/", removed.alias))
    }) {
        config.search.default_scope = None;
    }

    cache_for(config).clear(Some(alias))?;
    save_config(config_path, config)?;

    println!("Removed repository '{}'", alias);
    Ok(())
}

pub fn run_repo_list(config: &Config) {
    if config.repositories.is_empty() {
        println!("No repositories configured.");
        return;
    }

    let now = Utc::now();
    let expiry = config.cache.expiry();
    println!("{:<16} {:<10} {:<22} PATH", "ALIAS", "STATUS", "LAST UPDATED");
    for repo in &config.repositories {
        let status = match repo.last_updated {
            None => "never",
            Some(_) if is_expired(repo, now, expiry) => "expired",
            Some(_) => "fresh",
        };
        let updated = repo
            .last_updated
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<10} {:<22} {}",
            repo.alias,
            status,
            updated,
            repo.path.display()
        );
        if !repo.url.is_empty() {
            println!("{:<16} url: {}", "", repo.url);
        }
    }
}

/// Print every valid scope string, one per line, from cached data.
pub fn run_scopes(config: &Config) {
    let items = cache_for(config).load_all(&config.repositories);
    for scope in autocomplete_scopes(&items) {
        println!("{}", scope);
    }
}

pub fn run_set_scope(config_path: &Path, config: &mut Config, scope: &str) -> Result<()> {
    let items = cache_for(config).load_all(&config.repositories);
    if !is_valid_scope(scope, &items) {
        bail!(
            "Unknown scope: '{}'. Run `stash scopes` to list valid scopes (index first if empty).",
            scope
        );
    }
    config.search.default_scope = Some(scope.to_string());
    save_config(config_path, config)?;
    println!("Default scope set to '{}'", scope);
    Ok(())
}

pub fn run_unset_scope(config_path: &Path, config: &mut Config) -> Result<()> {
    config.search.default_scope = None;
    save_config(config_path, config)?;
    println!("Default scope cleared");
    Ok(())
}

pub fn run_cache_clear(config: &Config, alias: Option<&str>) -> Result<()> {
    if let Some(alias) = alias {
        if config.repository(alias).is_none() {
            bail!("Unknown repository: '{}'", alias);
        }
    }
    cache_for(config).clear(alias)?;
    match alias {
        Some(alias) => println!("Cleared cache for '{}'", alias),
        None => println!("Cleared all caches"),
    }
    Ok(())
}

fn cache_for(config: &Config) -> CacheStore {
    CacheStore::new(config.storage.cache_dir())
}
