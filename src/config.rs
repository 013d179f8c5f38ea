//! TOML configuration store.
//!
//! Holds the repository list, the storage root for cache files, the cache
//! expiry and search defaults. Unlike a read-only settings file this store is
//! written back: refreshes reset repository timestamps and the `repo` and
//! `config` commands edit it in place.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry_minutes: default_expiry_minutes(),
        }
    }
}

impl CacheConfig {
    /// Saturates instead of panicking on values `validate` would reject.
    pub fn expiry(&self) -> Duration {
        Duration::try_minutes(self.expiry_minutes).unwrap_or(Duration::MAX)
    }
}

fn default_expiry_minutes() -> i64 {
    120
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            limit: default_limit(),
            default_scope: None,
        }
    }
}

fn default_threshold() -> f64 {
    0.3
}
fn default_limit() -> usize {
    20
}

/// A locally synced content repository.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Repository {
    pub alias: String,
    #[serde(default)]
    pub url: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Config {
    pub fn repository(&self, alias: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.alias == alias)
    }

    pub fn add_repository(&mut self, repo: Repository) -> Result<()> {
        validate_alias(&repo.alias)?;
        if self.repository(&repo.alias).is_some() {
            bail!("Repository '{}' already exists", repo.alias);
        }
        self.repositories.push(repo);
        Ok(())
    }

    pub fn remove_repository(&mut self, alias: &str) -> Result<Repository> {
        let pos = self
            .repositories
            .iter()
            .position(|r| r.alias == alias)
            .ok_or_else(|| anyhow::anyhow!("Unknown repository: '{}'", alias))?;
        Ok(self.repositories.remove(pos))
    }

    /// Record a successful re-index. Returns `false` for an unknown alias.
    pub fn touch_repository(&mut self, alias: &str, now: DateTime<Utc>) -> bool {
        match self.repositories.iter_mut().find(|r| r.alias == alias) {
            Some(repo) => {
                repo.last_updated = Some(now);
                true
            }
            None => false,
        }
    }
}

fn validate_alias(alias: &str) -> Result<()> {
    if alias.is_empty() {
        bail!("Repository alias must not be empty");
    }
    if alias.contains('/') || alias.contains('\\') {
        bail!("Repository alias '{}' must not contain path separators", alias);
    }
    if alias.starts_with('.') {
        bail!("Repository alias '{}' must not start with '.'", alias);
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load the config, or start from defaults if the file does not exist yet.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    validate(config)?;
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let temp_path = path.with_extension(format!("toml.{}.tmp", std::process::id()));
    std::fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to replace config file: {}", path.display()))?;
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    // Validate cache
    if config.cache.expiry_minutes <= 0 {
        bail!("cache.expiry_minutes must be > 0");
    }
    if Duration::try_minutes(config.cache.expiry_minutes).is_none() {
        bail!(
            "cache.expiry_minutes is too large: {}",
            config.cache.expiry_minutes
        );
    }

    // Validate search
    if !(0.0..1.0).contains(&config.search.threshold) {
        bail!("search.threshold must be in [0.0, 1.0)");
    }
    if config.search.limit < 1 {
        bail!("search.limit must be >= 1");
    }

    // Validate repositories
    let mut seen = std::collections::HashSet::new();
    for repo in &config.repositories {
        validate_alias(&repo.alias)?;
        if !seen.insert(repo.alias.as_str()) {
            bail!("Duplicate repository alias: '{}'", repo.alias);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo(alias: &str) -> Repository {
        Repository {
            alias: alias.to_string(),
            url: String::new(),
            path: PathBuf::from("/tmp/nowhere"),
            last_updated: None,
        }
    }

    #[test]
    fn test_defaults_for_missing_tables() {
        let config: Config = toml::from_str(
            r#"
[[repositories]]
alias = "main"
path = "/srv/snippets"
"#,
        )
        .unwrap();
        assert_eq!(config.cache.expiry_minutes, 120);
        assert!((config.search.threshold - 0.3).abs() < 1e-9);
        assert_eq!(config.search.limit, 20);
        assert_eq!(config.storage.root, PathBuf::from("./data"));
        assert_eq!(config.repositories.len(), 1);
        assert!(config.repositories[0].last_updated.is_none());
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stash.toml");
        std::fs::write(
            &path,
            r#"
[[repositories]]
alias = "main"
path = "/a"

[[repositories]]
alias = "main"
path = "/b"
"#,
        )
        .unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Duplicate repository alias"));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stash.toml");
        std::fs::write(&path, "[search]\nthreshold = 1.5\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_overflowing_expiry_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stash.toml");
        std::fs::write(&path, "[cache]\nexpiry_minutes = 9223372036854775807\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("expiry_minutes"));

        let cache = CacheConfig {
            expiry_minutes: i64::MAX,
        };
        assert_eq!(cache.expiry(), Duration::MAX);
    }

    #[test]
    fn test_add_remove_touch() {
        let mut config = Config::default();
        config.add_repository(repo("main")).unwrap();
        assert!(config.add_repository(repo("main")).is_err());
        assert!(config.add_repository(repo("a/b")).is_err());

        let now = Utc::now();
        assert!(config.touch_repository("main", now));
        assert!(!config.touch_repository("other", now));
        assert_eq!(config.repository("main").unwrap().last_updated, Some(now));

        let removed = config.remove_repository("main").unwrap();
        assert_eq!(removed.alias, "main");
        assert!(config.remove_repository("main").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config").join("stash.toml");

        let mut config = Config::default();
        config.search.default_scope = Some("main/js".to_string());
        config.add_repository(repo("main")).unwrap();
        config.touch_repository("main", Utc::now());
        save_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.repositories, config.repositories);
        assert_eq!(loaded.search.default_scope.as_deref(), Some("main/js"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert!(config.repositories.is_empty());
    }
}
