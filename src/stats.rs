//! Cache overview.
//!
//! Summarizes what each repository's cache holds: artifact counts per type,
//! when it was written, and whether the repository is due for a refresh.
//! Used by `stash stats` to check that indexing picked up what was expected.

use chrono::{DateTime, Utc};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::models::ArtifactKind;
use crate::refresh::is_expired;

/// Per-repository breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryStats {
    pub alias: String,
    pub snippets: usize,
    pub boilerplates: usize,
    pub modules: usize,
    pub scopes: usize,
    pub cached_at: Option<DateTime<Utc>>,
    pub expired: bool,
}

impl RepositoryStats {
    pub fn total(&self) -> usize {
        self.snippets + self.boilerplates + self.modules
    }
}

pub fn collect_stats(
    config: &Config,
    cache: &CacheStore,
    now: DateTime<Utc>,
) -> Vec<RepositoryStats> {
    let expiry = config.cache.expiry();
    config
        .repositories
        .iter()
        .map(|repo| {
            let collection = cache.load_collection(&repo.alias);
            let mut stats = RepositoryStats {
                alias: repo.alias.clone(),
                snippets: 0,
                boilerplates: 0,
                modules: 0,
                scopes: 0,
                cached_at: collection.as_ref().map(|c| c.timestamp),
                expired: collection.is_none() || is_expired(repo, now, expiry),
            };
            if let Some(collection) = collection {
                let mut scopes = std::collections::BTreeSet::new();
                for item in &collection.items {
                    scopes.insert(item.scope.as_str());
                    match item.kind {
                        ArtifactKind::Snippet => stats.snippets += 1,
                        ArtifactKind::Boilerplate => stats.boilerplates += 1,
                        ArtifactKind::Module => stats.modules += 1,
                    }
                }
                stats.scopes = scopes.len();
            }
            stats
        })
        .collect()
}

/// Run the stats command: read every cache and print a summary.
pub fn run_stats(config: &Config, cache: &CacheStore) {
    let now = Utc::now();
    let stats = collect_stats(config, cache, now);

    println!("Code Stash — Cache Stats");
    println!("========================");
    println!();
    println!("  Cache dir:   {}", cache.root().display());
    println!("  Expiry:      {} min", config.cache.expiry_minutes);
    println!();

    if stats.is_empty() {
        println!("  No repositories configured.");
        return;
    }

    println!(
        "  {:<16} {:>8} {:>12} {:>8} {:>7} {:>12}  STATUS",
        "REPOSITORY", "SNIPPETS", "BOILERPLATES", "MODULES", "SCOPES", "CACHE AGE"
    );
    for s in &stats {
        let age = s
            .cached_at
            .map(|t| format_age(now - t))
            .unwrap_or_else(|| "-".to_string());
        let status = if s.cached_at.is_none() {
            "not cached"
        } else if s.expired {
            "expired"
        } else {
            "fresh"
        };
        println!(
            "  {:<16} {:>8} {:>12} {:>8} {:>7} {:>12}  {}",
            s.alias, s.snippets, s.boilerplates, s.modules, s.scopes, age, status
        );
    }

    let total: usize = stats.iter().map(RepositoryStats::total).sum();
    println!();
    println!("  Total artifacts: {}", total);
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d", secs / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Repository;
    use crate::models::ArtifactRecord;
    use chrono::Duration;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(5)), "5s");
        assert_eq!(format_age(Duration::seconds(125)), "2m");
        assert_eq!(format_age(Duration::minutes(150)), "2h 30m");
        assert_eq!(format_age(Duration::days(3)), "3d");
        assert_eq!(format_age(Duration::seconds(-10)), "0s");
    }

    #[test]
    fn test_collect_stats_counts_by_kind() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::new(tmp.path());
        let now = Utc::now();

        let mut config = Config::default();
        for alias in ["main", "empty"] {
            config.repositories.push(Repository {
                alias: alias.to_string(),
                url: String::new(),
                path: PathBuf::from("/unused"),
                last_updated: Some(now),
            });
        }

        let dir = PathBuf::from("/main/js/snippet/util");
        cache
            .save(
                "main",
                &[
                    ArtifactRecord::snippet(
                        "a".to_string(),
                        "main",
                        "js",
                        "util",
                        dir.clone(),
                        dir.join("a.js"),
                        None,
                    ),
                    ArtifactRecord::folder(
                        ArtifactKind::Module,
                        "m".to_string(),
                        "main",
                        "go",
                        PathBuf::from("/main/go/module/m"),
                        None,
                    ),
                ],
            )
            .unwrap();

        let stats = collect_stats(&config, &cache, now);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].snippets, 1);
        assert_eq!(stats[0].modules, 1);
        assert_eq!(stats[0].scopes, 2);
        assert_eq!(stats[0].total(), 2);
        assert!(!stats[0].expired);
        assert!(stats[1].cached_at.is_none());
        assert!(stats[1].expired);
    }
}
