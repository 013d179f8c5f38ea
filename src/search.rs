//! Fuzzy artifact search.
//!
//! Items are first narrowed by [`ScopeFilter`], then ranked by fuzzy
//! matching the query against one lowercase string per item built from its
//! name, category, scope, description and tags.
//!
//! Raw matcher scores are normalized against the score the query earns
//! against itself, so an exact full-string match is `1.0` and scores land
//! in `[0.0, 1.0]`. Anything at or below the threshold is dropped.

use anyhow::Result;
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32String};
use std::path::Path;

use crate::config::Config;
use crate::models::{ArtifactRecord, SearchResult};
use crate::refresh::collect_and_persist;
use crate::scope::ScopeFilter;

/// Minimum normalized score a result must exceed.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Search with the default threshold.
pub fn search(items: &[ArtifactRecord], query: &str, scope: Option<&str>) -> Vec<SearchResult> {
    search_with_threshold(items, query, scope, DEFAULT_THRESHOLD)
}

pub fn search_with_threshold(
    items: &[ArtifactRecord],
    query: &str,
    scope: Option<&str>,
    threshold: f64,
) -> Vec<SearchResult> {
    let candidates = ScopeFilter::parse(scope).apply(items);

    if query.trim().is_empty() {
        return candidates
            .into_iter()
            .map(|item| SearchResult {
                item: item.clone(),
                score: 1.0,
            })
            .collect();
    }

    let mut scorer = FuzzyScorer::new(query);
    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|item| {
            let score = scorer.score(&searchable_text(item));
            (score > threshold).then(|| SearchResult {
                item: item.clone(),
                score,
            })
        })
        .collect();

    // Stable: equal scores keep filter order.
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results
}

/// Space-joined lowercase text the query is matched against. Absent fields are omitted.
pub fn searchable_text(item: &ArtifactRecord) -> String {
    let mut parts: Vec<&str> = vec![item.name.as_str()];
    if let Some(category) = &item.category {
        parts.push(category);
    }
    parts.push(&item.scope);
    if let Some(meta) = &item.metadata {
        if let Some(description) = &meta.description {
            parts.push(description);
        }
        if let Some(tags) = &meta.tags {
            parts.extend(tags.iter().map(String::as_str));
        }
    }
    parts.join(" ").to_lowercase()
}

/// Scores haystacks against one query, normalized to `[0.0, 1.0]`.
pub struct FuzzyScorer {
    matcher: Matcher,
    pattern: Pattern,
    perfect: Option<u32>,
}

impl FuzzyScorer {
    pub fn new(query: &str) -> Self {
        let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let own = Utf32String::from(query.to_lowercase().as_str());
        let perfect = pattern
            .score(own.slice(..), &mut matcher)
            .filter(|score| *score > 0);
        Self {
            matcher,
            pattern,
            perfect,
        }
    }

    /// `0.0` when the query's characters do not all appear in order.
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&mut self, haystack: &str) -> f64 {
        let Some(perfect) = self.perfect else {
            return 0.0;
        };
        let haystack = Utf32String::from(haystack);
        match self.pattern.score(haystack.slice(..), &mut self.matcher) {
            Some(raw) => (raw as f64 / perfect as f64).min(1.0),
            None => 0.0,
        }
    }
}

/// Options for the search command, as given on the command line.
#[derive(Debug, Default)]
pub struct SearchArgs {
    pub scope: Option<String>,
    /// Ignore the configured default scope.
    pub all: bool,
    pub limit: Option<usize>,
    pub json: bool,
}

/// Run the search command: refresh stale caches, rank, and print.
pub async fn run_search(
    config_path: &Path,
    config: &mut Config,
    query: &str,
    args: SearchArgs,
) -> Result<()> {
    let (items, _report) = collect_and_persist(config_path, config, false).await?;

    let scope = if args.all {
        None
    } else {
        args.scope.or_else(|| config.search.default_scope.clone())
    };
    let limit = args.limit.unwrap_or(config.search.limit);

    let mut results =
        search_with_threshold(&items, query, scope.as_deref(), config.search.threshold);
    results.truncate(limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let item = &result.item;
        println!(
            "{}. [{:.2}] {} ({}) {}",
            i + 1,
            result.score,
            item.name,
            item.kind,
            item.location()
        );
        if let Some(description) = item.metadata.as_ref().and_then(|m| m.description.as_ref()) {
            println!("    {}", description);
        }
        println!("    path: {}", item.target_path().display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtifactKind, ArtifactMetadata};
    use std::path::PathBuf;

    fn snippet(repo: &str, scope: &str, category: &str, name: &str) -> ArtifactRecord {
        let dir = PathBuf::from(format!("/{}/{}/snippet/{}", repo, scope, category));
        ArtifactRecord::snippet(
            name.to_string(),
            repo,
            scope,
            category,
            dir.clone(),
            dir.join(format!("{}.js", name)),
            None,
        )
    }

    fn with_meta(mut item: ArtifactRecord, description: &str, tags: &[&str]) -> ArtifactRecord {
        item.metadata = Some(ArtifactMetadata {
            description: Some(description.to_string()),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..Default::default()
        });
        item
    }

    fn fixture() -> Vec<ArtifactRecord> {
        vec![
            snippet("repoA", "js", "timing", "debounce"),
            with_meta(
                snippet("repoA", "js", "timing", "throttle"),
                "Rate limit calls",
                &["events"],
            ),
            snippet("repoB", "python", "io", "read-lines"),
            ArtifactRecord::folder(
                ArtifactKind::Boilerplate,
                "express-api".to_string(),
                "repoB",
                "repoA",
                PathBuf::from("/repoB/repoA/boilerplate/express-api"),
                None,
            ),
        ]
    }

    #[test]
    fn test_searchable_text_omits_absent_fields() {
        let plain = snippet("repoA", "js", "timing", "Debounce");
        assert_eq!(searchable_text(&plain), "debounce timing js");

        let meta = with_meta(plain, "Delay Calls", &["Perf", "ui"]);
        assert_eq!(searchable_text(&meta), "debounce timing js delay calls perf ui");

        let folder = ArtifactRecord::folder(
            ArtifactKind::Module,
            "auth".to_string(),
            "main",
            "go",
            PathBuf::from("/x"),
            None,
        );
        assert_eq!(searchable_text(&folder), "auth go");
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        let items = fixture();
        let results = search(&items, "   ", None);
        assert_eq!(results.len(), items.len());
        for (result, item) in results.iter().zip(&items) {
            assert_eq!(&result.item, item);
            assert_eq!(result.score, 1.0);
        }
    }

    #[test]
    fn test_empty_query_respects_scope() {
        let items = fixture();
        let results = search(&items, "", Some("repoB/python"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.name, "read-lines");
    }

    #[test]
    fn test_bare_scope_never_leaks_other_repositories() {
        let items = fixture();
        for query in ["", "e", "debounce", "api"] {
            for result in search(&items, query, Some("repoA")) {
                assert!(
                    result.item.repository == "repoA" || result.item.scope == "repoA",
                    "leaked {:?} for query {:?}",
                    result.item,
                    query
                );
            }
        }
        // The boilerplate lives in repoB but under a scope named repoA.
        let results = search(&items, "express", Some("repoA"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.name, "express-api");
    }

    #[test]
    fn test_exact_name_ranks_first() {
        let items = fixture();
        let results = search(&items, "debounce", None);
        assert!(!results.is_empty());
        assert_eq!(results[0].item.name, "debounce");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(results
            .iter()
            .all(|r| r.score > DEFAULT_THRESHOLD && r.score <= 1.0));
    }

    #[test]
    fn test_matches_description_and_tags() {
        let items = fixture();
        let by_description = search(&items, "rate limit", None);
        assert_eq!(by_description[0].item.name, "throttle");

        let by_tag = search(&items, "events", None);
        assert_eq!(by_tag[0].item.name, "throttle");
    }

    #[test]
    fn test_query_case_is_ignored() {
        let items = fixture();
        let results = search(&items, "DEBOUNCE", None);
        assert_eq!(results[0].item.name, "debounce");
    }

    #[test]
    fn test_irrelevant_query_returns_nothing() {
        let items = fixture();
        assert!(search(&items, "completelyirrelevantstring123", None).is_empty());
    }

    #[test]
    fn test_scorer_contract() {
        let mut scorer = FuzzyScorer::new("logger");
        let exact = scorer.score("logger");
        let partial = scorer.score("log-tagger");
        let none = scorer.score("xyz");

        assert!((exact - 1.0).abs() < 1e-9);
        assert!(partial < exact);
        assert!(partial > 0.0);
        assert_eq!(none, 0.0);
        // Deterministic for identical inputs.
        assert_eq!(scorer.score("log-tagger"), partial);
    }

    #[test]
    fn test_higher_threshold_filters_more() {
        let items = fixture();
        let loose = search_with_threshold(&items, "deb", None, 0.0);
        let strict = search_with_threshold(&items, "deb", None, 0.99);
        assert!(strict.len() <= loose.len());
    }
}
