//! Scope strings: parsing, filtering and autocomplete.
//!
//! A scope is either `repo/scope` (both must match) or a bare name, which
//! matches an artifact whose repository alias *or* scope equals it.

use std::collections::BTreeSet;

use crate::models::ArtifactRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    Any,
    /// Bare name: repository alias or scope name.
    Name(String),
    Qualified { repository: String, scope: String },
}

impl ScopeFilter {
    /// Surrounding whitespace is trimmed and a blank string means no filter.
    /// Only the first `/` splits, so `a/b/c` is repository `a`, scope `b/c`.
    pub fn parse(scope: Option<&str>) -> Self {
        let Some(scope) = scope.map(str::trim).filter(|s| !s.is_empty()) else {
            return ScopeFilter::Any;
        };
        match scope.split_once('/') {
            Some((repository, scope)) => ScopeFilter::Qualified {
                repository: repository.to_string(),
                scope: scope.to_string(),
            },
            None => ScopeFilter::Name(scope.to_string()),
        }
    }

    pub fn matches(&self, item: &ArtifactRecord) -> bool {
        match self {
            ScopeFilter::Any => true,
            ScopeFilter::Name(name) => item.repository == *name || item.scope == *name,
            ScopeFilter::Qualified { repository, scope } => {
                item.repository == *repository && item.scope == *scope
            }
        }
    }

    pub fn apply<'a>(&self, items: &'a [ArtifactRecord]) -> Vec<&'a ArtifactRecord> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

/// Every `repo` and `repo/scope` string present in `items`, sorted.
pub fn autocomplete_scopes(items: &[ArtifactRecord]) -> Vec<String> {
    let mut scopes = BTreeSet::new();
    for item in items {
        scopes.insert(item.repository.clone());
        scopes.insert(format!("{}/{}", item.repository, item.scope));
    }
    scopes.into_iter().collect()
}

/// Whether `scope` is one of the autocomplete values for `items`.
pub fn is_valid_scope(scope: &str, items: &[ArtifactRecord]) -> bool {
    autocomplete_scopes(items).iter().any(|s| s == scope)
}
