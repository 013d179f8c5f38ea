//! Core data models used throughout Code Stash.
//!
//! These types represent the artifacts discovered in a repository, the
//! per-repository cache envelope, and the ranked results returned by search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// The closed set of artifact types a repository can hold.
///
/// Each variant names the fixed directory under a scope that holds it and
/// selects its traversal rule in the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A single file inside a category directory.
    Snippet,
    /// A project skeleton directory.
    Boilerplate,
    /// A reusable module directory.
    Module,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Snippet,
        ArtifactKind::Boilerplate,
        ArtifactKind::Module,
    ];

    /// Name of the directory holding artifacts of this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            ArtifactKind::Snippet => "snippet",
            ArtifactKind::Boilerplate => "boilerplate",
            ArtifactKind::Module => "module",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Optional sidecar metadata describing an artifact.
///
/// All fields are optional. Unknown keys found in the sidecar are kept in
/// `extra` so a cache round-trip does not lose them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtifactMetadata {
    /// Build metadata from an arbitrary JSON object, ignoring fields whose
    /// JSON type does not fit. Returns `None` if `value` is not an object.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };

        let mut take_string = |key: &str| match map.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let description = take_string("description");
        let example = take_string("example");
        let source = take_string("source");

        let tags = match map.remove("tags") {
            Some(Value::Array(values)) => Some(
                values
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        };

        Some(Self {
            description,
            example,
            source,
            tags,
            extra: map,
        })
    }
}

/// One discoverable unit in a repository.
///
/// `file_path` is present exactly when `kind` is [`ArtifactKind::Snippet`];
/// use [`ArtifactRecord::snippet`] and [`ArtifactRecord::folder`] to build
/// records that respect this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub repository: String,
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Artifact directory for folder kinds; the category directory for snippets.
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArtifactMetadata>,
}

impl ArtifactRecord {
    pub fn snippet(
        name: String,
        repository: &str,
        scope: &str,
        category: &str,
        category_dir: PathBuf,
        file_path: PathBuf,
        metadata: Option<ArtifactMetadata>,
    ) -> Self {
        Self {
            name,
            kind: ArtifactKind::Snippet,
            repository: repository.to_string(),
            scope: scope.to_string(),
            category: Some(category.to_string()),
            path: category_dir,
            file_path: Some(file_path),
            metadata,
        }
    }

    /// Build a boilerplate or module record.
    pub fn folder(
        kind: ArtifactKind,
        name: String,
        repository: &str,
        scope: &str,
        path: PathBuf,
        metadata: Option<ArtifactMetadata>,
    ) -> Self {
        debug_assert!(kind != ArtifactKind::Snippet);
        Self {
            name,
            kind,
            repository: repository.to_string(),
            scope: scope.to_string(),
            category: None,
            path,
            file_path: None,
            metadata,
        }
    }

    /// `repo/scope` or `repo/scope/category`, used to disambiguate duplicate names.
    pub fn location(&self) -> String {
        match &self.category {
            Some(category) => format!("{}/{}/{}", self.repository, self.scope, category),
            None => format!("{}/{}", self.repository, self.scope),
        }
    }

    /// The file or directory a user would open for this artifact.
    pub fn target_path(&self) -> &PathBuf {
        self.file_path.as_ref().unwrap_or(&self.path)
    }
}

/// A ranked search hit. Scores only compare within one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub item: ArtifactRecord,
    pub score: f64,
}

/// The persisted per-repository cache envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCollection {
    pub items: Vec<ArtifactRecord>,
    pub timestamp: DateTime<Utc>,
}
