//! Repository walker.
//!
//! Converts one repository's directory tree into a flat list of
//! [`ArtifactRecord`]s. The layout is fixed:
//!
//! ```text
//! <repo>/<scope>/snippet/<category>/<file>       one artifact per file
//! <repo>/<scope>/snippet/<category>/<stem>.meta.json
//! <repo>/<scope>/boilerplate/<name>/             one artifact per directory
//! <repo>/<scope>/boilerplate/<name>/meta.json
//! <repo>/<scope>/module/<name>/                  same as boilerplate
//! ```
//!
//! Hidden scope directories (leading `.`, e.g. `.git`) are skipped. Below
//! the scope level every entry counts, so `.gitignore` is a snippet and
//! `.devcontainer` a boilerplate. Missing type directories are not an error.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::Repository;
use crate::error::{Result, StashError};
use crate::models::{ArtifactKind, ArtifactMetadata, ArtifactRecord};

const FOLDER_META_FILE: &str = "meta.json";
const SIDECAR_SUFFIX: &str = ".meta.json";

/// Outcome of looking for a sidecar metadata file.
#[derive(Debug)]
pub enum MetadataLoad {
    Loaded(ArtifactMetadata),
    Missing,
    Invalid(String),
}

impl MetadataLoad {
    /// Collapse to the value stored on a record. Invalid sidecars become `None`.
    pub fn into_option(self) -> Option<ArtifactMetadata> {
        match self {
            MetadataLoad::Loaded(meta) => Some(meta),
            MetadataLoad::Missing => None,
            MetadataLoad::Invalid(reason) => {
                debug!("ignoring metadata: {}", reason);
                None
            }
        }
    }
}

/// Read and parse a sidecar metadata file.
pub fn load_metadata(path: &Path) -> MetadataLoad {
    if !path.is_file() {
        return MetadataLoad::Missing;
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return MetadataLoad::Invalid(format!("{}: {}", path.display(), e)),
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(value) => match ArtifactMetadata::from_json(value) {
            Some(meta) => MetadataLoad::Loaded(meta),
            None => MetadataLoad::Invalid(format!("{}: not a JSON object", path.display())),
        },
        Err(e) => MetadataLoad::Invalid(format!("{}: {}", path.display(), e)),
    }
}

/// Index a repository's local checkout.
pub fn index_repository(repo: &Repository) -> Result<Vec<ArtifactRecord>> {
    let root = &repo.path;
    if !root.is_dir() {
        return Err(StashError::Path { path: root.clone() });
    }

    let mut items = Vec::new();
    for scope_entry in list_entries(root)? {
        if !scope_entry.file_type().is_dir() || is_hidden(&scope_entry) {
            continue;
        }
        let scope = entry_name(&scope_entry);

        for kind in ArtifactKind::ALL {
            let type_dir = scope_entry.path().join(kind.dir_name());
            if !type_dir.is_dir() {
                continue;
            }
            let found = match kind {
                ArtifactKind::Snippet => index_snippets(&repo.alias, &scope, &type_dir)?,
                ArtifactKind::Boilerplate | ArtifactKind::Module => {
                    index_folders(kind, &repo.alias, &scope, &type_dir)?
                }
            };
            items.extend(found);
        }
    }

    debug!("indexed {} artifacts in {}", items.len(), root.display());
    Ok(items)
}

fn index_folders(
    kind: ArtifactKind,
    alias: &str,
    scope: &str,
    type_dir: &Path,
) -> Result<Vec<ArtifactRecord>> {
    let mut items = Vec::new();
    for entry in list_entries(type_dir)? {
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path().to_path_buf();
        let metadata = load_metadata(&dir.join(FOLDER_META_FILE)).into_option();
        items.push(ArtifactRecord::folder(
            kind,
            entry_name(&entry),
            alias,
            scope,
            dir,
            metadata,
        ));
    }
    Ok(items)
}

fn index_snippets(alias: &str, scope: &str, type_dir: &Path) -> Result<Vec<ArtifactRecord>> {
    let mut items = Vec::new();
    for category_entry in list_entries(type_dir)? {
        if !category_entry.file_type().is_dir() {
            continue;
        }
        let category = entry_name(&category_entry);
        let category_dir = category_entry.path().to_path_buf();

        for file_entry in list_entries(&category_dir)? {
            if !file_entry.file_type().is_file() {
                continue;
            }
            let file_name = entry_name(&file_entry);
            if is_sidecar_file(&file_name) {
                continue;
            }

            let stem = file_stem(&file_name);
            let sidecar = category_dir.join(format!("{}{}", stem, SIDECAR_SUFFIX));
            let metadata = load_metadata(&sidecar).into_option();

            items.push(ArtifactRecord::snippet(
                stem.to_string(),
                alias,
                scope,
                &category,
                category_dir.clone(),
                file_entry.path().to_path_buf(),
                metadata,
            ));
        }
    }
    Ok(items)
}

/// Immediate children of `dir`, sorted by name.
fn list_entries(dir: &Path) -> Result<Vec<DirEntry>> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut entries = Vec::new();
    for entry in walker {
        entries.push(entry.map_err(|e| StashError::index(dir_of(&e, dir), e))?);
    }
    Ok(entries)
}

fn dir_of(err: &walkdir::Error, fallback: &Path) -> PathBuf {
    err.path().unwrap_or(fallback).to_path_buf()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn entry_name(entry: &DirEntry) -> String {
    entry.file_name().to_string_lossy().to_string()
}

/// `<stem>.meta.json`. A plain `meta.json` in a category is an ordinary snippet.
fn is_sidecar_file(file_name: &str) -> bool {
    file_name.ends_with(SIDECAR_SUFFIX)
}

/// File name without its last extension. Names with only a leading dot keep it.
fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}
