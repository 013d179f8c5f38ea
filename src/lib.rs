//! # Code Stash
//!
//! Index, cache, and fuzzy-search reusable code artifacts kept in local
//! repositories.
//!
//! Each repository follows a fixed layout: first-level directories are
//! scopes (a language or domain), and each scope may hold `snippet`,
//! `boilerplate` and `module` directories. The indexer turns that tree into
//! [`models::ArtifactRecord`]s, the cache stores them per repository until
//! they expire, and search ranks them against a free-text query.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌─────────────┐   ┌──────────────┐
//! │ Repositories │──▶│ Indexer  │──▶│ Cache Store │──▶│ Scope filter │
//! │ (local dirs) │   │ + meta   │   │ JSON / repo │   │ + fuzzy rank │
//! └──────────────┘   └──────────┘   └─────────────┘   └──────────────┘
//!                          ▲               │
//!                          └── refresh ◀───┘  (expired or missing caches)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! stash repo add main ~/snippets     # register a local checkout
//! stash index                        # build caches
//! stash search "debounce" --scope main/js
//! stash scopes                       # list valid scope strings
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration store |
//! | [`models`] | Core data types |
//! | [`error`] | Indexing and cache errors |
//! | [`indexer`] | Repository walker and sidecar metadata loader |
//! | [`cache`] | Per-repository JSON cache |
//! | [`refresh`] | Expiry policy and refresh orchestration |
//! | [`scope`] | Scope filtering and autocomplete |
//! | [`search`] | Fuzzy ranking |
//! | [`repos`] | Repository, scope and cache commands |
//! | [`stats`] | Cache overview |

pub mod cache;
pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod refresh;
pub mod repos;
pub mod scope;
pub mod search;
pub mod stats;
