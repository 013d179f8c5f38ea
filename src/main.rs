//! # Code Stash CLI (`stash`)
//!
//! The `stash` binary registers local artifact repositories, keeps their
//! indexes cached, and searches across them.
//!
//! ## Usage
//!
//! ```bash
//! stash --config ./config/stash.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stash repo add <alias> <path>` | Register a local repository |
//! | `stash repo remove <alias>` | Unregister a repository and drop its cache |
//! | `stash repo list` | Show repositories and their cache status |
//! | `stash index [alias]` | Re-index expired repositories (`--force` for all) |
//! | `stash search "<query>"` | Fuzzy search artifacts |
//! | `stash scopes` | List valid scope strings |
//! | `stash stats` | Per-repository cache summary |
//! | `stash cache clear [alias]` | Delete cached indexes |
//! | `stash config set-scope <scope>` | Set the default search scope |
//! | `stash completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Register a checkout and build its cache
//! stash repo add main ~/src/snippets
//! stash index
//!
//! # Search only JavaScript artifacts in `main`
//! stash search "debounce" --scope main/js
//!
//! # Search every repository, ignoring the default scope
//! stash search "docker" --all --limit 5
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use code_stash::cache::CacheStore;
use code_stash::config;
use code_stash::refresh;
use code_stash::repos;
use code_stash::search::{self, SearchArgs};
use code_stash::stats;

/// Code Stash CLI — index, cache and fuzzy-search reusable code artifacts
/// across local repositories.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file that holds the repository list and cache settings.
#[derive(Parser)]
#[command(
    name = "stash",
    about = "Code Stash — fuzzy search for snippets, boilerplates and modules",
    version,
    long_about = "Code Stash indexes local repositories laid out as \
    <scope>/{snippet,boilerplate,module}/..., caches each repository's index, \
    and ranks artifacts against a free-text query with optional scope filtering."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/stash.toml`. Repositories, the cache location,
    /// the cache expiry and search defaults are read from this file.
    #[arg(long, global = true, default_value = "./config/stash.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Manage registered repositories.
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },

    /// Re-index repositories whose cache has expired.
    ///
    /// Without an alias every repository is checked; with `--force` every
    /// selected repository is re-indexed regardless of cache age.
    Index {
        /// Only this repository.
        alias: Option<String>,

        /// Re-index even if the cache is still fresh.
        #[arg(long)]
        force: bool,
    },

    /// Search artifacts.
    ///
    /// Stale caches are refreshed first. An empty query lists every
    /// artifact in scope.
    Search {
        /// The search query string.
        query: String,

        /// `repo`, `scope`, or `repo/scope`. Defaults to `search.default_scope`.
        #[arg(long)]
        scope: Option<String>,

        /// Ignore the configured default scope.
        #[arg(long, conflicts_with = "scope")]
        all: bool,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every valid scope string from cached indexes.
    Scopes,

    /// Show per-repository cache statistics.
    Stats,

    /// Manage cached indexes.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Edit configuration defaults.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print shell completions for `stash`.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Repository subcommands.
#[derive(Subcommand)]
enum RepoAction {
    /// Register a repository checkout that already exists on disk.
    Add {
        /// Unique alias (no `/`).
        alias: String,
        /// Local path of the checkout.
        path: PathBuf,
        /// Remote URL, for reference.
        #[arg(long)]
        url: Option<String>,
    },
    /// Unregister a repository and clear its cache.
    Remove { alias: String },
    /// List repositories.
    List,
}

/// Cache subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Delete one repository's cache, or all of them.
    Clear { alias: Option<String> },
}

/// Config subcommands.
#[derive(Subcommand)]
enum ConfigAction {
    /// Set the default search scope.
    SetScope { scope: String },
    /// Clear the default search scope.
    UnsetScope,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Commands that don't require an existing config
    match &cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "stash", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Repo {
            action: RepoAction::Add { alias, path, url },
        } => {
            repos::run_repo_add(&cli.config, alias, path, url.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Repo { action } => match action {
            RepoAction::Remove { alias } => {
                repos::run_repo_remove(&cli.config, &mut cfg, &alias)?;
            }
            RepoAction::List => {
                repos::run_repo_list(&cfg);
            }
            RepoAction::Add { .. } => {
                // Handled above (before config loading)
                unreachable!()
            }
        },
        Commands::Index { alias, force } => {
            refresh::run_index(&cli.config, &mut cfg, alias.as_deref(), force).await?;
        }
        Commands::Search {
            query,
            scope,
            all,
            limit,
            json,
        } => {
            let args = SearchArgs {
                scope,
                all,
                limit,
                json,
            };
            search::run_search(&cli.config, &mut cfg, &query, args).await?;
        }
        Commands::Scopes => {
            repos::run_scopes(&cfg);
        }
        Commands::Stats => {
            let cache = CacheStore::new(cfg.storage.cache_dir());
            stats::run_stats(&cfg, &cache);
        }
        Commands::Cache { action } => match action {
            CacheAction::Clear { alias } => {
                repos::run_cache_clear(&cfg, alias.as_deref())?;
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::SetScope { scope } => {
                repos::run_set_scope(&cli.config, &mut cfg, &scope)?;
            }
            ConfigAction::UnsetScope => {
                repos::run_unset_scope(&cli.config, &mut cfg)?;
            }
        },
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
