//! stash CLI
//!
//! Command-line interface for stash - bookmarks kept in Firestore.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use stash_core::{
    BookmarkStore, Config, FirestoreClient, FirestoreSettings, HtmlMetadataFetcher,
    MetadataFetcher, RemoteMetadataFetcher, StaticAuth, View,
};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "stash")]
#[command(about = "stash - Bookmarks kept in Firestore")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use an alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookmarks
    #[command(alias = "ls")]
    List {
        /// Show archived bookmarks
        #[arg(long, conflicts_with = "important")]
        archived: bool,
        /// Show important bookmarks
        #[arg(long)]
        important: bool,
    },
    /// Save a new bookmark
    #[command(alias = "create")]
    Add {
        /// URL to save
        url: String,
    },
    /// Archive a bookmark
    Archive {
        /// Bookmark ID (full ID or prefix)
        id: String,
    },
    /// Move an archived bookmark back to the active list
    Unarchive {
        /// Bookmark ID (full ID or prefix)
        id: String,
    },
    /// Mark a bookmark as important
    Pin {
        /// Bookmark ID (full ID or prefix)
        id: String,
    },
    /// Remove the important mark from a bookmark
    Unpin {
        /// Bookmark ID (full ID or prefix)
        id: String,
    },
    /// Re-fetch title, description and image for a bookmark
    Refresh {
        /// Bookmark ID (full ID or prefix)
        id: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (project_id, api_key, collection, user_id, ...)
        key: String,
        /// Configuration value ("none" clears optional keys)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands never touch the database
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let store = open_store(&config)?;

    match cli.command {
        Commands::List {
            archived,
            important,
        } => {
            let view = if archived {
                View::Archived
            } else if important {
                View::Important
            } else {
                View::Active
            };
            commands::bookmark::list(&store, view, &output).await
        }
        Commands::Add { url } => commands::bookmark::add(&store, url, &output).await,
        Commands::Archive { id } => {
            commands::bookmark::set_archived(&store, id, true, &output).await
        }
        Commands::Unarchive { id } => {
            commands::bookmark::set_archived(&store, id, false, &output).await
        }
        Commands::Pin { id } => commands::bookmark::set_important(&store, id, true, &output).await,
        Commands::Unpin { id } => {
            commands::bookmark::set_important(&store, id, false, &output).await
        }
        Commands::Refresh { id } => commands::bookmark::refresh(&store, id, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Wire the store to Firestore, the configured user and a metadata fetcher
fn open_store(config: &Config) -> Result<BookmarkStore> {
    let settings =
        FirestoreSettings::from_config(config).context("Firestore is not configured")?;
    debug!(base = %settings.documents_url(), "Using Firestore");
    let database = Arc::new(FirestoreClient::new(settings));

    let auth = Arc::new(StaticAuth::from_config(config));

    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let metadata: Arc<dyn MetadataFetcher> = match config.metadata_endpoint.as_deref() {
        Some(endpoint) => Arc::new(
            RemoteMetadataFetcher::new(endpoint, timeout)
                .context("Invalid metadata endpoint")?,
        ),
        None => Arc::new(
            HtmlMetadataFetcher::with_timeout(timeout)
                .context("Failed to build metadata client")?,
        ),
    };

    Ok(BookmarkStore::new(database, auth, metadata).with_collection(config.collection.clone()))
}

/// Initialize logging
///
/// `RUST_LOG` wins when set; otherwise the level comes from the `-v` count.
/// Logs go to `config.log_file` when configured, stderr otherwise or when
/// the file cannot be created.
fn init_logging(config: &Config, verbose: u8) {
    let env_filter = log_filter(verbose);

    if let Some(log_path) = &config.log_file {
        match File::create(log_path) {
            Ok(log_file) => {
                // Ignore the error if a subscriber is already installed
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(log_file)
                    .try_init();

                info!("Logging to {:?}", log_path);
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn log_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stash_core={},stash_cli={}", level, level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_flags() {
        let cli = Cli::try_parse_from(["stash", "ls", "--archived"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                archived: true,
                important: false
            }
        ));

        assert!(Cli::try_parse_from(["stash", "list", "--archived", "--important"]).is_err());
    }

    #[test]
    fn test_parse_global_flags() {
        let cli =
            Cli::try_parse_from(["stash", "-vv", "--json", "add", "https://example.com"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Add { ref url } if url == "https://example.com"));
    }

    #[test]
    fn test_unwritable_log_file_falls_back_to_stderr() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            log_file: Some(temp_dir.path().join("missing").join("stash.log")),
            ..Config::default()
        };

        init_logging(&config, 1);

        assert!(!temp_dir.path().join("missing").exists());
        assert!(tracing::dispatcher::has_been_set());
    }

    #[test]
    fn test_open_store_requires_project() {
        let config = Config::default();
        assert!(open_store(&config).is_err());
    }
}
