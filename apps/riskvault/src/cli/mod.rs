//! # Riskvault CLI Module
//!
//! This module implements the CLI interface for Riskvault.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `status` - Show collections and document counts
//! - `collection create|drop|list` - Manage collections
//! - `upload` - Extract a file and store it as version 0
//! - `attach` - Attach the risk assessment of version 0
//! - `save` - Save a new version if the risk assessment changed
//! - `get` / `latest` / `history` - Read documents
//! - `delete` - Delete one version or a whole document

mod commands;

use crate::config::{AppConfig, BackendKind};
use clap::{Parser, Subcommand};
use riskvault_core::VaultError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Riskvault - versioned document store
///
/// Stores extracted document text as immutable versions and appends a new
/// version whenever its risk assessment changes.
#[derive(Parser, Debug)]
#[command(name = "riskvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file (default: ./riskvault.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the redb database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (persistent) or "memory" (volatile)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<BackendKind>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show collections and document counts
    Status,

    /// Manage collections
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
    },

    /// Extract a file and store it as version 0
    Upload {
        /// Target collection
        #[arg(short = 'n', long)]
        collection: String,

        /// Path to the file (PDF or UTF-8 text)
        #[arg(short, long)]
        file: PathBuf,

        /// Stored file name (default: the file's own name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Attach the risk assessment of version 0
    Attach {
        #[arg(short = 'n', long)]
        collection: String,

        /// Stored file name
        #[arg(short = 'f', long)]
        file_name: String,

        /// Flat JSON object with the 17 score fields, or @path to read it from a file
        #[arg(short, long)]
        risk: String,
    },

    /// Save a new version if the risk assessment changed
    Save {
        #[arg(short = 'n', long)]
        collection: String,

        #[arg(short = 'f', long)]
        file_name: String,

        /// Path to a UTF-8 file holding the version content
        #[arg(long)]
        content_file: PathBuf,

        /// Flat JSON object with the 17 score fields, or @path to read it from a file
        #[arg(short, long)]
        risk: String,

        /// Fail instead of racing when another writer takes the version number
        #[arg(long)]
        exclusive: bool,
    },

    /// Get one version (the lowest when --version-name is omitted)
    Get {
        #[arg(short = 'n', long)]
        collection: String,

        #[arg(short = 'f', long)]
        file_name: String,

        /// Version number
        #[arg(long = "version-name")]
        version: Option<u32>,
    },

    /// Get the latest version
    Latest {
        #[arg(short = 'n', long)]
        collection: String,

        #[arg(short = 'f', long)]
        file_name: String,
    },

    /// List all versions of a file
    History {
        #[arg(short = 'n', long)]
        collection: String,

        #[arg(short = 'f', long)]
        file_name: String,
    },

    /// Delete one version, or every version when --version-name is omitted
    Delete {
        #[arg(short = 'n', long)]
        collection: String,

        #[arg(short = 'f', long)]
        file_name: String,

        /// Version number
        #[arg(long = "version-name")]
        version: Option<u32>,
    },
}

/// Collection subcommands.
#[derive(Subcommand, Debug)]
pub enum CollectionAction {
    /// Create a collection
    Create { name: String },
    /// Drop a collection and all of its documents
    Drop { name: String },
    /// List collections
    List,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file and environment, then global flags.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, VaultError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), VaultError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Collection { action }) => cmd_collection(&config, json_mode, &action),
        Some(Commands::Upload {
            collection,
            file,
            name,
        }) => cmd_upload(&config, json_mode, &collection, &file, name),
        Some(Commands::Attach {
            collection,
            file_name,
            risk,
        }) => cmd_attach(&config, json_mode, &collection, &file_name, &risk),
        Some(Commands::Save {
            collection,
            file_name,
            content_file,
            risk,
            exclusive,
        }) => cmd_save(
            &config,
            json_mode,
            &collection,
            &file_name,
            &content_file,
            &risk,
            exclusive,
        ),
        Some(Commands::Get {
            collection,
            file_name,
            version,
        }) => cmd_get(&config, json_mode, &collection, &file_name, version),
        Some(Commands::Latest {
            collection,
            file_name,
        }) => cmd_latest(&config, json_mode, &collection, &file_name),
        Some(Commands::History {
            collection,
            file_name,
        }) => cmd_history(&config, json_mode, &collection, &file_name),
        Some(Commands::Delete {
            collection,
            file_name,
            version,
        }) => cmd_delete(&config, json_mode, &collection, &file_name, version),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_save_command() {
        let cli = Cli::try_parse_from([
            "riskvault",
            "--backend",
            "memory",
            "save",
            "-n",
            "ns",
            "-f",
            "f1",
            "--content-file",
            "v2.txt",
            "--risk",
            "@risk.json",
        ])
        .expect("parse");

        assert_eq!(cli.backend, Some(BackendKind::Memory));
        assert!(matches!(
            cli.command,
            Some(Commands::Save { ref collection, exclusive: false, .. }) if collection == "ns"
        ));
    }

    #[test]
    fn rejects_unknown_backend() {
        let result = Cli::try_parse_from(["riskvault", "--backend", "mongo", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_collection_subcommand() {
        let cli = Cli::try_parse_from(["riskvault", "collection", "create", "ns"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Collection {
                action: CollectionAction::Create { ref name }
            }) if name == "ns"
        ));
    }

    #[test]
    fn missing_explicit_config_is_error() {
        let cli = Cli::try_parse_from([
            "riskvault",
            "--config",
            "/definitely/missing/riskvault.toml",
            "status",
        ])
        .expect("parse");
        assert!(matches!(resolve_config(&cli), Err(VaultError::Io(_))));
    }
}
