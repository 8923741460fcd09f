//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Component catalog - keep the registry in sync with component manifests
#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source configuration file (YAML, JSON or TOML)
    #[arg(short, long, global = true, env = "CATALOG_CONFIG", default_value = "catalog.yaml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run every source on its interval until interrupted
    Run,

    /// Run sources once and exit
    ///
    /// Exits non-zero if any source failed.
    ///
    /// Examples:
    ///   catalog sync                 # Every configured source
    ///   catalog sync --source docs   # Just one
    Sync {
        /// Only run this source
        #[arg(short, long)]
        source: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List configured sources
    Sources {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the status of each source as of its last run
    Status {
        /// Only show this source
        #[arg(short, long)]
        source: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List registered components
    Components {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show one registered component
    Component {
        /// Component key
        key: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Check manifest files for problems
    Validate {
        /// Manifest files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
