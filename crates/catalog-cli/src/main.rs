//! Component catalog CLI
//!
//! Runs the source synchronization engine and reads back what it recorded.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        println!("{} Component catalog CLI", "catalog".green().bold());
        println!();
        println!("Run {} for available commands.", "catalog --help".cyan());
        return Ok(());
    };

    let config = cli.config.as_path();
    match command {
        Commands::Run => block_on(commands::run_scheduler(config)),
        Commands::Sync { source, json } => block_on(commands::run_sync(config, source.as_deref(), json)),
        Commands::Sources { json } => commands::run_sources(config, json),
        Commands::Status { source, json } => commands::run_status(config, source.as_deref(), json),
        Commands::Components { json } => commands::run_components(config, json),
        Commands::Component { key, json } => commands::run_component(config, &key, json),
        Commands::Validate { files } => commands::run_validate(&files),
    }
}

/// Log to stderr. `RUST_LOG` wins over the defaults.
fn init_tracing(verbose: bool) {
    let default = if verbose { "catalog=debug" } else { "catalog=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}
