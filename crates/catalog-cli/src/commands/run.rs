//! Run command implementation
//!
//! Starts the scheduler and prints status transitions until Ctrl-C.

use std::path::Path;

use catalog_core::{Catalog, StatusEvent};
use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;

use super::load_config;
use crate::error::{CliError, Result};

/// Run the scheduler until interrupted
pub async fn run_scheduler(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    if config.sources.is_empty() {
        return Err(CliError::user(format!(
            "No sources configured in {}",
            config_path.display()
        )));
    }

    let catalog = Catalog::open(config)?;
    let mut events = catalog.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "status output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut scheduler = catalog.scheduler();
    scheduler.start();
    println!(
        "{} Watching {} source(s). Press {} to stop.",
        "=>".blue().bold(),
        catalog.sources().len(),
        "Ctrl-C".cyan()
    );

    tokio::signal::ctrl_c().await?;
    println!("{} Stopping...", "=>".blue().bold());
    scheduler.stop().await;
    printer.abort();
    Ok(())
}

fn print_event(event: &StatusEvent) {
    match event {
        StatusEvent::Started { source_id } => {
            println!("   {} {}", "running".yellow(), source_id.cyan());
        }
        StatusEvent::Completed {
            source_id,
            components_count,
            last_error,
        } => {
            println!(
                "   {} {}: {} component(s)",
                "completed".green(),
                source_id.cyan(),
                components_count
            );
            if let Some(error) = last_error {
                println!("      {} {}", "!".yellow(), error);
            }
        }
        StatusEvent::Failed { source_id, error } => {
            println!("   {} {}: {}", "failed".red(), source_id.cyan(), error);
        }
    }
}
