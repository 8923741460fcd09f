//! Sync command implementation
//!
//! Runs sources once against the persisted registry and reports what each
//! run did.

use std::path::Path;

use catalog_core::{Catalog, RunReport};
use colored::Colorize;

use super::{check_source, load_config};
use crate::error::{CliError, Result};

/// Run the sync command
pub async fn run_sync(config_path: &Path, source: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    check_source(&config, source)?;

    let catalog = Catalog::open(config)?;
    if !json {
        let count = if source.is_some() { 1 } else { catalog.sources().len() };
        println!("{} Syncing {} source(s)...", "=>".blue().bold(), count);
    }

    let reports = match source {
        Some(id) => vec![catalog.run_source(id).await?],
        None => catalog.run_once().await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        return Err(CliError::user(format!("{failed} source(s) failed")));
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    if !report.is_success() {
        println!(
            "   {} {}: {}",
            "FAILED".red().bold(),
            report.source_id.cyan(),
            report.error.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    let marker = if report.failed.is_empty() {
        "OK".green().bold()
    } else {
        "WARN".yellow().bold()
    };
    println!(
        "   {} {}: {} created, {} updated, {} unchanged ({}ms)",
        marker,
        report.source_id.cyan(),
        report.created,
        report.updated,
        report.unchanged,
        report.duration_ms
    );
    for failure in &report.failed {
        println!("      {} {}: {}", "!".yellow(), failure.path, failure.reason);
    }
}
