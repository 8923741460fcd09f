//! Status command implementation
//!
//! Reads the status snapshot written by `catalog run`/`catalog sync`, so it
//! works while another process owns the scheduler.

use std::path::Path;

use catalog_core::{SourceStatus, load_snapshot};
use catalog_meta::CatalogConfig;
use catalog_meta::interval::format_duration;
use colored::Colorize;

use super::{check_source, load_config, paint_state};
use crate::error::Result;

/// Run the status command
pub fn run_status(config_path: &Path, source: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    check_source(&config, source)?;

    let statuses: Vec<SourceStatus> = collect(&config)?
        .into_iter()
        .filter(|s| source.is_none_or(|id| s.source_id == id))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("{}", "Source Status".bold());
    println!();
    for status in &statuses {
        print_status(status);
    }
    Ok(())
}

/// One status per configured source, in configuration order. Sources that
/// never ran show as idle.
fn collect(config: &CatalogConfig) -> Result<Vec<SourceStatus>> {
    let saved = load_snapshot(&config.engine.status_path())?;
    Ok(config
        .sources
        .iter()
        .map(|source| {
            saved
                .iter()
                .find(|s| s.source_id == source.id)
                .cloned()
                .unwrap_or_else(|| SourceStatus::new(&source.id))
        })
        .collect())
}

fn print_status(status: &SourceStatus) {
    println!("  {} ({})", status.source_id.cyan(), paint_state(status.status));

    let last_sync = status
        .last_sync
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!("    {}:  {}", "Last sync".dimmed(), last_sync);
    println!("    {}: {}", "Components".dimmed(), status.components_count);
    if let Some(duration) = status.duration() {
        println!("    {}:   {}", "Duration".dimmed(), format_duration(duration));
    }
    if let Some(revision) = &status.revision {
        println!("    {}:   {}", "Revision".dimmed(), revision);
    }
    if let Some(error) = &status.last_error {
        println!("    {}: {}", "Last error".dimmed(), error.red());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::SourceState;
    use catalog_fs::NormalizedPath;
    use catalog_meta::parse_config;
    use tempfile::TempDir;

    #[test]
    fn unsaved_sources_are_idle() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("catalog.yaml");
        let config = parse_config(
            &config_path,
            "- type: git\n  id: a\n  url: https://example.com/a.git\n  interval: 1m\n",
        )
        .unwrap();

        let statuses = collect(&config).unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, SourceState::Idle);
        assert!(!NormalizedPath::new(temp.path().join(".catalog/status.json")).exists());
    }
}
