//! Sources command implementation

use std::path::Path;

use catalog_meta::{SourceConfig, SourceKind};
use colored::Colorize;

use super::load_config;
use crate::error::Result;

/// List configured sources
pub fn run_sources(config_path: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config.sources)?);
        return Ok(());
    }

    println!("{}", "Sources".bold());
    println!();
    if config.sources.is_empty() {
        println!("  {}", "None".dimmed());
        return Ok(());
    }
    for source in &config.sources {
        println!(
            "  {} {} [{}] every {}",
            "+".green(),
            source.id.cyan(),
            source.kind.type_name(),
            source.interval
        );
        println!("      {}", location(source).dimmed());
    }
    Ok(())
}

fn location(source: &SourceConfig) -> String {
    let root = match &source.kind {
        SourceKind::Filesystem { path } => path.to_string(),
        SourceKind::Git { url, branch: Some(branch) } => format!("{url}#{branch}"),
        SourceKind::Git { url, branch: None } => url.clone(),
    };
    match &source.base_path {
        Some(base) => format!("{root} ({base})"),
        None => root,
    }
}
