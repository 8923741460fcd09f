//! Component listing commands
//!
//! Read `registry.json` directly; nothing here opens the registry for
//! writing.

use std::path::Path;

use catalog_core::{Component, FileRegistry};
use colored::Colorize;

use super::load_config;
use crate::error::{CliError, Result};

fn read_components(config_path: &Path) -> Result<Vec<Component>> {
    let config = load_config(config_path)?;
    Ok(FileRegistry::read(&config.engine.registry_path())?)
}

/// List every registered component
pub fn run_components(config_path: &Path, json: bool) -> Result<()> {
    let components = read_components(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    println!("{}", "Components".bold());
    println!();
    if components.is_empty() {
        println!("  {} (run {} first)", "None".dimmed(), "catalog sync".cyan());
        return Ok(());
    }
    for component in &components {
        let team = component
            .team
            .as_deref()
            .map(|t| format!(" [{t}]"))
            .unwrap_or_default();
        println!(
            "  {} {} {}{}",
            "+".green(),
            component.key.cyan(),
            component.name,
            team.dimmed()
        );
    }
    println!();
    println!("{} component(s)", components.len());
    Ok(())
}

/// Show a single component
pub fn run_component(config_path: &Path, key: &str, json: bool) -> Result<()> {
    let component = read_components(config_path)?
        .into_iter()
        .find(|c| c.key == key)
        .ok_or_else(|| CliError::user(format!("Component not found: {key}")))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&component)?);
        return Ok(());
    }

    println!("{}", component.key.cyan().bold());
    println!();
    println!("{}:        {}", "Name".dimmed(), component.name);
    if let Some(description) = &component.description {
        println!("{}: {}", "Description".dimmed(), description);
    }
    if let Some(team) = &component.team {
        println!("{}:        {}", "Team".dimmed(), team);
    }
    if !component.maintainers.is_empty() {
        println!("{}: {}", "Maintainers".dimmed(), component.maintainers.join(", "));
    }
    println!("{}:      {}", "Source".dimmed(), component.last_source);
    println!("{}:     {}", "Created".dimmed(), component.created_at.to_rfc3339());
    println!("{}:     {}", "Updated".dimmed(), component.updated_at.to_rfc3339());
    Ok(())
}
