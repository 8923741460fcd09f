//! Command implementations for catalog-cli

pub mod components;
pub mod run;
pub mod sources;
pub mod status;
pub mod sync;
pub mod validate;

pub use components::{run_component, run_components};
pub use run::run_scheduler;
pub use sources::run_sources;
pub use status::run_status;
pub use sync::run_sync;
pub use validate::run_validate;

use std::path::Path;

use catalog_core::SourceState;
use catalog_meta::CatalogConfig;
use colored::{ColoredString, Colorize};

use crate::error::{CliError, Result};

/// Load the configuration, pointing at `--config` when it is missing.
pub(crate) fn load_config(path: &Path) -> Result<CatalogConfig> {
    if !path.is_file() {
        return Err(CliError::user(format!(
            "No configuration at {} (use --config or CATALOG_CONFIG)",
            path.display()
        )));
    }
    Ok(catalog_meta::load_config(path)?)
}

/// Reject `--source` values that are not configured.
pub(crate) fn check_source(config: &CatalogConfig, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) if config.source(id).is_none() => {
            Err(CliError::user(format!("Unknown source: {id}")))
        }
        _ => Ok(()),
    }
}

pub(crate) fn paint_state(state: SourceState) -> ColoredString {
    let label = state.to_string();
    match state {
        SourceState::Idle => label.dimmed(),
        SourceState::Running => label.yellow(),
        SourceState::Completed => label.green(),
        SourceState::Failed => label.red(),
    }
}
