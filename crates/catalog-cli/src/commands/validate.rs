//! Validate command implementation

use std::path::{Path, PathBuf};

use catalog_fs::NormalizedPath;
use catalog_fs::io::read_bytes_limited;
use catalog_meta::manifest::MAX_MANIFEST_SIZE;
use catalog_meta::{Manifest, ManifestError, is_manifest_file, parse_manifest};
use colored::Colorize;

use crate::error::{CliError, Result};

/// Check manifest files and report every problem found
pub fn run_validate(files: &[PathBuf]) -> Result<()> {
    let mut invalid = 0usize;

    for file in files {
        match check(file) {
            Ok(manifest) => {
                println!(
                    "{} {} ({})",
                    "OK".green().bold(),
                    file.display(),
                    manifest.component_key().cyan()
                );
                if !is_manifest_file(&NormalizedPath::new(file)) {
                    println!(
                        "   {} not named manifest.yaml or manifest.yml; sources will skip it",
                        "!".yellow()
                    );
                }
            }
            Err(error) => {
                invalid += 1;
                println!("{} {}", "INVALID".red().bold(), error);
            }
        }
    }

    if invalid > 0 {
        return Err(CliError::user(format!("{invalid} invalid manifest(s)")));
    }
    Ok(())
}

fn check(file: &Path) -> std::result::Result<Manifest, ManifestError> {
    let path = NormalizedPath::new(file);
    let content = read_bytes_limited(&path, MAX_MANIFEST_SIZE as u64)
        .map_err(|e| ManifestError::new(path.clone(), e.to_string()))?;
    parse_manifest(&path, &content)
}
