//! Shared test utilities for the component-catalog workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`git`]: real git repositories used as remotes by git-source tests
//! - [`source`]: [`SourceTree`] and [`ManifestBuilder`] for source fixtures

pub mod git;
pub mod source;

pub use source::{ManifestBuilder, SourceTree, manifest};
