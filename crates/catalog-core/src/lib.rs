//! Synchronization engine for the component catalog
//!
//! This crate keeps a component registry in line with the manifests found in
//! configured sources:
//!
//! - **Source adapters**: snapshot a filesystem directory or a git branch
//! - **Discovery**: parse manifests, isolating bad files, caching by checksum
//! - **Reconciliation**: upsert components by key, last write wins
//! - **Scheduling**: one timer per source, overlapping ticks dropped
//! - **Status**: per-source state, timestamps and errors for operators
//!
//! # Architecture
//!
//! ```text
//!                   catalog-cli
//!                        |
//!                  catalog-core
//!                        |
//!        +---------------+---------------+
//!        |               |               |
//!   catalog-fs      catalog-git     catalog-meta
//! ```
//!
//! # Example
//!
//! ```ignore
//! use catalog_core::Catalog;
//! use catalog_meta::load_config;
//!
//! async fn example() -> catalog_core::Result<()> {
//!     let config = load_config("catalog.yaml".as_ref())?;
//!     let catalog = Catalog::open(config)?;
//!     for report in catalog.run_once().await {
//!         println!("{}: {}", report.source_id, report.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod scheduler;
pub mod source;
pub mod status;

pub use catalog::Catalog;
pub use discovery::{DiscoveryReport, ManifestDiscoverer};
pub use engine::{RunReport, SyncEngine};
pub use error::{Error, Result};
pub use reconcile::{ReconcileReport, Reconciler};
pub use registry::{
    Component, ComponentFields, ComponentRegistry, FileRegistry, MemoryRegistry, UpsertOutcome,
};
pub use scheduler::Scheduler;
pub use source::{
    FilesystemAdapter, GitAdapter, Snapshot, SnapshotFile, SourceAdapter, build_adapter,
};
pub use status::{
    Completion, RunTicket, SourceState, SourceStatus, StatusEvent, StatusTracker, load_snapshot,
};
