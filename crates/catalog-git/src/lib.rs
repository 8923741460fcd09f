//! Git working-copy management for the component catalog
//!
//! A git source is observed through a local working copy that is cloned on
//! first use and fetched + force-checked-out on every later run. Only the
//! tip of the configured branch matters; no history is inspected.

pub mod error;
mod helpers;
pub mod naming;
pub mod working_copy;

pub use error::{Error, Result};
pub use naming::checkout_dir_name;
pub use working_copy::{Checkout, CommitInfo, WorkingCopy};
