//! JSON file snapshot provider for cloudcost
//!
//! This crate implements [`cloudcost_core::SnapshotSource`] over snapshot
//! files written by an external collector: a single JSON document, or a
//! directory tree of them that is merged into one snapshot.

pub mod data_loader;

pub use data_loader::{FileSnapshotLoader, default_snapshot_path};
