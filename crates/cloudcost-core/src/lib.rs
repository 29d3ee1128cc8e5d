//! Core types, traits, and utilities for cloudcost
//!
//! This crate provides the foundational types, error handling,
//! money rounding, and filters used by all other cloudcost crates.

pub mod aggregation_types;
pub mod error;
pub mod filters;
pub mod money;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use error::{CloudcostError, Result};
pub use provider::SnapshotSource;
pub use types::{
    CostRecord, EbsVolume, Ec2Instance, InstanceState, Recommendation, RecommendationType,
    ResourceType, Severity, Snapshot, Tag, VolumeState,
};
