//! Common test utilities and helpers for cloudcost tests
//!
//! Snapshot fixtures shared by the integration tests, plus helpers to write
//! them to disk so the file loader is exercised end to end.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use cloudcost::{Analyzer, CostCalculator, RateCatalog};
use cloudcost_core::Snapshot;
use cloudcost_core::test_utils::{cost, instance, volume};
use cloudcost_core::types::InstanceState;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

/// Regions used across fixtures
pub const TEST_REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-central-1"];

/// Fixed clock for deterministic ids and lookback windows
pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Analyzer over the embedded rate catalog
pub fn embedded_analyzer() -> Analyzer {
    Analyzer::new(CostCalculator::new(Arc::new(
        RateCatalog::embedded().unwrap(),
    )))
}

/// The three-service January bill
pub fn january_bill() -> Snapshot {
    Snapshot {
        cost_records: vec![
            cost("EC2", "850.25", "us-east-1", "2024-01-01", "2024-01-31"),
            cost("S3", "200.50", "us-west-2", "2024-01-01", "2024-01-31"),
            cost("RDS", "200.00", "us-east-1", "2024-01-01", "2024-01-31"),
        ],
        ..Snapshot::default()
    }
}

/// A small estate with a mix of idle, busy, stopped, attached, and loose resources
pub fn estate() -> Snapshot {
    let mut snapshot = january_bill();
    snapshot.ec2_instances = vec![
        instance("i-web", "t3.medium", InstanceState::Running, "us-east-1", 45.0),
        instance("i-batch", "m5.xlarge", InstanceState::Running, "us-east-1", 2.5),
        instance("i-old", "m5.xlarge", InstanceState::Stopped, "us-east-1", 2.5),
        instance("i-dev", "t3.small", InstanceState::Running, "us-west-2", 0.5),
    ];
    snapshot.ebs_volumes = vec![
        volume("vol-root", 30, "gp3", true, "us-east-1"),
        volume("vol-archive", 500, "st1", false, "us-east-1"),
        volume("vol-scratch", 100, "gp2", false, "us-west-2"),
    ];
    snapshot
}

/// Temporary directory holding snapshot files
pub struct SnapshotDir {
    dir: TempDir,
}

impl SnapshotDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `snapshot` to `name` below the directory, creating parents
    pub fn write(&self, name: &str, snapshot: &Snapshot) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, serde_json::to_string_pretty(snapshot).unwrap()).unwrap();
        path
    }

    /// Write raw text, for malformed-input tests
    pub fn write_raw(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}
