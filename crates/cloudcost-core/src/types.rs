//! Core domain types for cloudcost
//!
//! This module contains the records an external collector produces (cost line
//! items, compute instances, block-storage volumes), the derived
//! [`Recommendation`] type, and the [`Snapshot`] bundle that every
//! aggregation runs against.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{CloudcostError, Result};

/// A single billed cost line item
///
/// Produced by an external cost collector and treated as immutable.
///
/// # Examples
/// ```
/// use cloudcost_core::types::CostRecord;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let record = CostRecord::new(
///     "EC2",
///     Decimal::new(12050, 2),
///     "us-east-1",
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// );
/// assert_eq!(record.cost.to_string(), "120.50");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// Billed service, e.g. "EC2" or "Amazon Simple Storage Service"
    pub service_name: String,
    /// Cost in catalog currency
    pub cost: Decimal,
    /// Usage type as reported by the billing source
    #[serde(default = "default_usage_type")]
    pub usage_type: String,
    /// First day covered by the record (inclusive)
    pub start_date: NaiveDate,
    /// Last day covered by the record (inclusive)
    pub end_date: NaiveDate,
    /// Region the cost was incurred in
    pub region: String,
    /// When the collector produced the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_usage_type() -> String {
    "standard".to_string()
}

impl CostRecord {
    /// Create a record with the default usage type and no creation timestamp
    pub fn new(
        service_name: impl Into<String>,
        cost: Decimal,
        region: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            cost,
            usage_type: default_usage_type(),
            start_date,
            end_date,
            region: region.into(),
            created_at: None,
        }
    }

    /// Whether `[start_date, end_date]` intersects the given inclusive window
    ///
    /// A missing bound leaves that side of the window open.
    pub fn overlaps(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        if let Some(start) = start {
            if self.end_date < start {
                return false;
            }
        }
        if let Some(end) = end {
            if self.start_date > end {
                return false;
            }
        }
        true
    }
}

/// Lifecycle state of a compute instance
///
/// Unrecognised states are preserved verbatim so that filtering by an exact
/// state string keeps working for provider-specific values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Other(String),
}

impl InstanceState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Other(state) => state,
        }
    }
}

impl From<String> for InstanceState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            _ => Self::Other(value),
        }
    }
}

impl From<InstanceState> for String {
    fn from(value: InstanceState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a block-storage volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VolumeState {
    Creating,
    Available,
    InUse,
    Deleting,
    Deleted,
    Error,
    Other(String),
}

impl VolumeState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "creating",
            Self::Available => "available",
            Self::InUse => "in-use",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Error => "error",
            Self::Other(state) => state,
        }
    }
}

impl From<String> for VolumeState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "creating" => Self::Creating,
            "available" => Self::Available,
            "in-use" => Self::InUse,
            "deleting" => Self::Deleting,
            "deleted" => Self::Deleted,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<VolumeState> for String {
    fn from(value: VolumeState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for VolumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource tag, serialized with the provider's `Key`/`Value` casing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A compute instance observed by a resource scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ec2Instance {
    /// Unique instance identifier
    pub instance_id: String,
    /// Instance type, used as the hourly rate key
    pub instance_type: String,
    pub state: InstanceState,
    pub region: String,
    pub availability_zone: String,
    pub launch_time: DateTime<Utc>,
    /// Average CPU utilization over the observation window, 0-100
    pub cpu_utilization: f64,
    /// Whether utilization was below the idle threshold at evaluation time
    #[serde(default)]
    pub is_idle: bool,
    /// Ordered key/value tags
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Ec2Instance {
    /// Whether the instance is currently running
    pub fn is_running(&self) -> bool {
        self.state == InstanceState::Running
    }

    /// Whether utilization is strictly below `cpu_threshold`
    pub fn is_below_threshold(&self, cpu_threshold: f64) -> bool {
        self.cpu_utilization < cpu_threshold
    }

    /// Value of the first tag with the given key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}

/// A block-storage volume observed by a resource scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EbsVolume {
    /// Unique volume identifier
    pub volume_id: String,
    /// Provisioned size in GB
    pub size: u32,
    /// Volume type, used as the per-GB-month rate key
    pub volume_type: String,
    pub state: VolumeState,
    pub is_attached: bool,
    /// Instance the volume is attached to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    pub region: String,
    pub availability_zone: String,
}

/// Kind of resource a recommendation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Ec2,
    Ebs,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ec2 => write!(f, "EC2"),
            Self::Ebs => write!(f, "EBS"),
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ec2" => Ok(Self::Ec2),
            "ebs" => Ok(Self::Ebs),
            _ => Err(format!("Invalid resource type: {s} (expected ec2 or ebs)")),
        }
    }
}

/// Kind of optimization a recommendation proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    IdleInstance,
    UnattachedVolume,
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdleInstance => write!(f, "IDLE_INSTANCE"),
            Self::UnattachedVolume => write!(f, "UNATTACHED_VOLUME"),
        }
    }
}

impl FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "IDLE_INSTANCE" => Ok(Self::IdleInstance),
            "UNATTACHED_VOLUME" => Ok(Self::UnattachedVolume),
            _ => Err(format!("Invalid recommendation type: {s}")),
        }
    }
}

/// Qualitative urgency of a recommendation
///
/// Variants are declared in ascending order so `Ord` reflects urgency.
///
/// # Examples
/// ```
/// use cloudcost_core::types::Severity;
/// use std::str::FromStr;
///
/// assert_eq!(Severity::from_str("high").unwrap(), Severity::High);
/// assert!(Severity::Critical > Severity::Low);
/// assert_eq!(Severity::Medium.to_string(), "MEDIUM");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Every severity, lowest first
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(format!("Invalid severity: {s}")),
        }
    }
}

/// A derived optimization recommendation
///
/// Computed fresh for each request from a [`Snapshot`]; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position within the result set
    pub id: usize,
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub recommendation_type: RecommendationType,
    pub description: String,
    /// Estimated monthly savings, never negative
    pub potential_savings: Decimal,
    pub severity: Severity,
    pub region: String,
    pub created_at: DateTime<Utc>,
}

/// Read-only bundle of collected records an aggregation runs against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub cost_records: Vec<CostRecord>,
    #[serde(default)]
    pub ec2_instances: Vec<Ec2Instance>,
    #[serde(default)]
    pub ebs_volumes: Vec<EbsVolume>,
}

impl Snapshot {
    /// Append every collection of `other` to this snapshot
    pub fn merge(&mut self, other: Snapshot) {
        self.cost_records.extend(other.cost_records);
        self.ec2_instances.extend(other.ec2_instances);
        self.ebs_volumes.extend(other.ebs_volumes);
    }

    /// Whether the snapshot holds no records at all
    pub fn is_empty(&self) -> bool {
        self.cost_records.is_empty() && self.ec2_instances.is_empty() && self.ebs_volumes.is_empty()
    }

    /// Sorted set of every region referenced by any record
    pub fn regions(&self) -> BTreeSet<String> {
        self.cost_records
            .iter()
            .map(|r| r.region.clone())
            .chain(self.ec2_instances.iter().map(|i| i.region.clone()))
            .chain(self.ebs_volumes.iter().map(|v| v.region.clone()))
            .collect()
    }

    /// Recompute `is_idle` for every instance against `cpu_threshold`
    pub fn refresh_idle_flags(&mut self, cpu_threshold: f64) {
        let mut idle = 0;
        for instance in &mut self.ec2_instances {
            instance.is_idle = instance.is_below_threshold(cpu_threshold);
            idle += usize::from(instance.is_idle);
        }
        debug!(
            "{idle} of {} instances below {cpu_threshold}% CPU",
            self.ec2_instances.len()
        );
    }

    /// Check the data model invariants a collector must uphold
    ///
    /// Rejects duplicate instance or volume ids, zero-sized volumes, CPU
    /// utilization outside 0-100, negative costs and inverted cost periods.
    pub fn validate(&self) -> Result<()> {
        for record in &self.cost_records {
            if record.end_date < record.start_date {
                return Err(CloudcostError::InvalidSnapshot(format!(
                    "cost record for {} in {} ends ({}) before it starts ({})",
                    record.service_name, record.region, record.end_date, record.start_date
                )));
            }
            if record.cost.is_sign_negative() && !record.cost.is_zero() {
                return Err(CloudcostError::InvalidSnapshot(format!(
                    "cost record for {} in {} has negative cost {}",
                    record.service_name, record.region, record.cost
                )));
            }
        }

        let mut seen = HashSet::new();
        for instance in &self.ec2_instances {
            if !seen.insert(instance.instance_id.as_str()) {
                return Err(CloudcostError::InvalidSnapshot(format!(
                    "duplicate instance id {}",
                    instance.instance_id
                )));
            }
            if !(0.0..=100.0).contains(&instance.cpu_utilization) {
                return Err(CloudcostError::InvalidSnapshot(format!(
                    "instance {} has cpu_utilization {} outside 0-100",
                    instance.instance_id, instance.cpu_utilization
                )));
            }
        }

        let mut seen = HashSet::new();
        for volume in &self.ebs_volumes {
            if !seen.insert(volume.volume_id.as_str()) {
                return Err(CloudcostError::InvalidSnapshot(format!(
                    "duplicate volume id {}",
                    volume.volume_id
                )));
            }
            if volume.size == 0 {
                return Err(CloudcostError::InvalidSnapshot(format!(
                    "volume {} has zero size",
                    volume.volume_id
                )));
            }
        }

        Ok(())
    }
}
