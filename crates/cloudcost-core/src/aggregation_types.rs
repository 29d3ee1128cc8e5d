//! Aggregation data types for cloudcost
//!
//! Pure data structures produced by the cost aggregator, the recommendation
//! engine and the analysis orchestrator. Field names follow the HTTP
//! response shapes so the same types serve CLI JSON output and the API.

use crate::filters::CostFilter;
use crate::money::{round_currency, sum};
use crate::types::{EbsVolume, Ec2Instance, Recommendation, ResourceType, Severity};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-service share of the total cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub service_name: String,
    pub total_cost: Decimal,
    /// Share of the overall total, one decimal place
    pub percentage: Decimal,
}

/// Per-region share of the total cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub total_cost: Decimal,
    /// Share of the overall total, one decimal place
    pub percentage: Decimal,
}

/// Date range a summary covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Cost summary broken down by service and region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_cost: Decimal,
    pub period: CostPeriod,
    pub by_service: Vec<ServiceSummary>,
    pub by_region: Vec<RegionSummary>,
}

/// Cost of one service within a raw cost listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCost {
    pub service: String,
    pub cost: Decimal,
}

/// Filtered raw cost listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    /// The filters the listing was produced with
    pub filters: CostFilter,
    pub total_cost: Decimal,
    pub currency: String,
    pub breakdown: Vec<ServiceCost>,
}

/// Resource collections after filtering
///
/// A collection is `None` when the listing was narrowed to the other type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCollections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec2_instances: Option<Vec<Ec2Instance>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_volumes: Option<Vec<EbsVolume>>,
}

/// Filtered resource listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceListing {
    pub total_count: usize,
    pub resources: ResourceCollections,
}

/// Counts reported by an inventory scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesFound {
    pub ec2_instances: usize,
    pub ebs_volumes: usize,
}

/// Result of an inventory scan over a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: String,
    pub status: String,
    pub resources_found: ResourcesFound,
    pub regions_scanned: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A running instance whose utilization is below the idle threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleInstanceRecommendation {
    pub instance_id: String,
    pub instance_type: String,
    pub region: String,
    pub cpu_utilization: f64,
    /// Cost of running the instance for the analysis period
    pub potential_savings: Decimal,
    pub recommendation: String,
}

/// Idle instance listing with its total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleInstancesReport {
    pub total_idle_instances: usize,
    pub total_potential_savings: Decimal,
    pub idle_instances: Vec<IdleInstanceRecommendation>,
}

impl IdleInstancesReport {
    /// Wrap a listing and total its savings
    pub fn new(idle_instances: Vec<IdleInstanceRecommendation>) -> Self {
        Self {
            total_idle_instances: idle_instances.len(),
            total_potential_savings: round_currency(sum(
                idle_instances.iter().map(|i| i.potential_savings),
            )),
            idle_instances,
        }
    }
}

/// A volume not attached to any instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRecommendation {
    pub volume_id: String,
    pub size: u32,
    pub volume_type: String,
    pub region: String,
    pub availability_zone: String,
    /// Monthly storage cost saved by deleting the volume
    pub monthly_cost: Decimal,
}

/// Unattached volume listing with its total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnattachedVolumesReport {
    pub total_unattached_volumes: usize,
    pub total_potential_savings: Decimal,
    pub unattached_volumes: Vec<VolumeRecommendation>,
}

impl UnattachedVolumesReport {
    /// Wrap a listing and total its monthly cost
    pub fn new(unattached_volumes: Vec<VolumeRecommendation>) -> Self {
        Self {
            total_unattached_volumes: unattached_volumes.len(),
            total_potential_savings: round_currency(sum(
                unattached_volumes.iter().map(|v| v.monthly_cost),
            )),
            unattached_volumes,
        }
    }
}

/// Filtered set of aggregated recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub total_recommendations: usize,
    pub total_potential_savings: Decimal,
    pub recommendations: Vec<Recommendation>,
}

/// Savings split by recommendation source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsBreakdown {
    pub idle_instances_savings: Decimal,
    pub unattached_volumes_savings: Decimal,
}

/// Recommendation counts, with every severity present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsCount {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
}

/// Potential savings across all current data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub total_potential_savings: Decimal,
    pub breakdown: SavingsBreakdown,
    pub recommendations_count: RecommendationsCount,
    pub last_analysis: DateTime<Utc>,
}

/// Resource counts of an analysis run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_instances: usize,
    pub running_instances: usize,
    pub idle_instances: usize,
    pub unattached_volumes: usize,
    pub cost_records: usize,
}

/// Cost figures over the analysis lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostData {
    pub lookback_days: u32,
    pub period: CostPeriod,
    pub total_cost: Decimal,
    /// `total_cost / lookback_days`
    pub average_daily_cost: Decimal,
    pub by_service: Vec<ServiceSummary>,
    pub by_region: Vec<RegionSummary>,
}

/// Condensed recommendation for the analysis headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRecommendation {
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub potential_savings: Decimal,
    pub severity: Severity,
}

impl From<&Recommendation> for TopRecommendation {
    fn from(rec: &Recommendation) -> Self {
        Self {
            resource_id: rec.resource_id.clone(),
            resource_type: rec.resource_type,
            potential_savings: rec.potential_savings,
            severity: rec.severity,
        }
    }
}

/// Full analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    pub summary: AnalysisSummary,
    pub total_potential_savings: Decimal,
    pub regions_analyzed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_data: Option<CostData>,
    pub top_recommendations: Vec<TopRecommendation>,
}
