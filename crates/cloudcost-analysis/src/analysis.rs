//! Analysis orchestration
//!
//! [`Analyzer`] is the single entry point the CLI and the HTTP layer use. It
//! owns the cost aggregator and the recommendation engine, and runs every
//! report against a caller-supplied [`Snapshot`].
//!
//! # Examples
//!
//! ```
//! use cloudcost_analysis::{AnalysisRequest, Analyzer};
//! use cloudcost_core::Snapshot;
//! use cloudcost_pricing::{CostCalculator, RateCatalog};
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! # fn example() -> cloudcost_core::Result<()> {
//! let calculator = CostCalculator::new(Arc::new(RateCatalog::embedded()?));
//! let analyzer = Analyzer::new(calculator);
//!
//! let report = analyzer.analyze(&Snapshot::default(), &AnalysisRequest::default(), Utc::now())?;
//! assert_eq!(report.summary.total_instances, 0);
//! assert!(report.top_recommendations.is_empty());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::aggregation::CostAggregator;
use crate::inventory::{ScanRequest, list_resources, scan_inventory};
use crate::recommendations::{
    DEFAULT_CPU_THRESHOLD, RecommendationEngine, RecommendationFilter, validate_cpu_threshold,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use cloudcost_core::aggregation_types::{
    AnalysisReport, AnalysisSummary, CostData, CostReport, CostSummary, IdleInstancesReport,
    RecommendationSet, ResourceListing, SavingsSummary, ScanReport, TopRecommendation,
    UnattachedVolumesReport,
};
use cloudcost_core::error::{CloudcostError, Result};
use cloudcost_core::filters::{CostFilter, DateWindow, ResourceFilter};
use cloudcost_core::money::{round_currency, sum};
use cloudcost_core::types::Snapshot;
use cloudcost_pricing::CostCalculator;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Number of recommendations in an analysis headline
pub const TOP_RECOMMENDATIONS: usize = 5;

/// Default cost lookback for an analysis
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

fn default_cpu_threshold() -> f64 {
    DEFAULT_CPU_THRESHOLD
}

fn default_include_cost_data() -> bool {
    true
}

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

/// Parameters of a full analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Regions to restrict the analysis to; absent or empty means all
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default = "default_cpu_threshold")]
    pub cpu_threshold: f64,
    #[serde(default = "default_include_cost_data")]
    pub include_cost_data: bool,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            regions: None,
            cpu_threshold: DEFAULT_CPU_THRESHOLD,
            include_cost_data: true,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl AnalysisRequest {
    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cpu_threshold(mut self, cpu_threshold: f64) -> Self {
        self.cpu_threshold = cpu_threshold;
        self
    }

    pub fn with_cost_data(mut self, include_cost_data: bool) -> Self {
        self.include_cost_data = include_cost_data;
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    /// The explicitly requested regions, deduplicated and sorted
    fn requested_regions(&self) -> Option<BTreeSet<String>> {
        self.regions
            .as_ref()
            .filter(|regions| !regions.is_empty())
            .map(|regions| regions.iter().cloned().collect())
    }

    fn validate(&self) -> Result<()> {
        validate_cpu_threshold(self.cpu_threshold)?;
        if self.lookback_days == 0 {
            return Err(CloudcostError::invalid_parameter(
                "lookback_days",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Copy of `snapshot` holding only records in `regions`
fn restrict_to_regions(snapshot: &Snapshot, regions: &BTreeSet<String>) -> Snapshot {
    Snapshot {
        cost_records: snapshot
            .cost_records
            .iter()
            .filter(|r| regions.contains(&r.region))
            .cloned()
            .collect(),
        ec2_instances: snapshot
            .ec2_instances
            .iter()
            .filter(|i| regions.contains(&i.region))
            .cloned()
            .collect(),
        ebs_volumes: snapshot
            .ebs_volumes
            .iter()
            .filter(|v| regions.contains(&v.region))
            .cloned()
            .collect(),
    }
}

/// `lookback_days` calendar days ending on `end`, inclusive
fn lookback_window(end: NaiveDate, lookback_days: u32) -> Result<DateWindow> {
    let start = end
        .checked_sub_days(Days::new(u64::from(lookback_days.saturating_sub(1))))
        .ok_or_else(|| {
            CloudcostError::invalid_parameter(
                "lookback_days",
                format!("{lookback_days} days before {end} is out of range"),
            )
        })?;
    DateWindow::new(Some(start), Some(end))
}

/// Runs every cost and recommendation report over a snapshot
#[derive(Debug, Clone)]
pub struct Analyzer {
    aggregator: CostAggregator,
    engine: RecommendationEngine,
    cpu_threshold: f64,
}

impl Analyzer {
    /// Create an analyzer reporting in the calculator's catalog currency
    pub fn new(calculator: CostCalculator) -> Self {
        let aggregator = CostAggregator::new(calculator.catalog().currency.clone());
        Self {
            aggregator,
            engine: RecommendationEngine::new(calculator),
            cpu_threshold: DEFAULT_CPU_THRESHOLD,
        }
    }

    /// Set the idle threshold used when a report does not supply one
    pub fn with_cpu_threshold(mut self, cpu_threshold: f64) -> Result<Self> {
        validate_cpu_threshold(cpu_threshold)?;
        self.cpu_threshold = cpu_threshold;
        Ok(self)
    }

    pub fn cpu_threshold(&self) -> f64 {
        self.cpu_threshold
    }

    pub fn aggregator(&self) -> &CostAggregator {
        &self.aggregator
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Filtered raw cost listing
    pub fn costs(&self, snapshot: &Snapshot, filter: &CostFilter) -> Result<CostReport> {
        self.aggregator.list_costs(&snapshot.cost_records, filter)
    }

    /// Cost summary over an optional window
    pub fn cost_summary(
        &self,
        snapshot: &Snapshot,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<CostSummary> {
        self.aggregator
            .summarize(&snapshot.cost_records, start_date, end_date)
    }

    /// Instances and volumes passing `filter`
    ///
    /// `is_idle` is recomputed against the analyzer's threshold first, so the
    /// listing agrees with the idle reports whatever the snapshot stored.
    pub fn resources(&self, snapshot: &Snapshot, filter: &ResourceFilter) -> ResourceListing {
        let mut instances = snapshot.ec2_instances.clone();
        for instance in &mut instances {
            instance.is_idle = instance.is_below_threshold(self.cpu_threshold);
        }
        list_resources(&instances, &snapshot.ebs_volumes, filter)
    }

    pub fn scan(
        &self,
        snapshot: &Snapshot,
        request: &ScanRequest,
        as_of: DateTime<Utc>,
    ) -> Result<ScanReport> {
        scan_inventory(snapshot, request, as_of)
    }

    /// Idle instances, using the analyzer's threshold when none is given
    pub fn idle_instances(
        &self,
        snapshot: &Snapshot,
        cpu_threshold: Option<f64>,
        region: Option<&str>,
    ) -> Result<IdleInstancesReport> {
        let threshold = cpu_threshold.unwrap_or(self.cpu_threshold);
        let idle = self
            .engine
            .recommend_idle(&snapshot.ec2_instances, threshold, region)?;
        Ok(IdleInstancesReport::new(idle))
    }

    pub fn unattached_volumes(
        &self,
        snapshot: &Snapshot,
        min_size: Option<i64>,
        region: Option<&str>,
    ) -> Result<UnattachedVolumesReport> {
        let unattached =
            self.engine
                .recommend_unattached_volumes(&snapshot.ebs_volumes, min_size, region)?;
        Ok(UnattachedVolumesReport::new(unattached))
    }

    /// Aggregated recommendations at the analyzer's threshold
    pub fn recommendations(
        &self,
        snapshot: &Snapshot,
        filter: &RecommendationFilter,
        as_of: DateTime<Utc>,
    ) -> Result<RecommendationSet> {
        filter.validate()?;
        let idle = self
            .engine
            .recommend_idle(&snapshot.ec2_instances, self.cpu_threshold, None)?;
        let unattached = self
            .engine
            .recommend_unattached_volumes(&snapshot.ebs_volumes, None, None)?;
        self.engine
            .aggregate(&idle, &unattached, filter, self.cpu_threshold, as_of)
    }

    /// Savings across every current finding
    pub fn savings(&self, snapshot: &Snapshot, as_of: DateTime<Utc>) -> Result<SavingsSummary> {
        let idle = self
            .engine
            .recommend_idle(&snapshot.ec2_instances, self.cpu_threshold, None)?;
        let unattached = self
            .engine
            .recommend_unattached_volumes(&snapshot.ebs_volumes, None, None)?;
        Ok(self
            .engine
            .savings_summary(&idle, &unattached, self.cpu_threshold, as_of))
    }

    /// Full analysis of a snapshot, optionally restricted to some regions
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for an out-of-range threshold or zero lookback
    /// - `NoRegionsMatched` when regions were requested and no record is in any of them
    /// - `UnknownRate` when a resource type has no configured rate
    pub fn analyze(
        &self,
        snapshot: &Snapshot,
        request: &AnalysisRequest,
        as_of: DateTime<Utc>,
    ) -> Result<AnalysisReport> {
        request.validate()?;

        let requested = request.requested_regions();
        let scoped = match &requested {
            Some(regions) => restrict_to_regions(snapshot, regions),
            None => snapshot.clone(),
        };
        if let Some(regions) = &requested {
            if scoped.is_empty() {
                return Err(CloudcostError::NoRegionsMatched(
                    regions.iter().cloned().collect(),
                ));
            }
        }
        let regions_analyzed: Vec<String> = requested
            .unwrap_or_else(|| snapshot.regions())
            .into_iter()
            .collect();

        let idle =
            self.engine
                .recommend_idle(&scoped.ec2_instances, request.cpu_threshold, None)?;
        let unattached = self
            .engine
            .recommend_unattached_volumes(&scoped.ebs_volumes, None, None)?;
        let recommendations =
            self.engine
                .build_recommendations(&idle, &unattached, request.cpu_threshold, as_of);

        let summary = AnalysisSummary {
            total_instances: scoped.ec2_instances.len(),
            running_instances: scoped.ec2_instances.iter().filter(|i| i.is_running()).count(),
            idle_instances: idle.len(),
            unattached_volumes: unattached.len(),
            cost_records: scoped.cost_records.len(),
        };

        let cost_data = if request.include_cost_data {
            Some(self.cost_data(&scoped, request.lookback_days, as_of)?)
        } else {
            None
        };

        let total_potential_savings =
            round_currency(sum(recommendations.iter().map(|r| r.potential_savings)));
        let top_recommendations: Vec<TopRecommendation> = recommendations
            .iter()
            .take(TOP_RECOMMENDATIONS)
            .map(TopRecommendation::from)
            .collect();

        info!(
            "Analyzed {} regions: {} instances ({} idle), {} unattached volumes, {} potential savings",
            regions_analyzed.len(),
            summary.total_instances,
            summary.idle_instances,
            summary.unattached_volumes,
            total_potential_savings
        );

        Ok(AnalysisReport {
            analysis_id: format!("analysis_{}", as_of.format("%Y%m%d_%H%M%S")),
            timestamp: as_of,
            summary,
            total_potential_savings,
            regions_analyzed,
            cost_data,
            top_recommendations,
        })
    }

    fn cost_data(
        &self,
        snapshot: &Snapshot,
        lookback_days: u32,
        as_of: DateTime<Utc>,
    ) -> Result<CostData> {
        let window = lookback_window(as_of.date_naive(), lookback_days)?;
        let summary = self
            .aggregator
            .summarize_window(&snapshot.cost_records, &window)?;
        let average_daily_cost =
            round_currency(summary.total_cost / Decimal::from(lookback_days));
        debug!(
            "Lookback {} to {:?}: total {}, daily average {}",
            lookback_days, window, summary.total_cost, average_daily_cost
        );

        Ok(CostData {
            lookback_days,
            period: summary.period,
            total_cost: summary.total_cost,
            average_daily_cost,
            by_service: summary.by_service,
            by_region: summary.by_region,
        })
    }
}
