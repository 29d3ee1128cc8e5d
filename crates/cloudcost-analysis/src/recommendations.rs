//! Recommendation engine
//!
//! Derives idle-instance and unattached-volume recommendations from a
//! snapshot, values them through the [`CostCalculator`], and merges them into
//! a single severity-banded, filterable set.

use chrono::{DateTime, Utc};
use cloudcost_core::aggregation_types::{
    IdleInstanceRecommendation, RecommendationSet, RecommendationsCount, SavingsBreakdown,
    SavingsSummary, VolumeRecommendation,
};
use cloudcost_core::error::{CloudcostError, Result};
use cloudcost_core::money::{round_currency, sum};
use cloudcost_core::types::{
    EbsVolume, Ec2Instance, Recommendation, RecommendationType, ResourceType, Severity,
};
use cloudcost_pricing::CostCalculator;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// CPU utilization percentage below which a running instance is idle
pub const DEFAULT_CPU_THRESHOLD: f64 = 5.0;

/// Advisory text attached to every idle instance
pub const IDLE_INSTANCE_ADVICE: &str = "Consider stopping or downsizing this instance";

/// Reject thresholds outside 0-100, including NaN
pub fn validate_cpu_threshold(cpu_threshold: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&cpu_threshold) {
        return Err(CloudcostError::invalid_parameter(
            "cpu_threshold",
            format!("must be between 0 and 100, got {cpu_threshold}"),
        ));
    }
    Ok(())
}

/// Conjunctive filters over aggregated recommendations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFilter {
    pub severity: Option<Severity>,
    pub recommendation_type: Option<RecommendationType>,
    pub region: Option<String>,
    /// Minimum potential savings (inclusive)
    pub min_savings: Option<Decimal>,
}

impl RecommendationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_recommendation_type(mut self, recommendation_type: RecommendationType) -> Self {
        self.recommendation_type = Some(recommendation_type);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_min_savings(mut self, min_savings: Decimal) -> Self {
        self.min_savings = Some(min_savings);
        self
    }

    /// Reject a negative `min_savings`
    pub fn validate(&self) -> Result<()> {
        match self.min_savings {
            Some(min) if min.is_sign_negative() && !min.is_zero() => {
                Err(CloudcostError::invalid_parameter(
                    "min_savings",
                    format!("must not be negative, got {min}"),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Check if a recommendation passes every supplied filter
    pub fn matches(&self, recommendation: &Recommendation) -> bool {
        self.severity.is_none_or(|s| recommendation.severity == s)
            && self
                .recommendation_type
                .is_none_or(|t| recommendation.recommendation_type == t)
            && self
                .region
                .as_deref()
                .is_none_or(|r| recommendation.region == r)
            && self
                .min_savings
                .is_none_or(|min| recommendation.potential_savings >= min)
    }
}

/// Produces recommendations valued against a rate catalog
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    calculator: CostCalculator,
}

impl RecommendationEngine {
    pub fn new(calculator: CostCalculator) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &CostCalculator {
        &self.calculator
    }

    /// Running instances with utilization strictly below `cpu_threshold`
    ///
    /// Savings are the cost of keeping the instance running for the catalog's
    /// analysis month. Sorted by savings descending, then instance id.
    pub fn recommend_idle(
        &self,
        instances: &[Ec2Instance],
        cpu_threshold: f64,
        region: Option<&str>,
    ) -> Result<Vec<IdleInstanceRecommendation>> {
        validate_cpu_threshold(cpu_threshold)?;

        let mut idle = Vec::new();
        for instance in instances.iter().filter(|i| {
            i.is_running()
                && i.is_below_threshold(cpu_threshold)
                && region.is_none_or(|r| i.region == r)
        }) {
            let potential_savings = self
                .calculator
                .instance_monthly_cost(&instance.instance_type)?;
            idle.push(IdleInstanceRecommendation {
                instance_id: instance.instance_id.clone(),
                instance_type: instance.instance_type.clone(),
                region: instance.region.clone(),
                cpu_utilization: instance.cpu_utilization,
                potential_savings,
                recommendation: IDLE_INSTANCE_ADVICE.to_string(),
            });
        }

        idle.sort_by(|a, b| {
            b.potential_savings
                .cmp(&a.potential_savings)
                .then_with(|| a.instance_id.cmp(&b.instance_id))
        });
        debug!(
            "{} of {} instances idle below {cpu_threshold}% CPU",
            idle.len(),
            instances.len()
        );
        Ok(idle)
    }

    /// Volumes not attached to any instance, optionally at least `min_size` GB
    ///
    /// Sorted by monthly cost descending, then volume id.
    pub fn recommend_unattached_volumes(
        &self,
        volumes: &[EbsVolume],
        min_size: Option<i64>,
        region: Option<&str>,
    ) -> Result<Vec<VolumeRecommendation>> {
        if let Some(min) = min_size.filter(|min| *min <= 0) {
            return Err(CloudcostError::invalid_parameter(
                "min_size",
                format!("must be positive, got {min}"),
            ));
        }

        let mut unattached = Vec::new();
        for volume in volumes.iter().filter(|v| {
            !v.is_attached
                && min_size.is_none_or(|min| i64::from(v.size) >= min)
                && region.is_none_or(|r| v.region == r)
        }) {
            let monthly_cost = self
                .calculator
                .volume_monthly_cost(&volume.volume_type, volume.size)?;
            unattached.push(VolumeRecommendation {
                volume_id: volume.volume_id.clone(),
                size: volume.size,
                volume_type: volume.volume_type.clone(),
                region: volume.region.clone(),
                availability_zone: volume.availability_zone.clone(),
                monthly_cost,
            });
        }

        unattached.sort_by(|a, b| {
            b.monthly_cost
                .cmp(&a.monthly_cost)
                .then_with(|| a.volume_id.cmp(&b.volume_id))
        });
        debug!(
            "{} of {} volumes unattached",
            unattached.len(),
            volumes.len()
        );
        Ok(unattached)
    }

    /// Merge idle and unattached findings into severity-banded recommendations
    ///
    /// The result is ordered by savings descending, then resource id, and is
    /// numbered from 1 in that order.
    pub fn build_recommendations(
        &self,
        idle: &[IdleInstanceRecommendation],
        unattached: &[VolumeRecommendation],
        cpu_threshold: f64,
        as_of: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let from_idle = idle.iter().map(|i| Recommendation {
            id: 0,
            resource_id: i.instance_id.clone(),
            resource_type: ResourceType::Ec2,
            recommendation_type: RecommendationType::IdleInstance,
            description: format!(
                "Instance {} has {}% CPU utilization, below the {}% idle threshold",
                i.instance_id, i.cpu_utilization, cpu_threshold
            ),
            potential_savings: i.potential_savings,
            severity: self.calculator.severity_for(i.potential_savings),
            region: i.region.clone(),
            created_at: as_of,
        });

        let from_volumes = unattached.iter().map(|v| Recommendation {
            id: 0,
            resource_id: v.volume_id.clone(),
            resource_type: ResourceType::Ebs,
            recommendation_type: RecommendationType::UnattachedVolume,
            description: format!("Unattached {}GB {} volume", v.size, v.volume_type),
            potential_savings: v.monthly_cost,
            severity: self.calculator.severity_for(v.monthly_cost),
            region: v.region.clone(),
            created_at: as_of,
        });

        let mut recommendations: Vec<Recommendation> = from_idle.chain(from_volumes).collect();
        recommendations.sort_by(|a, b| {
            b.potential_savings
                .cmp(&a.potential_savings)
                .then_with(|| a.resource_id.cmp(&b.resource_id))
        });
        number(&mut recommendations);
        recommendations
    }

    /// Build, filter and total recommendations
    ///
    /// Ids are renumbered after filtering so they stay contiguous.
    pub fn aggregate(
        &self,
        idle: &[IdleInstanceRecommendation],
        unattached: &[VolumeRecommendation],
        filter: &RecommendationFilter,
        cpu_threshold: f64,
        as_of: DateTime<Utc>,
    ) -> Result<RecommendationSet> {
        filter.validate()?;

        let mut recommendations: Vec<Recommendation> = self
            .build_recommendations(idle, unattached, cpu_threshold, as_of)
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        number(&mut recommendations);

        let total_potential_savings =
            round_currency(sum(recommendations.iter().map(|r| r.potential_savings)));
        debug!(
            "{} recommendations after filtering, {} potential savings",
            recommendations.len(),
            total_potential_savings
        );

        Ok(RecommendationSet {
            total_recommendations: recommendations.len(),
            total_potential_savings,
            recommendations,
        })
    }

    /// Potential savings across every current finding
    pub fn savings_summary(
        &self,
        idle: &[IdleInstanceRecommendation],
        unattached: &[VolumeRecommendation],
        cpu_threshold: f64,
        as_of: DateTime<Utc>,
    ) -> SavingsSummary {
        let recommendations = self.build_recommendations(idle, unattached, cpu_threshold, as_of);

        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for recommendation in &recommendations {
            *by_severity.entry(recommendation.severity).or_insert(0) += 1;
        }

        let idle_instances_savings = round_currency(sum(idle.iter().map(|i| i.potential_savings)));
        let unattached_volumes_savings =
            round_currency(sum(unattached.iter().map(|v| v.monthly_cost)));

        SavingsSummary {
            total_potential_savings: round_currency(
                idle_instances_savings + unattached_volumes_savings,
            ),
            breakdown: SavingsBreakdown {
                idle_instances_savings,
                unattached_volumes_savings,
            },
            recommendations_count: RecommendationsCount {
                total: recommendations.len(),
                by_severity,
            },
            last_analysis: as_of,
        }
    }
}

fn number(recommendations: &mut [Recommendation]) {
    for (index, recommendation) in recommendations.iter_mut().enumerate() {
        recommendation.id = index + 1;
    }
}
