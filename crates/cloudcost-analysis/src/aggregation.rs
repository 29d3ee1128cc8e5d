//! Cost aggregation
//!
//! Sums cost records over a date window and breaks the total down by service
//! and by region. Aggregation is pure: the same records and window always
//! produce the same summary.
//!
//! # Examples
//!
//! ```
//! use cloudcost_analysis::CostAggregator;
//! use cloudcost_core::CostRecord;
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! let jan = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let records = vec![
//!     CostRecord::new("EC2", Decimal::new(85025, 2), "us-east-1", jan(1), jan(31)),
//!     CostRecord::new("S3", Decimal::new(20000, 2), "us-east-1", jan(1), jan(31)),
//! ];
//!
//! let aggregator = CostAggregator::new("USD");
//! let summary = aggregator.summarize(&records, None, None).unwrap();
//! assert_eq!(summary.total_cost, Decimal::new(105025, 2));
//! assert_eq!(summary.by_service[0].service_name, "EC2");
//! ```

use chrono::NaiveDate;
use cloudcost_core::aggregation_types::{
    CostPeriod, CostReport, CostSummary, RegionSummary, ServiceCost, ServiceSummary,
};
use cloudcost_core::error::Result;
use cloudcost_core::filters::{CostFilter, DateWindow};
use cloudcost_core::money::{apportion_percentages, checked_sum, round_currency};
use cloudcost_core::types::CostRecord;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// One row of a breakdown before it is shaped into a summary type
#[derive(Debug)]
struct GroupTotal {
    key: String,
    total_cost: Decimal,
    percentage: Decimal,
}

/// Add `record` to the running total for `key`
fn accumulate<'a>(
    groups: &mut BTreeMap<&'a str, Decimal>,
    key: &'a str,
    record: &CostRecord,
) -> Result<()> {
    let total = groups.entry(key).or_insert(Decimal::ZERO);
    *total = checked_sum([*total, record.cost])?;
    Ok(())
}

/// Group records by `key`, ordered by reported percentage descending and
/// then by key ascending
///
/// Shares are apportioned against the unrounded `total`, so a breakdown with
/// a positive total reports exactly 100%.
fn breakdown<'a, F>(
    records: &[&'a CostRecord],
    total: Decimal,
    key: F,
) -> Result<Vec<GroupTotal>>
where
    F: Fn(&'a CostRecord) -> &'a str,
{
    let mut groups: BTreeMap<&'a str, Decimal> = BTreeMap::new();
    for &record in records {
        accumulate(&mut groups, key(record), record)?;
    }

    let costs: Vec<Decimal> = groups.values().copied().collect();
    let shares = apportion_percentages(&costs, total);
    let mut rows: Vec<GroupTotal> = groups
        .into_iter()
        .zip(shares)
        .map(|((key, cost), percentage)| GroupTotal {
            key: key.to_string(),
            total_cost: round_currency(cost),
            percentage,
        })
        .collect();

    // Keys arrive ascending from the BTreeMap and the sort is stable
    rows.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    Ok(rows)
}

/// Summarizes and lists cost records
#[derive(Debug, Clone)]
pub struct CostAggregator {
    currency: String,
}

impl Default for CostAggregator {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl CostAggregator {
    /// Create an aggregator reporting amounts in `currency`
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Summarize the records overlapping `[start_date, end_date]`
    ///
    /// # Errors
    ///
    /// Returns [`cloudcost_core::CloudcostError::InvalidDateRange`] when the
    /// start is after the end
    pub fn summarize(
        &self,
        records: &[CostRecord],
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<CostSummary> {
        let window = DateWindow::new(start_date, end_date)?;
        self.summarize_window(records, &window)
    }

    /// Summarize the records overlapping an already validated window
    ///
    /// # Errors
    ///
    /// Returns [`cloudcost_core::CloudcostError::InvalidSnapshot`] when the
    /// costs add up past the representable range
    pub fn summarize_window(
        &self,
        records: &[CostRecord],
        window: &DateWindow,
    ) -> Result<CostSummary> {
        let selected: Vec<&CostRecord> = records.iter().filter(|r| window.contains(r)).collect();
        let raw_total = checked_sum(selected.iter().map(|r| r.cost))?;

        let by_service = breakdown(&selected, raw_total, |r| r.service_name.as_str())?
            .into_iter()
            .map(|row| ServiceSummary {
                service_name: row.key,
                total_cost: row.total_cost,
                percentage: row.percentage,
            })
            .collect();

        let by_region = breakdown(&selected, raw_total, |r| r.region.as_str())?
            .into_iter()
            .map(|row| RegionSummary {
                region: row.key,
                total_cost: row.total_cost,
                percentage: row.percentage,
            })
            .collect();

        let period = CostPeriod {
            start_date: window
                .start_date
                .or_else(|| selected.iter().map(|r| r.start_date).min()),
            end_date: window
                .end_date
                .or_else(|| selected.iter().map(|r| r.end_date).max()),
        };

        debug!(
            "Summarized {} of {} cost records, total {}",
            selected.len(),
            records.len(),
            raw_total
        );

        Ok(CostSummary {
            total_cost: round_currency(raw_total),
            period,
            by_service,
            by_region,
        })
    }

    /// List the records passing `filter`, totalled per service
    ///
    /// The breakdown is ordered by cost descending, then service ascending.
    pub fn list_costs(&self, records: &[CostRecord], filter: &CostFilter) -> Result<CostReport> {
        filter.window()?;

        let mut per_service: BTreeMap<&str, Decimal> = BTreeMap::new();
        let mut matched = 0usize;
        for record in records.iter().filter(|r| filter.matches(r)) {
            accumulate(&mut per_service, record.service_name.as_str(), record)?;
            matched += 1;
        }

        let total = checked_sum(per_service.values().copied())?;
        let mut breakdown: Vec<ServiceCost> = per_service
            .into_iter()
            .map(|(service, cost)| ServiceCost {
                service: service.to_string(),
                cost: round_currency(cost),
            })
            .collect();
        breakdown.sort_by(|a, b| b.cost.cmp(&a.cost));

        debug!("Listed {matched} cost records across {} services", breakdown.len());

        Ok(CostReport {
            filters: filter.clone(),
            total_cost: round_currency(total),
            currency: self.currency.clone(),
            breakdown,
        })
    }
}
