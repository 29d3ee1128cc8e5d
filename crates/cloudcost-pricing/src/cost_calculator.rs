//! Cost calculator module for valuing recommendations
//!
//! This module turns catalog rates into monetary amounts: the cost of keeping
//! an instance running over an analysis period, and the monthly cost of a
//! provisioned volume.
//!
//! # Examples
//!
//! ```
//! use cloudcost_pricing::{CostCalculator, RateCatalog};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! # fn example() -> cloudcost_core::Result<()> {
//! let catalog = Arc::new(RateCatalog::embedded()?);
//! let calculator = CostCalculator::new(catalog);
//!
//! // 720 hours of a t3.medium
//! let monthly = calculator.instance_monthly_cost("t3.medium")?;
//! assert_eq!(monthly, Decimal::new(2995, 2));
//!
//! // 100 GB of gp3 storage
//! let storage = calculator.volume_monthly_cost("gp3", 100)?;
//! assert_eq!(storage, Decimal::new(800, 2));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::rate_catalog::RateCatalog;
use cloudcost_core::error::Result;
use cloudcost_core::money::round_currency;
use cloudcost_core::types::Severity;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Calculates costs from catalog rates
///
/// The calculator holds a shared, immutable catalog so it can be cloned
/// cheaply into concurrent request handlers.
#[derive(Debug, Clone)]
pub struct CostCalculator {
    catalog: Arc<RateCatalog>,
}

impl CostCalculator {
    /// Create a new CostCalculator over a rate catalog
    pub fn new(catalog: Arc<RateCatalog>) -> Self {
        Self { catalog }
    }

    /// The catalog backing this calculator
    pub fn catalog(&self) -> &RateCatalog {
        &self.catalog
    }

    /// Hours in the catalog's analysis month
    pub fn hours_per_month(&self) -> u32 {
        self.catalog.hours_per_month
    }

    /// Multiply a rate by a quantity and round to cents
    ///
    /// This is a pure function; negative inputs are clamped so the result is
    /// never below zero.
    pub fn calculate_from_rate(rate: Decimal, quantity: Decimal) -> Decimal {
        let cost = round_currency(rate * quantity);
        if cost.is_sign_negative() {
            Decimal::ZERO
        } else {
            cost
        }
    }

    /// Cost of running an instance type for `hours`
    ///
    /// # Errors
    ///
    /// Returns [`cloudcost_core::CloudcostError::UnknownRate`] if the type has
    /// no rate and the catalog has no fallback
    pub fn instance_period_cost(&self, instance_type: &str, hours: u32) -> Result<Decimal> {
        let rate = self.catalog.instance_hourly_rate(instance_type)?;
        let cost = Self::calculate_from_rate(rate, Decimal::from(hours));
        debug!("{instance_type}: {rate}/h x {hours}h = {cost}");
        Ok(cost)
    }

    /// Cost of running an instance type for the catalog's analysis month
    pub fn instance_monthly_cost(&self, instance_type: &str) -> Result<Decimal> {
        self.instance_period_cost(instance_type, self.catalog.hours_per_month)
    }

    /// Monthly cost of a provisioned volume
    pub fn volume_monthly_cost(&self, volume_type: &str, size_gb: u32) -> Result<Decimal> {
        let rate = self.catalog.volume_gb_month_rate(volume_type)?;
        let cost = Self::calculate_from_rate(rate, Decimal::from(size_gb));
        debug!("{volume_type}: {rate}/GB-month x {size_gb}GB = {cost}");
        Ok(cost)
    }

    /// Severity of a potential saving under the catalog's policy
    pub fn severity_for(&self, savings: Decimal) -> Severity {
        self.catalog.severity_bands.classify(savings)
    }
}
