//! Rate catalog
//!
//! The catalog is the only source of prices: hourly rates keyed by instance
//! type, per-GB-month rates keyed by volume type, the number of hours in an
//! analysis month, and the severity policy. Nothing in the engine hard-codes
//! a price.

use crate::severity::SeverityPolicy;
use cloudcost_core::error::{CloudcostError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Default catalog compiled into the binary
const EMBEDDED_RATES: &str = include_str!("../embedded/rates.json");

/// Hours in the default 30-day analysis month
pub const DEFAULT_HOURS_PER_MONTH: u32 = 720;

fn default_currency() -> String {
    "USD".to_string()
}

fn default_hours_per_month() -> u32 {
    DEFAULT_HOURS_PER_MONTH
}

/// Prices and policy used to value recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCatalog {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Hours in the analysis period used for instance savings
    #[serde(default = "default_hours_per_month")]
    pub hours_per_month: u32,
    /// Hourly on-demand rate per instance type
    #[serde(default)]
    pub instance_hourly: BTreeMap<String, Decimal>,
    /// Hourly rate for instance types missing from the table
    #[serde(default)]
    pub default_instance_hourly: Option<Decimal>,
    /// Monthly rate per provisioned GB per volume type
    #[serde(default)]
    pub volume_gb_month: BTreeMap<String, Decimal>,
    /// Per-GB-month rate for volume types missing from the table
    #[serde(default)]
    pub default_volume_gb_month: Option<Decimal>,
    /// Savings bands used to grade recommendations
    #[serde(default, alias = "severity_policy")]
    pub severity_bands: SeverityPolicy,
}

impl Default for RateCatalog {
    /// An empty catalog with the default month and severity policy
    fn default() -> Self {
        Self {
            currency: default_currency(),
            hours_per_month: DEFAULT_HOURS_PER_MONTH,
            instance_hourly: BTreeMap::new(),
            default_instance_hourly: None,
            volume_gb_month: BTreeMap::new(),
            default_volume_gb_month: None,
            severity_bands: SeverityPolicy::default(),
        }
    }
}

impl RateCatalog {
    /// Parse the catalog compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_RATES)
    }

    /// Parse and validate a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Set the hourly rate for an instance type
    pub fn with_instance_rate(mut self, instance_type: impl Into<String>, hourly: Decimal) -> Self {
        self.instance_hourly.insert(instance_type.into(), hourly);
        self
    }

    /// Set the per-GB-month rate for a volume type
    pub fn with_volume_rate(mut self, volume_type: impl Into<String>, gb_month: Decimal) -> Self {
        self.volume_gb_month.insert(volume_type.into(), gb_month);
        self
    }

    pub fn with_severity_bands(mut self, policy: SeverityPolicy) -> Self {
        self.severity_bands = policy;
        self
    }

    /// Reject negative rates, an empty month, and a malformed severity policy
    pub fn validate(&self) -> Result<()> {
        if self.hours_per_month == 0 {
            return Err(CloudcostError::Config(
                "hours_per_month must be positive".to_string(),
            ));
        }

        let negative = self
            .instance_hourly
            .iter()
            .chain(self.volume_gb_month.iter())
            .find(|(_, rate)| rate.is_sign_negative() && !rate.is_zero());
        if let Some((name, rate)) = negative {
            return Err(CloudcostError::Config(format!(
                "rate for '{name}' is negative: {rate}"
            )));
        }

        for fallback in [self.default_instance_hourly, self.default_volume_gb_month]
            .into_iter()
            .flatten()
        {
            if fallback.is_sign_negative() && !fallback.is_zero() {
                return Err(CloudcostError::Config(format!(
                    "fallback rate is negative: {fallback}"
                )));
            }
        }

        self.severity_bands.validate()
    }

    /// Hourly rate for an instance type, falling back to the catalog default
    pub fn instance_hourly_rate(&self, instance_type: &str) -> Result<Decimal> {
        if let Some(rate) = self.instance_hourly.get(instance_type) {
            return Ok(*rate);
        }
        match self.default_instance_hourly {
            Some(rate) => {
                debug!("No rate for instance type {instance_type}, using default {rate}");
                Ok(rate)
            }
            None => Err(CloudcostError::UnknownRate {
                kind: "instance hourly",
                name: instance_type.to_string(),
            }),
        }
    }

    /// Per-GB-month rate for a volume type, falling back to the catalog default
    pub fn volume_gb_month_rate(&self, volume_type: &str) -> Result<Decimal> {
        if let Some(rate) = self.volume_gb_month.get(volume_type) {
            return Ok(*rate);
        }
        match self.default_volume_gb_month {
            Some(rate) => {
                debug!("No rate for volume type {volume_type}, using default {rate}");
                Ok(rate)
            }
            None => Err(CloudcostError::UnknownRate {
                kind: "volume per-GB-month",
                name: volume_type.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudcost_core::types::Severity;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = RateCatalog::embedded().unwrap();
        assert_eq!(catalog.currency, "USD");
        assert_eq!(catalog.hours_per_month, 720);
        assert_eq!(catalog.instance_hourly_rate("t3.medium").unwrap(), d("0.0416"));
        assert_eq!(catalog.volume_gb_month_rate("gp3").unwrap(), d("0.08"));
        assert_eq!(catalog.severity_bands, SeverityPolicy::default());
    }

    #[test]
    fn test_fallback_rates() {
        let catalog = RateCatalog::embedded().unwrap();
        assert_eq!(catalog.instance_hourly_rate("x9.unknown").unwrap(), d("0.0694"));
        assert_eq!(catalog.volume_gb_month_rate("mystery").unwrap(), d("0.10"));
    }

    #[test]
    fn test_unknown_rate_without_fallback() {
        let catalog = RateCatalog::default().with_instance_rate("t3.micro", d("0.0104"));
        assert!(catalog.instance_hourly_rate("t3.micro").is_ok());
        assert!(matches!(
            catalog.instance_hourly_rate("t3.nano"),
            Err(CloudcostError::UnknownRate { .. })
        ));
        assert!(catalog.volume_gb_month_rate("gp3").is_err());
    }

    #[test]
    fn test_partial_catalog_uses_defaults() {
        let catalog = RateCatalog::from_json(r#"{"volume_gb_month": {"gp3": 0.09}}"#).unwrap();
        assert_eq!(catalog.hours_per_month, DEFAULT_HOURS_PER_MONTH);
        assert_eq!(catalog.currency, "USD");
        assert_eq!(catalog.volume_gb_month_rate("gp3").unwrap(), d("0.09"));
        assert_eq!(catalog.severity_bands.top, Severity::Critical);
    }

    #[test]
    fn test_severity_bands_key() {
        let catalog = RateCatalog::from_json(
            r#"{"severity_bands": {"bands": [{"upper_bound": 10, "severity": "MEDIUM"}], "top": "HIGH"}}"#,
        )
        .unwrap();
        assert_eq!(catalog.severity_bands.top, Severity::High);
        assert_eq!(catalog.severity_bands.classify(d("9.99")), Severity::Medium);
        assert_eq!(catalog.severity_bands.classify(d("10")), Severity::High);

        let json = serde_json::to_value(&catalog).unwrap();
        assert!(json.get("severity_bands").is_some());
        assert!(json.get("severity_policy").is_none());

        // catalogs written under the older key still load
        let catalog = RateCatalog::from_json(
            r#"{"severity_policy": {"bands": [{"upper_bound": 10, "severity": "MEDIUM"}], "top": "HIGH"}}"#,
        )
        .unwrap();
        assert_eq!(catalog.severity_bands.top, Severity::High);
    }

    #[test]
    fn test_validation() {
        assert!(RateCatalog::from_json(r#"{"hours_per_month": 0}"#).is_err());
        assert!(RateCatalog::from_json(r#"{"instance_hourly": {"t3.micro": -1}}"#).is_err());
        assert!(RateCatalog::from_json(r#"{"default_volume_gb_month": -0.5}"#).is_err());
        assert!(
            RateCatalog::from_json(
                r#"{"severity_bands": {"bands": [{"upper_bound": 10, "severity": "LOW"}, {"upper_bound": 5, "severity": "HIGH"}], "top": "CRITICAL"}}"#
            )
            .is_err()
        );
    }
}
