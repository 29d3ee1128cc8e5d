//! Severity banding policy
//!
//! Maps a potential monthly saving to a [`Severity`] through an ordered table
//! of upper bounds. A value belongs to the first band whose bound is strictly
//! greater than it; values at or above the last bound get the `top` severity.
//! Bands are therefore contiguous and exhaustive over non-negative amounts.
//!
//! # Examples
//!
//! ```
//! use cloudcost_pricing::SeverityPolicy;
//! use cloudcost_core::Severity;
//! use rust_decimal::Decimal;
//!
//! let policy = SeverityPolicy::default();
//! assert_eq!(policy.classify(Decimal::new(2499, 2)), Severity::Low);
//! assert_eq!(policy.classify(Decimal::new(25, 0)), Severity::Medium);
//! assert_eq!(policy.classify(Decimal::new(150, 0)), Severity::Critical);
//! ```

use cloudcost_core::error::{CloudcostError, Result};
use cloudcost_core::types::Severity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One band of the policy: amounts below `upper_bound` map to `severity`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityBand {
    pub upper_bound: Decimal,
    pub severity: Severity,
}

/// Ordered severity bands plus the severity for everything above them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    pub bands: Vec<SeverityBand>,
    pub top: Severity,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            bands: vec![
                SeverityBand {
                    upper_bound: Decimal::new(25, 0),
                    severity: Severity::Low,
                },
                SeverityBand {
                    upper_bound: Decimal::new(75, 0),
                    severity: Severity::Medium,
                },
                SeverityBand {
                    upper_bound: Decimal::new(150, 0),
                    severity: Severity::High,
                },
            ],
            top: Severity::Critical,
        }
    }
}

impl SeverityPolicy {
    /// Create a validated policy
    pub fn new(bands: Vec<SeverityBand>, top: Severity) -> Result<Self> {
        let policy = Self { bands, top };
        policy.validate()?;
        Ok(policy)
    }

    /// Check that bounds are positive and strictly increasing
    pub fn validate(&self) -> Result<()> {
        let mut previous = Decimal::ZERO;
        for band in &self.bands {
            if band.upper_bound <= previous {
                return Err(CloudcostError::Config(format!(
                    "severity band bounds must be positive and strictly increasing, got {} after {}",
                    band.upper_bound, previous
                )));
            }
            previous = band.upper_bound;
        }
        Ok(())
    }

    /// Severity for a potential saving
    pub fn classify(&self, savings: Decimal) -> Severity {
        self.bands
            .iter()
            .find(|band| savings < band.upper_bound)
            .map(|band| band.severity)
            .unwrap_or(self.top)
    }
}
