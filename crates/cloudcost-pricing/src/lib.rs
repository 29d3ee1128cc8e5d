//! Rate catalog and cost calculator for cloudcost
//!
//! This crate holds the externally configured pricing inputs (hourly
//! instance rates, per-GB-month volume rates, severity bands), loads them
//! from the embedded default, a file or a URL, and turns them into costs.

pub mod cost_calculator;
pub mod rate_catalog;
pub mod rate_loader;
pub mod severity;

pub use cost_calculator::CostCalculator;
pub use rate_catalog::RateCatalog;
pub use rate_loader::{RateLoader, RateSource};
pub use severity::{SeverityBand, SeverityPolicy};
