//! Filtering module for cost records and resources
//!
//! This module provides the date window and attribute filters shared by the
//! CLI and the HTTP layer. All filters are optional and conjunctive.
//!
//! # Examples
//!
//! ```
//! use cloudcost_core::filters::{CostFilter, ResourceFilter};
//! use cloudcost_core::types::ResourceType;
//! use chrono::NaiveDate;
//!
//! // Costs for January 2024 in us-east-1
//! let filter = CostFilter::new()
//!     .with_start_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
//!     .with_end_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
//!     .with_region("us-east-1");
//! assert!(filter.window().is_ok());
//!
//! // Only idle EC2 instances
//! let filter = ResourceFilter::new()
//!     .with_resource_type(ResourceType::Ec2)
//!     .with_idle(true);
//! assert!(!filter.includes(ResourceType::Ebs));
//! ```

use crate::error::{CloudcostError, Result};
use crate::types::{CostRecord, EbsVolume, Ec2Instance, ResourceType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parse a `YYYY-MM-DD` parameter, naming it in the error
pub fn parse_date(parameter: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CloudcostError::InvalidDate {
        parameter: parameter.to_string(),
        value: value.to_string(),
    })
}

/// Parse an optional `YYYY-MM-DD` parameter
pub fn parse_optional_date(parameter: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_date(parameter, v)).transpose()
}

/// Inclusive date window with optional bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateWindow {
    /// Create a window, rejecting a start after the end
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(CloudcostError::InvalidDateRange { start, end });
            }
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// A window with no bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether the record's period overlaps the window
    pub fn contains(&self, record: &CostRecord) -> bool {
        record.overlaps(self.start_date, self.end_date)
    }
}

/// Filter configuration for cost records
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostFilter {
    /// Window start (inclusive)
    pub start_date: Option<NaiveDate>,
    /// Window end (inclusive)
    pub end_date: Option<NaiveDate>,
    /// Exact region match
    pub region: Option<String>,
    /// Case-insensitive service name match
    pub service_name: Option<String>,
}

impl CostFilter {
    /// Create a new filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// The validated date window of this filter
    pub fn window(&self) -> Result<DateWindow> {
        DateWindow::new(self.start_date, self.end_date)
    }

    /// Check if a record passes the filter
    ///
    /// The date window is not validated here; call [`CostFilter::window`] first.
    pub fn matches(&self, record: &CostRecord) -> bool {
        if !record.overlaps(self.start_date, self.end_date) {
            return false;
        }

        if let Some(region) = &self.region {
            if &record.region != region {
                return false;
            }
        }

        if let Some(service) = &self.service_name {
            if !record.service_name.eq_ignore_ascii_case(service) {
                return false;
            }
        }

        true
    }
}

/// Filter configuration for resource listings
///
/// `is_idle` applies to instances only and `is_attached` to volumes only;
/// each is ignored for the other collection.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFilter {
    /// Restrict the listing to one collection
    pub resource_type: Option<ResourceType>,
    /// Exact region match
    pub region: Option<String>,
    /// Exact match against the resource's state string
    pub state: Option<String>,
    pub is_idle: Option<bool>,
    pub is_attached: Option<bool>,
}

impl ResourceFilter {
    /// Create a new filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_idle(mut self, is_idle: bool) -> Self {
        self.is_idle = Some(is_idle);
        self
    }

    pub fn with_attached(mut self, is_attached: bool) -> Self {
        self.is_attached = Some(is_attached);
        self
    }

    /// Whether the collection of the given type is part of the listing
    pub fn includes(&self, resource_type: ResourceType) -> bool {
        self.resource_type.is_none_or(|t| t == resource_type)
    }

    fn matches_common(&self, region: &str, state: &str) -> bool {
        if let Some(wanted) = &self.region {
            if wanted != region {
                return false;
            }
        }
        if let Some(wanted) = &self.state {
            if wanted != state {
                return false;
            }
        }
        true
    }

    /// Check if an instance passes the filter
    pub fn matches_instance(&self, instance: &Ec2Instance) -> bool {
        if !self.matches_common(&instance.region, instance.state.as_str()) {
            return false;
        }
        self.is_idle.is_none_or(|idle| instance.is_idle == idle)
    }

    /// Check if a volume passes the filter
    pub fn matches_volume(&self, volume: &EbsVolume) -> bool {
        if !self.matches_common(&volume.region, volume.state.as_str()) {
            return false;
        }
        self.is_attached
            .is_none_or(|attached| volume.is_attached == attached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{cost, instance, volume};
    use crate::types::InstanceState;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("start_date", "2024-01-15").unwrap(), date(2024, 1, 15));

        let err = parse_date("end_date", "2024/01/15").unwrap_err();
        assert!(matches!(
            err,
            CloudcostError::InvalidDate { ref parameter, .. } if parameter == "end_date"
        ));
        assert!(parse_date("start_date", "2024-02-30").is_err());
        assert_eq!(parse_optional_date("start_date", None).unwrap(), None);
    }

    #[test]
    fn test_date_window_rejects_inverted_range() {
        assert!(DateWindow::new(Some(date(2024, 1, 2)), Some(date(2024, 1, 1))).is_err());
        assert!(DateWindow::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 1))).is_ok());
        assert!(DateWindow::new(None, Some(date(2024, 1, 1))).is_ok());
    }

    #[test]
    fn test_cost_filter() {
        let filter = CostFilter::new()
            .with_start_date(date(2024, 1, 1))
            .with_end_date(date(2024, 1, 31))
            .with_service_name("ec2");

        let inside = cost("EC2", "10.00", "us-east-1", "2024-01-05", "2024-01-05");
        let straddling = cost("EC2", "10.00", "us-east-1", "2023-12-30", "2024-01-02");
        let before = cost("EC2", "10.00", "us-east-1", "2023-12-01", "2023-12-31");
        let other_service = cost("S3", "10.00", "us-east-1", "2024-01-05", "2024-01-05");

        assert!(filter.matches(&inside));
        assert!(filter.matches(&straddling));
        assert!(!filter.matches(&before));
        assert!(!filter.matches(&other_service));

        let filter = CostFilter::new().with_region("us-west-2");
        assert!(!filter.matches(&inside));
    }

    #[test]
    fn test_resource_filter_state_and_region() {
        let filter = ResourceFilter::new()
            .with_region("us-east-1")
            .with_state("running");

        let running = instance("i-1", "t3.micro", InstanceState::Running, "us-east-1", 1.0);
        let stopped = instance("i-2", "t3.micro", InstanceState::Stopped, "us-east-1", 1.0);
        let elsewhere = instance("i-3", "t3.micro", InstanceState::Running, "eu-west-1", 1.0);

        assert!(filter.matches_instance(&running));
        assert!(!filter.matches_instance(&stopped));
        assert!(!filter.matches_instance(&elsewhere));

        let filter = ResourceFilter::new().with_state("available");
        assert!(filter.matches_volume(&volume("vol-1", 10, "gp3", false, "us-east-1")));
        assert!(!filter.matches_volume(&volume("vol-2", 10, "gp3", true, "us-east-1")));
    }

    #[test]
    fn test_resource_filter_ignores_foreign_flags() {
        // is_attached does not apply to instances, is_idle does not apply to volumes
        let filter = ResourceFilter::new().with_attached(true).with_idle(true);

        let mut idle = instance("i-1", "t3.micro", InstanceState::Running, "us-east-1", 1.0);
        idle.is_idle = true;
        let attached = volume("vol-1", 10, "gp3", true, "us-east-1");

        assert!(filter.matches_instance(&idle));
        assert!(filter.matches_volume(&attached));
    }

    #[test]
    fn test_resource_filter_includes() {
        let all = ResourceFilter::new();
        assert!(all.includes(ResourceType::Ec2));
        assert!(all.includes(ResourceType::Ebs));

        let ebs_only = ResourceFilter::new().with_resource_type(ResourceType::Ebs);
        assert!(!ebs_only.includes(ResourceType::Ec2));
        assert!(ebs_only.includes(ResourceType::Ebs));
    }
}
