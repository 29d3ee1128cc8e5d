//! Shared test utilities
//!
//! Compiled for this crate's own tests and, through the `test-utils`
//! feature, for the unit tests of downstream crates.

use crate::types::{CostRecord, EbsVolume, Ec2Instance, InstanceState, Tag, VolumeState};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Build an instance with fixed launch time and a single Name tag
pub fn instance(
    id: &str,
    instance_type: &str,
    state: InstanceState,
    region: &str,
    cpu_utilization: f64,
) -> Ec2Instance {
    Ec2Instance {
        instance_id: id.to_string(),
        instance_type: instance_type.to_string(),
        state,
        region: region.to_string(),
        availability_zone: format!("{region}a"),
        launch_time: Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
        cpu_utilization,
        is_idle: false,
        tags: vec![Tag::new("Name", id)],
    }
}

/// Build a volume whose state follows its attachment flag
pub fn volume(id: &str, size: u32, volume_type: &str, attached: bool, region: &str) -> EbsVolume {
    EbsVolume {
        volume_id: id.to_string(),
        size,
        volume_type: volume_type.to_string(),
        state: if attached {
            VolumeState::InUse
        } else {
            VolumeState::Available
        },
        is_attached: attached,
        instance_id: None,
        region: region.to_string(),
        availability_zone: format!("{region}a"),
    }
}

/// Build a cost record from a decimal literal and ISO dates
pub fn cost(service: &str, amount: &str, region: &str, start: &str, end: &str) -> CostRecord {
    CostRecord::new(
        service,
        Decimal::from_str(amount).unwrap(),
        region,
        NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
        NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
    )
}
