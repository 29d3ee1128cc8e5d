//! Error types for cloudcost
//!
//! This module defines the error types used throughout the cloudcost crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Errors split into two families: client errors (a caller supplied a bad
//! parameter or a filter that matched nothing it explicitly asked for) and
//! everything else (IO, parsing, network, configuration). Hosting layers use
//! [`CloudcostError::is_client_error`] to pick a response class.
//!
//! # Example
//!
//! ```
//! use cloudcost_core::error::{CloudcostError, Result};
//!
//! fn check_threshold(value: f64) -> Result<f64> {
//!     if !(0.0..=100.0).contains(&value) {
//!         return Err(CloudcostError::invalid_parameter(
//!             "cpu_threshold",
//!             "CPU threshold must be between 0 and 100",
//!         ));
//!     }
//!     Ok(value)
//! }
//!
//! assert!(check_threshold(5.0).is_ok());
//! assert!(check_threshold(-1.0).is_err());
//! ```

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cloudcost operations
#[derive(Error, Debug)]
pub enum CloudcostError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A request parameter was out of range or unrecognised
    #[error("Invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        /// Name of the offending parameter
        parameter: String,
        /// Human readable reason
        message: String,
    },

    /// A date parameter was not in YYYY-MM-DD format
    #[error("Invalid date format for {parameter}: '{value}'. Expected YYYY-MM-DD")]
    InvalidDate {
        /// Name of the offending parameter
        parameter: String,
        /// The value that failed to parse
        value: String,
    },

    /// The start of a date window lies after its end
    #[error("Invalid date range: start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Explicitly requested regions matched no input record
    #[error("No records found in requested regions: {}", .0.join(", "))]
    NoRegionsMatched(Vec<String>),

    /// No rate is configured for a resource type and the catalog has no fallback
    #[error("No {kind} rate configured for '{name}'")]
    UnknownRate {
        /// Which rate table was consulted
        kind: &'static str,
        /// The instance or volume type
        name: String,
    },

    /// Snapshot content violates a data model invariant
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CloudcostError {
    /// Build an [`CloudcostError::InvalidParameter`]
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Whether the error was caused by caller input rather than the environment
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. }
                | Self::InvalidDate { .. }
                | Self::InvalidDateRange { .. }
                | Self::NoRegionsMatched(_)
        )
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::InvalidDate { .. } => "INVALID_DATE_FORMAT",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::NoRegionsMatched(_) => "NO_REGIONS_MATCHED",
            Self::UnknownRate { .. } => "UNKNOWN_RATE",
            Self::InvalidSnapshot(_) => "INVALID_SNAPSHOT",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Name of the parameter a client error refers to, if any
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::InvalidParameter { parameter, .. } | Self::InvalidDate { parameter, .. } => {
                Some(parameter)
            }
            Self::InvalidDateRange { .. } => Some("date_range"),
            Self::NoRegionsMatched(_) => Some("regions"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results in cloudcost
pub type Result<T> = std::result::Result<T, CloudcostError>;
