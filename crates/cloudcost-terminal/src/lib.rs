//! Terminal output formatting for cloudcost
//!
//! This crate provides the table and JSON formatters every CLI command
//! prints through.

pub mod output;

pub use output::{JsonFormatter, OutputFormatter, TableFormatter, get_formatter};
