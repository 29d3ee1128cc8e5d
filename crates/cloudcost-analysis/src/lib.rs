//! Cost aggregation, recommendations, and analysis for cloudcost
//!
//! Every operation here is a pure transformation over an in-memory
//! [`cloudcost_core::Snapshot`]; nothing performs I/O.

pub mod aggregation;
pub mod analysis;
pub mod inventory;
pub mod recommendations;

pub use aggregation::CostAggregator;
pub use analysis::{AnalysisRequest, Analyzer, DEFAULT_LOOKBACK_DAYS, TOP_RECOMMENDATIONS};
pub use inventory::{ScanRequest, list_resources, scan_inventory};
pub use recommendations::{
    DEFAULT_CPU_THRESHOLD, IDLE_INSTANCE_ADVICE, RecommendationEngine, RecommendationFilter,
    validate_cpu_threshold,
};
