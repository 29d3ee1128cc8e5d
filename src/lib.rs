//! cloudcost - Summarize cloud costs and derive savings recommendations
//!
//! This crate ties the workspace together behind a single CLI:
//! - Load cost records and resource inventories from JSON snapshots
//! - Summarize costs by service and region
//! - Flag idle instances and unattached volumes with estimated savings
//! - Render reports as tables or JSON, or serve them over HTTP
//!
//! # Examples
//!
//! ```no_run
//! use cloudcost::{Analyzer, CostCalculator, FileSnapshotLoader, RateCatalog, SnapshotSource};
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cloudcost::Result<()> {
//!     let calculator = CostCalculator::new(Arc::new(RateCatalog::embedded()?));
//!     let analyzer = Analyzer::new(calculator);
//!
//!     let snapshot = FileSnapshotLoader::new("snapshot.json").load().await?;
//!     let savings = analyzer.savings(&snapshot, Utc::now())?;
//!     println!("Potential savings: {}", savings.total_potential_savings);
//!     Ok(())
//! }
//! ```

pub mod cli;

pub use cloudcost_analysis::{AnalysisRequest, Analyzer, RecommendationFilter, ScanRequest};
pub use cloudcost_core::{CloudcostError, Result, Snapshot, SnapshotSource};
pub use cloudcost_pricing::{CostCalculator, RateCatalog, RateLoader, RateSource};
pub use cloudcost_provider_file::FileSnapshotLoader;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
