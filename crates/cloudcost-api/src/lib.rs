//! HTTP API for cloudcost
//!
//! Exposes the cost, inventory, and recommendation reports as JSON over
//! axum. Every request reads a fresh snapshot from the configured
//! [`cloudcost_core::SnapshotSource`].
//!
//! # Examples
//!
//! ```no_run
//! use cloudcost_analysis::Analyzer;
//! use cloudcost_api::{AppState, serve};
//! use cloudcost_core::Snapshot;
//! use cloudcost_pricing::{CostCalculator, RateCatalog};
//! use std::sync::Arc;
//!
//! # async fn example() -> cloudcost_core::Result<()> {
//! let analyzer = Analyzer::new(CostCalculator::new(Arc::new(RateCatalog::embedded()?)));
//! let state = AppState::new(Arc::new(Snapshot::default()), analyzer);
//! let addr = "127.0.0.1:8000".parse().expect("valid address");
//! serve(addr, Arc::new(state)).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, create_router, serve};
