//! Router construction and server startup

use crate::handlers;
use axum::{
    Router,
    routing::{get, post},
};
use cloudcost_analysis::Analyzer;
use cloudcost_core::{Result, SnapshotSource};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for every request
pub struct AppState {
    /// Where each request reads its snapshot from
    pub source: Arc<dyn SnapshotSource>,
    pub analyzer: Analyzer,
}

impl AppState {
    pub fn new(source: Arc<dyn SnapshotSource>, analyzer: Analyzer) -> Self {
        Self { source, analyzer }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/aws/costs", get(handlers::list_costs))
        .route("/aws/costs/summary", get(handlers::cost_summary))
        .route("/aws/resources", get(handlers::list_resources))
        .route("/aws/resources/scan", post(handlers::scan_resources))
        .route("/aws/recommendations", get(handlers::recommendations))
        .route(
            "/aws/recommendations/idle-instances",
            get(handlers::idle_instances),
        )
        .route(
            "/aws/recommendations/unattached-volumes",
            get(handlers::unattached_volumes),
        )
        .route("/aws/savings", get(handlers::savings))
        .route("/aws/analyze", post(handlers::analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve the API until the process is interrupted
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = create_router(state.clone());

    info!(
        addr = %addr,
        source = %state.source.describe(),
        "Starting API server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
