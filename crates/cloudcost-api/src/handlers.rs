//! Route handlers
//!
//! Query parameters arrive as raw strings and are parsed here so that a
//! malformed value is reported with the parameter's name instead of a
//! generic extractor rejection.

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    response::IntoResponse,
};
use chrono::Utc;
use cloudcost_analysis::{AnalysisRequest, RecommendationFilter, ScanRequest};
use cloudcost_core::aggregation_types::{
    AnalysisReport, CostReport, CostSummary, IdleInstancesReport, RecommendationSet,
    ResourceListing, SavingsSummary, ScanReport, UnattachedVolumesReport,
};
use cloudcost_core::error::{CloudcostError, Result};
use cloudcost_core::filters::{CostFilter, ResourceFilter, parse_optional_date};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Parse an optional parameter, naming it on failure
fn parse_param<T: FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>> {
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                CloudcostError::invalid_parameter(name, format!("invalid value '{raw}'"))
            })
        })
        .transpose()
}

#[derive(Debug, Default, Deserialize)]
pub struct CostQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub region: Option<String>,
    pub service_name: Option<String>,
}

impl CostQuery {
    fn to_filter(&self) -> Result<CostFilter> {
        Ok(CostFilter {
            start_date: parse_optional_date("start_date", self.start_date.as_deref())?,
            end_date: parse_optional_date("end_date", self.end_date.as_deref())?,
            region: self.region.clone(),
            service_name: self.service_name.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub is_idle: Option<String>,
    pub is_attached: Option<String>,
}

impl ResourceQuery {
    fn to_filter(&self) -> Result<ResourceFilter> {
        Ok(ResourceFilter {
            resource_type: parse_param("type", self.resource_type.as_deref())?,
            region: self.region.clone(),
            state: self.state.clone(),
            is_idle: parse_param("is_idle", self.is_idle.as_deref())?,
            is_attached: parse_param("is_attached", self.is_attached.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub severity: Option<String>,
    pub recommendation_type: Option<String>,
    pub region: Option<String>,
    pub min_savings: Option<String>,
}

impl RecommendationQuery {
    fn to_filter(&self) -> Result<RecommendationFilter> {
        Ok(RecommendationFilter {
            severity: parse_param("severity", self.severity.as_deref())?,
            recommendation_type: parse_param(
                "recommendation_type",
                self.recommendation_type.as_deref(),
            )?,
            region: self.region.clone(),
            min_savings: parse_param("min_savings", self.min_savings.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IdleQuery {
    pub cpu_threshold: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VolumeQuery {
    pub region: Option<String>,
    pub min_size: Option<String>,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_costs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CostQuery>,
) -> ApiResult<CostReport> {
    let filter = query.to_filter()?;
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.costs(&snapshot, &filter)?))
}

pub async fn cost_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<CostSummary> {
    let start = parse_optional_date("start_date", query.start_date.as_deref())?;
    let end = parse_optional_date("end_date", query.end_date.as_deref())?;
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.cost_summary(&snapshot, start, end)?))
}

pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<ResourceListing> {
    let filter = query.to_filter()?;
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.resources(&snapshot, &filter)))
}

pub async fn scan_resources(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult<ScanReport> {
    let Json(request) = body?;
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.scan(&snapshot, &request, Utc::now())?))
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<RecommendationSet> {
    let filter = query.to_filter()?;
    let snapshot = state.source.load().await?;
    Ok(Json(
        state
            .analyzer
            .recommendations(&snapshot, &filter, Utc::now())?,
    ))
}

pub async fn idle_instances(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdleQuery>,
) -> ApiResult<IdleInstancesReport> {
    let threshold = parse_param("cpu_threshold", query.cpu_threshold.as_deref())?;
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.idle_instances(
        &snapshot,
        threshold,
        query.region.as_deref(),
    )?))
}

pub async fn unattached_volumes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VolumeQuery>,
) -> ApiResult<UnattachedVolumesReport> {
    let min_size = parse_param("min_size", query.min_size.as_deref())?;
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.unattached_volumes(
        &snapshot,
        min_size,
        query.region.as_deref(),
    )?))
}

pub async fn savings(State(state): State<Arc<AppState>>) -> ApiResult<SavingsSummary> {
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.savings(&snapshot, Utc::now())?))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<AnalysisReport> {
    let Json(request) = body?;
    let snapshot = state.source.load().await?;
    Ok(Json(state.analyzer.analyze(&snapshot, &request, Utc::now())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudcost_core::types::{ResourceType, Severity};

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param::<i64>("min_size", Some("50")).unwrap(), Some(50));
        assert_eq!(parse_param::<i64>("min_size", None).unwrap(), None);
        let err = parse_param::<i64>("min_size", Some("fifty")).unwrap_err();
        assert_eq!(err.parameter(), Some("min_size"));
    }

    #[test]
    fn test_resource_query_parsing() {
        let query = ResourceQuery {
            resource_type: Some("ebs".to_string()),
            is_attached: Some("false".to_string()),
            ..ResourceQuery::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.resource_type, Some(ResourceType::Ebs));
        assert_eq!(filter.is_attached, Some(false));

        let query = ResourceQuery {
            is_idle: Some("maybe".to_string()),
            ..ResourceQuery::default()
        };
        assert_eq!(query.to_filter().unwrap_err().parameter(), Some("is_idle"));
    }

    #[test]
    fn test_recommendation_query_parsing() {
        let query = RecommendationQuery {
            severity: Some("high".to_string()),
            recommendation_type: Some("unattached_volume".to_string()),
            min_savings: Some("12.50".to_string()),
            ..RecommendationQuery::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.severity, Some(Severity::High));
        assert!(filter.min_savings.is_some());

        let query = RecommendationQuery {
            severity: Some("urgent".to_string()),
            ..RecommendationQuery::default()
        };
        assert_eq!(query.to_filter().unwrap_err().parameter(), Some("severity"));
    }

    #[test]
    fn test_cost_query_dates() {
        let query = CostQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("01/31/2024".to_string()),
            ..CostQuery::default()
        };
        let err = query.to_filter().unwrap_err();
        assert!(matches!(err, CloudcostError::InvalidDate { ref parameter, .. } if parameter == "end_date"));
    }
}
