//! Integration tests for the HTTP endpoints

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use cloudcost_analysis::Analyzer;
use cloudcost_api::{AppState, create_router};
use cloudcost_core::Snapshot;
use cloudcost_core::test_utils::{cost, instance, volume};
use cloudcost_core::types::InstanceState;
use cloudcost_pricing::{CostCalculator, RateCatalog};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn snapshot() -> Snapshot {
    Snapshot {
        cost_records: vec![
            cost("EC2", "850.25", "us-east-1", "2024-01-01", "2024-01-31"),
            cost("S3", "200.50", "us-west-2", "2024-01-01", "2024-01-31"),
            cost("RDS", "200.00", "us-east-1", "2024-01-01", "2024-01-31"),
        ],
        ec2_instances: vec![
            instance("i-idle", "t3.micro", InstanceState::Running, "us-east-1", 2.5),
            instance("i-stopped", "t3.micro", InstanceState::Stopped, "us-east-1", 2.5),
            instance("i-busy", "m5.large", InstanceState::Running, "us-west-2", 55.0),
        ],
        ebs_volumes: vec![
            volume("vol-free", 100, "gp3", false, "us-east-1"),
            volume("vol-used", 200, "gp2", true, "us-east-1"),
        ],
    }
}

fn app() -> Router {
    let catalog = RateCatalog::embedded().unwrap();
    let analyzer = Analyzer::new(CostCalculator::new(Arc::new(catalog)));
    create_router(Arc::new(AppState::new(Arc::new(snapshot()), analyzer)))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post(uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_cost_summary() {
    let (status, body) = get("/aws/costs/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_cost"], json!(1250.75));

    let services: Vec<&str> = body["by_service"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["service_name"].as_str().unwrap())
        .collect();
    assert_eq!(services, vec!["EC2", "RDS", "S3"]);
    assert_eq!(body["by_service"][0]["percentage"], json!(68.0));
    assert_eq!(body["by_service"][1]["percentage"], json!(16.0));
    assert_eq!(body["period"]["start_date"], "2024-01-01");
}

#[tokio::test]
async fn test_invalid_date_names_parameter() {
    let (status, body) = get("/aws/costs/summary?start_date=2024-13-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_DATE_FORMAT");
    assert_eq!(body["error"]["details"]["parameter"], "start_date");
}

#[tokio::test]
async fn test_inverted_date_range() {
    let (status, body) = get("/aws/costs?start_date=2024-02-01&end_date=2024-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_DATE_RANGE");
}

#[tokio::test]
async fn test_list_costs_filters() {
    let (status, body) = get("/aws/costs?region=us-east-1&service_name=ec2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_cost"], json!(850.25));
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["breakdown"][0]["service"], "EC2");
}

#[tokio::test]
async fn test_resources_by_type() {
    let (status, body) = get("/aws/resources?type=EBS&is_attached=false").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert!(body["resources"].get("ec2_instances").is_none());
    assert_eq!(body["resources"]["ebs_volumes"][0]["volume_id"], "vol-free");

    let (status, body) = get("/aws/resources?type=rds").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["parameter"], "type");
}

#[tokio::test]
async fn test_scan() {
    let (status, body) = post("/aws/resources/scan", r#"{"regions":["us-east-1"]}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["resources_found"]["ec2_instances"], 2);
    assert_eq!(body["resources_found"]["ebs_volumes"], 2);
    assert!(body["scan_id"].as_str().unwrap().starts_with("scan_"));
}

#[tokio::test]
async fn test_idle_instances() {
    let (status, body) = get("/aws/recommendations/idle-instances").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_idle_instances"], 1);
    assert_eq!(body["idle_instances"][0]["instance_id"], "i-idle");

    let (status, body) = get("/aws/recommendations/idle-instances?cpu_threshold=150").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["parameter"], "cpu_threshold");
}

#[tokio::test]
async fn test_unattached_volumes_min_size() {
    let (_, body) = get("/aws/recommendations/unattached-volumes?min_size=150").await;
    assert_eq!(body["total_unattached_volumes"], 0);

    let (_, body) = get("/aws/recommendations/unattached-volumes?min_size=50").await;
    assert_eq!(body["total_unattached_volumes"], 1);
    assert_eq!(body["unattached_volumes"][0]["monthly_cost"], json!(8.0));

    let (status, _) = get("/aws/recommendations/unattached-volumes?min_size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_and_savings() {
    let (status, body) = get("/aws/recommendations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_recommendations"], 2);
    assert_eq!(body["recommendations"][0]["resource_id"], "vol-free");
    assert_eq!(body["recommendations"][0]["id"], 1);

    let (_, body) = get("/aws/recommendations?recommendation_type=IDLE_INSTANCE").await;
    assert_eq!(body["total_recommendations"], 1);
    assert_eq!(body["recommendations"][0]["id"], 1);

    let (status, body) = get("/aws/savings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendations_count"]["total"], 2);
    assert_eq!(body["recommendations_count"]["by_severity"]["CRITICAL"], 0);
}

#[tokio::test]
async fn test_analyze() {
    let (status, body) = post("/aws/analyze", r#"{"include_cost_data":false}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["idle_instances"], 1);
    assert!(body.get("cost_data").is_none());
    assert_eq!(body["regions_analyzed"], json!(["us-east-1", "us-west-2"]));
}

#[tokio::test]
async fn test_analyze_unmatched_region() {
    let (status, body) = post("/aws/analyze", r#"{"regions":["eu-west-1"]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NO_REGIONS_MATCHED");
}

#[tokio::test]
async fn test_malformed_body() {
    let (status, body) = post("/aws/analyze", "{ nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");
    assert_eq!(body["error"]["details"]["parameter"], "body");
}
