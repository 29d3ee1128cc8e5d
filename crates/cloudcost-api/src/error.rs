use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cloudcost_core::CloudcostError;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by API handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Error raised while loading the snapshot or running a report
    #[error(transparent)]
    Core(#[from] CloudcostError),
    /// Request body was missing or not valid JSON for the endpoint
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// HTTP status for the error
    ///
    /// Caller mistakes are 400, an unreadable data source is 503, anything
    /// else is a server fault.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Core(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Core(
                CloudcostError::Io(_)
                | CloudcostError::Parse { .. }
                | CloudcostError::InvalidSnapshot(_)
                | CloudcostError::Network(_)
                | CloudcostError::Config(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.code(),
            Self::InvalidBody(_) => "INVALID_REQUEST_BODY",
        }
    }

    /// Name of the offending request parameter, if any
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Core(err) => err.parameter(),
            Self::InvalidBody(_) => Some("body"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            warn!("Rejected request: {self}");
        }

        let mut details = Map::new();
        if let Some(parameter) = self.parameter() {
            details.insert("parameter".to_string(), Value::from(parameter));
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_error_display() {
        let err = ApiError::from(CloudcostError::invalid_parameter("min_size", "must be positive"));
        assert_eq!(err.to_string(), "Invalid parameter 'min_size': must be positive");
        assert!(std::error::Error::source(&err).is_none());

        let err = ApiError::InvalidBody("expected value at line 1 column 1".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid request body: expected value at line 1 column 1"
        );

        let err = ApiError::from(CloudcostError::Io(std::io::Error::other("disk gone")));
        assert_eq!(err.to_string(), "IO error: disk gone");
    }

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(CloudcostError::invalid_parameter("min_size", "must be positive"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.parameter(), Some("min_size"));

        let err = ApiError::from(CloudcostError::NoRegionsMatched(vec!["eu-west-1".to_string()]));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(CloudcostError::InvalidSnapshot("duplicate id".to_string()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(CloudcostError::UnknownRate {
            kind: "instance hourly",
            name: "z1d.metal".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_body() {
        let err = ApiError::from(CloudcostError::InvalidDate {
            parameter: "start_date".to_string(),
            value: "2024-13-01".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "INVALID_DATE_FORMAT");
        assert_eq!(body["error"]["details"]["parameter"], "start_date");
    }

    #[tokio::test]
    async fn test_server_error_has_no_parameter() {
        let err = ApiError::from(CloudcostError::Config("no snapshot".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"]["details"].get("parameter").is_none());
    }
}
