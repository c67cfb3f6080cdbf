//! HTTP error mapping

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use social_autopilot_adapters::graph::GraphError;
use social_autopilot_domain::ServiceError;

pub type ApiResult<T = Json<Value>> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(Vec<String>),
    /// Failure reported by an external service; the payload is shown to the caller
    Upstream(Value),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "error": message }),
            ),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": errors.join(", "), "errors": errors }),
            ),
            ApiError::Upstream(error) => {
                tracing::warn!(error = %error, "Upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": error }),
                )
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            ServiceError::Validation(errors) => ApiError::Validation(errors),
            ServiceError::Generate(e) => ApiError::Upstream(Value::String(e.to_string())),
            ServiceError::OAuth(e) => ApiError::Upstream(Value::String(e.to_string())),
            ServiceError::Store(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Upstream { body, .. } => ApiError::Upstream(body),
            other => ApiError::Upstream(Value::String(other.to_string())),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![rejection.body_text()])
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

/// `Json` extractor whose rejections use the API error shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
