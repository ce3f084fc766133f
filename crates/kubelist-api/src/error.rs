use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kubelist_k8s::ClusterError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorDto {
    pub code: String,
    pub detail: String,
}

/// A [`ClusterError`] on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub ClusterError);

impl From<ClusterError> for ApiError {
    fn from(err: ClusterError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ClusterError::UnsupportedResource(_) => StatusCode::BAD_REQUEST,
            ClusterError::MetricsFetch(_) => StatusCode::BAD_REQUEST,
            ClusterError::UnknownCluster(_) => StatusCode::NOT_FOUND,
            ClusterError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ClusterError::Configuration(_)
            | ClusterError::Kube(_)
            | ClusterError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for (StatusCode, Json<ErrorDto>) {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(code = err.0.code(), "request failed: {}", err.0);
        } else {
            tracing::debug!(code = err.0.code(), "request rejected: {}", err.0);
        }
        (
            status,
            Json(ErrorDto {
                code: String::from(err.0.code()),
                detail: err.0.to_string(),
            }),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        <(StatusCode, Json<ErrorDto>)>::from(self).into_response()
    }
}
