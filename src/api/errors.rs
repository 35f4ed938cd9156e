use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::ServiceError;

#[derive(Debug)]
pub struct AppError(pub ServiceError);

/// Error message and raw storage text, stashed on the response so
/// [`attach_error_details`] can decide whether to publish the latter.
#[derive(Debug, Clone)]
struct ErrorDetails {
    error: String,
    details: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Conflict { .. } => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            "Internal server error".to_owned()
        } else {
            self.0.to_string()
        };

        let details = self.0.storage_details();
        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let Some(details) = details {
            response.extensions_mut().insert(ErrorDetails {
                error: message,
                details,
            });
        }
        response
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self(ServiceError::Validation(rejection.body_text()))
    }
}

/// Fallback for paths no route matches.
pub async fn route_not_found() -> AppError {
    AppError(ServiceError::NotFound("Resource not found".into()))
}

/// Fallback for a known path hit with an unsupported method.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

/// Response mapper: re-renders storage-originated error bodies with a
/// `details` field when `expose` is on, and strips the stash either way.
pub async fn attach_error_details(State(expose): State<bool>, mut response: Response) -> Response {
    let Some(ErrorDetails { error, details }) = response.extensions_mut().remove::<ErrorDetails>()
    else {
        return response;
    };
    if !expose {
        return response;
    }
    let status = response.status();
    (status, Json(json!({ "error": error, "details": details }))).into_response()
}
