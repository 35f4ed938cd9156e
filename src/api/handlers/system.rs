use axum::Json;

use crate::api::dto::{HealthResponse, MessageResponse};

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome banner", body = MessageResponse)),
    tag = "system"
)]
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the Air Quality API!"))
}

/// Liveness probe. Does not touch the database.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "system"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into() })
}
