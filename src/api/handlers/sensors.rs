use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    api::{
        dto::{CreatedResponse, MessageResponse, SensorDto, SensorRequest, SensorUpdatedResponse},
        errors::AppError,
        extract::{AppJson, AppPath},
    },
    sensors::{SensorPatch, SensorService},
};

/// Register a sensor.
#[utoipa::path(
    post,
    path = "/api/sensor",
    request_body = SensorRequest,
    responses(
        (status = 201, description = "Sensor created", body = CreatedResponse),
        (status = 400, description = "Missing name"),
    ),
    tag = "sensors"
)]
pub async fn create_sensor(
    State(sensors): State<SensorService>,
    AppJson(body): AppJson<SensorRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let id = sensors
        .create(body.name.clone(), body.latitude, body.longitude)
        .await?;
    let name = body.name.unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: format!("Sensor {name} created."),
        }),
    ))
}

/// List every registered sensor.
#[utoipa::path(
    get,
    path = "/api/sensor",
    responses(
        (status = 200, description = "All sensors", body = Vec<SensorDto>),
    ),
    tag = "sensors"
)]
pub async fn list_sensors(
    State(sensors): State<SensorService>,
) -> Result<Json<Vec<SensorDto>>, AppError> {
    let rows = sensors.list().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/sensor/{id}",
    params(("id" = Uuid, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Sensor details", body = SensorDto),
        (status = 404, description = "No such sensor"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor(
    State(sensors): State<SensorService>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<SensorDto>, AppError> {
    Ok(Json(sensors.get(id).await?.into()))
}

/// Change some of a sensor's fields; omitted fields keep their values.
#[utoipa::path(
    patch,
    path = "/api/sensor/{id}",
    params(("id" = Uuid, Path, description = "Sensor id")),
    request_body = SensorRequest,
    responses(
        (status = 200, description = "Sensor updated", body = SensorUpdatedResponse),
        (status = 400, description = "No fields supplied"),
        (status = 404, description = "No such sensor"),
    ),
    tag = "sensors"
)]
pub async fn update_sensor(
    State(sensors): State<SensorService>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<SensorRequest>,
) -> Result<Json<SensorUpdatedResponse>, AppError> {
    let patch = SensorPatch {
        name: body.name,
        latitude: body.latitude,
        longitude: body.longitude,
    };
    let sensor_id = sensors.update(id, patch).await?;

    Ok(Json(SensorUpdatedResponse {
        message: "Sensor updated successfully.".into(),
        sensor_id,
    }))
}

/// Delete a sensor together with all of its readings.
#[utoipa::path(
    delete,
    path = "/api/sensor/{id}",
    params(("id" = Uuid, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Sensor deleted", body = MessageResponse),
        (status = 404, description = "No such sensor"),
    ),
    tag = "sensors"
)]
pub async fn delete_sensor(
    State(sensors): State<SensorService>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    sensors.delete(id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Sensor with ID '{id}' and its associated data were deleted."
    ))))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use crate::api::handlers::test_support::test_server;

    #[sqlx::test(migrations = false)]
    async fn create_then_get_round_trips(pool: PgPool) {
        let server = test_server(pool).await;

        let resp = server
            .post("/api/sensor")
            .json(&json!({ "name": "Porch", "latitude": 40.71, "longitude": -74.01 }))
            .await;
        resp.assert_status(StatusCode::CREATED);
        let created: Value = resp.json();
        assert_eq!(created["message"], "Sensor Porch created.");
        let id = created["id"].as_str().unwrap().to_owned();

        let resp = server.get(&format!("/api/sensor/{id}")).await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(
            body,
            json!({ "id": id, "name": "Porch", "latitude": 40.71, "longitude": -74.01 })
        );
    }

    #[sqlx::test(migrations = false)]
    async fn create_without_name_is_400(pool: PgPool) {
        let server = test_server(pool).await;
        let resp = server
            .post("/api/sensor")
            .json(&json!({ "latitude": 1.0 }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert!(body["error"].as_str().unwrap().contains("name"));
    }

    #[sqlx::test(migrations = false)]
    async fn malformed_body_is_400_with_json_error(pool: PgPool) {
        let server = test_server(pool).await;
        let resp = server
            .post("/api/sensor")
            .json(&json!({ "name": 42 }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert!(body["error"].is_string());
    }

    #[sqlx::test(migrations = false)]
    async fn list_returns_array(pool: PgPool) {
        let server = test_server(pool).await;
        let resp = server.get("/api/sensor").await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>(), json!([]));

        server.post("/api/sensor").json(&json!({ "name": "a" })).await;
        server.post("/api/sensor").json(&json!({ "name": "b" })).await;

        let body: Vec<Value> = server.get("/api/sensor").await.json();
        assert_eq!(body.len(), 2);
        assert!(body.iter().all(|s| s["latitude"].is_null()));
    }

    #[sqlx::test(migrations = false)]
    async fn get_unknown_is_404(pool: PgPool) {
        let server = test_server(pool).await;
        let resp = server
            .get("/api/sensor/6f1c1c5e-0b7a-4d1e-9a53-2b8f2a0a9c11")
            .await;
        resp.assert_status(StatusCode::NOT_FOUND);
        let body: Value = resp.json();
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[sqlx::test(migrations = false)]
    async fn malformed_id_is_400(pool: PgPool) {
        let server = test_server(pool).await;
        let resp = server.get("/api/sensor/not-a-uuid").await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert!(body["error"].is_string());
    }

    #[sqlx::test(migrations = false)]
    async fn patch_changes_only_supplied_fields(pool: PgPool) {
        let server = test_server(pool).await;
        let created: Value = server
            .post("/api/sensor")
            .json(&json!({ "name": "old", "latitude": 1.0, "longitude": 2.0 }))
            .await
            .json();
        let id = created["id"].as_str().unwrap();

        let resp = server
            .patch(&format!("/api/sensor/{id}"))
            .json(&json!({ "name": "new" }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["sensor_id"], id);
        assert_eq!(body["message"], "Sensor updated successfully.");

        let sensor: Value = server.get(&format!("/api/sensor/{id}")).await.json();
        assert_eq!(sensor["name"], "new");
        assert_eq!(sensor["latitude"], 1.0);
        assert_eq!(sensor["longitude"], 2.0);
    }

    #[sqlx::test(migrations = false)]
    async fn patch_without_fields_is_400(pool: PgPool) {
        let server = test_server(pool).await;
        let created: Value = server
            .post("/api/sensor")
            .json(&json!({ "name": "s" }))
            .await
            .json();
        let id = created["id"].as_str().unwrap();

        server
            .patch(&format!("/api/sensor/{id}"))
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = false)]
    async fn patch_unknown_is_404(pool: PgPool) {
        let server = test_server(pool).await;
        server
            .patch("/api/sensor/6f1c1c5e-0b7a-4d1e-9a53-2b8f2a0a9c11")
            .json(&json!({ "name": "x" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = false)]
    async fn delete_then_get_is_404(pool: PgPool) {
        let server = test_server(pool).await;
        let created: Value = server
            .post("/api/sensor")
            .json(&json!({ "name": "s" }))
            .await
            .json();
        let id = created["id"].as_str().unwrap();

        let resp = server.delete(&format!("/api/sensor/{id}")).await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert!(body["message"].as_str().unwrap().contains(id));

        server
            .get(&format!("/api/sensor/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/sensor/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
