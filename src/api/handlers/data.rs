use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    aggregation::AggregationService,
    api::{
        dto::{
            self, HumidityAverageResponse, LatestReadingResponse, MessageResponse, ReadingRequest,
            TemperatureAverageResponse,
        },
        errors::AppError,
        extract::{AppJson, AppPath},
    },
    db::models::{Metric, Scope},
    error::ServiceError,
    telemetry::TelemetryService,
};

/// Resolve the `{metric}` path segment of a bucketed route. Anything other
/// than pm25, tvoc or co2 has no such route.
fn bucketed_metric(raw: &str) -> Result<Metric, AppError> {
    raw.parse::<Metric>()
        .ok()
        .filter(|m| m.is_bucketed())
        .ok_or_else(|| ServiceError::NotFound(format!("No bucketed averages for {raw:?}")).into())
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Store one reading for a sensor.
#[utoipa::path(
    post,
    path = "/api/data",
    request_body = ReadingRequest,
    responses(
        (status = 201, description = "Reading stored", body = MessageResponse),
        (status = 400, description = "Missing or malformed sensor id, or bad date"),
    ),
    tag = "data"
)]
pub async fn add_reading(
    State(telemetry): State<TelemetryService>,
    AppJson(body): AppJson<ReadingRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    telemetry.record(body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Data added successfully.")),
    ))
}

// ---------------------------------------------------------------------------
// Rolling averages
// ---------------------------------------------------------------------------

/// Mean temperature over the last ten minutes.
#[utoipa::path(
    get,
    path = "/api/data/temp/avg/{sensor_id}",
    params(("sensor_id" = Uuid, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Average temperature", body = TemperatureAverageResponse),
        (status = 404, description = "No recent data"),
    ),
    tag = "data"
)]
pub async fn temperature_average(
    State(aggregation): State<AggregationService>,
    AppPath(sensor_id): AppPath<Uuid>,
) -> Result<Json<TemperatureAverageResponse>, AppError> {
    let average = aggregation
        .rolling_average(Scope::Sensor, sensor_id, Metric::Temperature)
        .await?;

    Ok(Json(TemperatureAverageResponse {
        sensor_id,
        average_temperature: dto::round2(average),
        time_range: "10 minutes".into(),
    }))
}

/// Mean humidity over the last ten minutes.
#[utoipa::path(
    get,
    path = "/api/data/humidity/avg/{sensor_id}",
    params(("sensor_id" = Uuid, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Average humidity", body = HumidityAverageResponse),
        (status = 404, description = "No recent data"),
    ),
    tag = "data"
)]
pub async fn humidity_average(
    State(aggregation): State<AggregationService>,
    AppPath(sensor_id): AppPath<Uuid>,
) -> Result<Json<HumidityAverageResponse>, AppError> {
    let average = aggregation
        .rolling_average(Scope::Sensor, sensor_id, Metric::Humidity)
        .await?;

    Ok(Json(HumidityAverageResponse {
        sensor_id,
        average_humidity: dto::round2(average),
        time_range: "Last 10 minutes".into(),
    }))
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Return the sensor's newest reading and record a copy of it for the user.
#[utoipa::path(
    get,
    path = "/api/data/latest/{sensor_id}/{user_id}",
    params(
        ("sensor_id" = Uuid, Path, description = "Sensor id"),
        ("user_id"   = Uuid, Path, description = "User receiving the copy"),
    ),
    responses(
        (status = 200, description = "Latest reading, copied to the user", body = LatestReadingResponse),
        (status = 404, description = "Sensor has no readings, or no such user"),
    ),
    tag = "data"
)]
pub async fn latest_reading(
    State(aggregation): State<AggregationService>,
    AppPath((sensor_id, user_id)): AppPath<(Uuid, Uuid)>,
) -> Result<Json<LatestReadingResponse>, AppError> {
    let reading = aggregation.latest_reading(sensor_id, user_id).await?;

    Ok(Json(LatestReadingResponse {
        sensor_id,
        user_id,
        latest_reading: reading.into(),
        message: "Latest reading retrieved and inserted into user_data.".into(),
    }))
}

// ---------------------------------------------------------------------------
// Bucketed averages
// ---------------------------------------------------------------------------

/// Daily means for the last seven days, newest first.
#[utoipa::path(
    get,
    path = "/api/data/{metric}/avg/{sensor_id}",
    params(
        ("metric"    = String, Path, description = "pm25, tvoc or co2"),
        ("sensor_id" = Uuid,   Path, description = "Sensor id"),
    ),
    responses(
        (status = 200, description = "`{sensor_id, <metric>_daily_averages, time_range}`", body = Object),
        (status = 404, description = "Unknown metric or no data"),
    ),
    tag = "data"
)]
pub async fn sensor_daily_average(
    State(aggregation): State<AggregationService>,
    AppPath((metric, sensor_id)): AppPath<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    daily(&aggregation, Scope::Sensor, &metric, sensor_id).await
}

/// Hourly means from local midnight to the current hour, oldest first.
#[utoipa::path(
    get,
    path = "/api/data/{metric}/hourly/{sensor_id}",
    params(
        ("metric"    = String, Path, description = "pm25, tvoc or co2"),
        ("sensor_id" = Uuid,   Path, description = "Sensor id"),
    ),
    responses(
        (status = 200, description = "`{sensor_id, time_zone, <metric>_hourly_averages}`", body = Object),
        (status = 404, description = "Unknown metric"),
    ),
    tag = "data"
)]
pub async fn sensor_hourly_average(
    State(aggregation): State<AggregationService>,
    AppPath((metric, sensor_id)): AppPath<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let metric = bucketed_metric(&metric)?;
    let rows = aggregation
        .hourly_average(Scope::Sensor, sensor_id, metric)
        .await?;
    Ok(Json(dto::hourly_series(Scope::Sensor, sensor_id, metric, &rows)))
}

/// Daily means of the readings copied to a user, newest first.
#[utoipa::path(
    get,
    path = "/api/data/{metric}/avg/user/{user_id}",
    params(
        ("metric"  = String, Path, description = "pm25, tvoc or co2"),
        ("user_id" = Uuid,   Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "`{user_id, <metric>_daily_averages, time_range}`", body = Object),
        (status = 404, description = "Unknown metric or no data"),
    ),
    tag = "data"
)]
pub async fn user_daily_average(
    State(aggregation): State<AggregationService>,
    AppPath((metric, user_id)): AppPath<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    daily(&aggregation, Scope::User, &metric, user_id).await
}

/// Hourly means of the readings copied to a user, oldest first.
#[utoipa::path(
    get,
    path = "/api/data/{metric}/hourly/user/{user_id}",
    params(
        ("metric"  = String, Path, description = "pm25, tvoc or co2"),
        ("user_id" = Uuid,   Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "`{user_id, time_zone, <metric>_hourly_averages}`", body = Object),
        (status = 404, description = "Unknown metric or no data"),
    ),
    tag = "data"
)]
pub async fn user_hourly_average(
    State(aggregation): State<AggregationService>,
    AppPath((metric, user_id)): AppPath<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let metric = bucketed_metric(&metric)?;
    let rows = aggregation
        .hourly_average(Scope::User, user_id, metric)
        .await?;
    if rows.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "No {} data available for user {user_id}.",
            metric.label()
        ))
        .into());
    }
    Ok(Json(dto::hourly_series(Scope::User, user_id, metric, &rows)))
}

async fn daily(
    aggregation: &AggregationService,
    scope: Scope,
    raw_metric: &str,
    id: Uuid,
) -> Result<Json<Value>, AppError> {
    let metric = bucketed_metric(raw_metric)?;
    let rows = aggregation.daily_average(scope, id, metric).await?;
    if rows.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "No {} data available for {} {id} in the last 7 days.",
            metric.label(),
            scope.label(),
        ))
        .into());
    }
    Ok(Json(dto::daily_series(scope, id, metric, &rows)))
}
