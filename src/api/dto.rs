use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{DailyAverage, HourlyAverage, Metric, Reading, Scope, Sensor};

/// Label reported with every hourly series.
pub const TIME_ZONE_LABEL: &str = "Eastern Time (EST/EDT)";

/// Round to two decimal places for display.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Body for `POST /api/sensor` and `PATCH /api/sensor/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SensorRequest {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorDto {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<Sensor> for SensorDto {
    fn from(s: Sensor) -> Self {
        Self {
            id: s.id,
            name: s.name,
            latitude: s.latitude,
            longitude: s.longitude,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorUpdatedResponse {
    pub message: String,
    pub sensor_id: Uuid,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Body for `POST /api/user`, `POST /api/user/login` and `PATCH /api/user/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `{message, user_id}`, returned by login, update and delete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub user_id: Uuid,
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Body for `POST /api/data`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReadingRequest {
    /// Sensor UUID.
    pub sensor: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pm25: Option<f64>,
    pub tvoc: Option<f64>,
    pub co2: Option<f64>,
    /// `MM-DD-YYYY HH:MM:SS`; defaults to the current Eastern time.
    pub date: Option<String>,
}

impl From<ReadingRequest> for crate::telemetry::ReadingInput {
    fn from(r: ReadingRequest) -> Self {
        Self {
            sensor: r.sensor,
            temperature: r.temperature,
            humidity: r.humidity,
            pm25: r.pm25,
            tvoc: r.tvoc,
            co2: r.co2,
            date: r.date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemperatureAverageResponse {
    pub sensor_id: Uuid,
    pub average_temperature: f64,
    pub time_range: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HumidityAverageResponse {
    pub sensor_id: Uuid,
    pub average_humidity: f64,
    pub time_range: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadingDto {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pm25: Option<f64>,
    pub tvoc: Option<f64>,
    pub co2: Option<f64>,
    pub timestamp: NaiveDateTime,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            temperature: r.temperature,
            humidity: r.humidity,
            pm25: r.pm25,
            tvoc: r.tvoc,
            co2: r.co2,
            timestamp: r.date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LatestReadingResponse {
    pub sensor_id: Uuid,
    pub user_id: Uuid,
    pub latest_reading: ReadingDto,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Bucketed series
//
// Key names embed the metric (`pm25_daily_averages`, `average_pm25`, ...),
// so these are built as JSON objects rather than fixed structs.
// ---------------------------------------------------------------------------

fn owner_key(scope: Scope) -> &'static str {
    match scope {
        Scope::Sensor => "sensor_id",
        Scope::User => "user_id",
    }
}

/// `{<owner>_id, <metric>_daily_averages: [{date, average_<metric>}], time_range}`
pub fn daily_series(scope: Scope, id: Uuid, metric: Metric, rows: &[DailyAverage]) -> Value {
    let entries: Vec<Value> = rows
        .iter()
        .map(|r| {
            json!({
                "date": r.day.format("%Y-%m-%d").to_string(),
                format!("average_{metric}"): round2(r.average),
            })
        })
        .collect();

    let mut body = Map::new();
    body.insert(owner_key(scope).into(), json!(id));
    body.insert(format!("{metric}_daily_averages"), Value::Array(entries));
    body.insert("time_range".into(), json!("Last 7 days"));
    Value::Object(body)
}

/// `{<owner>_id, time_zone, <metric>_hourly_averages: [{hour, avg_<metric>}]}`
pub fn hourly_series(scope: Scope, id: Uuid, metric: Metric, rows: &[HourlyAverage]) -> Value {
    let entries: Vec<Value> = rows
        .iter()
        .map(|r| {
            json!({
                "hour": r.hour.format("%Y-%m-%d %H:%M:%S").to_string(),
                format!("avg_{metric}"): round2(r.average),
            })
        })
        .collect();

    let mut body = Map::new();
    body.insert(owner_key(scope).into(), json!(id));
    body.insert("time_zone".into(), json!(TIME_ZONE_LABEL));
    body.insert(format!("{metric}_hourly_averages"), Value::Array(entries));
    Value::Object(body)
}
