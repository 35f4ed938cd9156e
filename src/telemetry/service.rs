use chrono::{Duration, NaiveDateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{
        models::{NewReading, Reading},
        queries, SchemaGuard,
    },
    error::{ServiceError, ServiceResult},
};

/// Textual timestamp format accepted from clients.
pub const READING_DATE_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// Fixed offset from UTC of every stored timestamp (Eastern, no DST).
pub const LOCAL_OFFSET_HOURS: i64 = -4;

/// Current wall-clock time at the fixed local offset.
pub fn local_now() -> NaiveDateTime {
    Utc::now().naive_utc() + Duration::hours(LOCAL_OFFSET_HOURS)
}

pub fn parse_reading_date(raw: &str) -> ServiceResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, READING_DATE_FORMAT).map_err(|_| {
        ServiceError::Validation("Invalid 'date' format. Use '%m-%d-%Y %H:%M:%S'".into())
    })
}

/// An unvalidated reading as submitted by a client.
#[derive(Debug, Clone, Default)]
pub struct ReadingInput {
    pub sensor: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pm25: Option<f64>,
    pub tvoc: Option<f64>,
    pub co2: Option<f64>,
    pub date: Option<String>,
}

impl ReadingInput {
    /// Check the sensor id and resolve the timestamp, defaulting to
    /// [`local_now`].
    pub fn validate(self) -> ServiceResult<NewReading> {
        let sensor = self
            .sensor
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::Validation("Missing 'sensor' in payload".into()))?;
        let sensor_id = Uuid::parse_str(&sensor).map_err(|_| {
            ServiceError::Validation(format!("Invalid sensor id {sensor:?}"))
        })?;
        let date = match self.date {
            Some(raw) => parse_reading_date(&raw)?,
            None => local_now(),
        };

        Ok(NewReading {
            sensor_id,
            reading: Reading {
                temperature: self.temperature,
                humidity: self.humidity,
                pm25: self.pm25,
                tvoc: self.tvoc,
                co2: self.co2,
                date,
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryService {
    pool: PgPool,
    schema: SchemaGuard,
}

impl TelemetryService {
    pub fn new(pool: PgPool, schema: SchemaGuard) -> Self {
        Self { pool, schema }
    }

    /// Validate and store one reading. The sensor id only has to be a
    /// well-formed UUID; it is not checked against registered sensors.
    pub async fn record(&self, input: ReadingInput) -> ServiceResult<()> {
        let NewReading { sensor_id, reading } = input.validate()?;

        self.schema.ensure(&self.pool).await?;

        sqlx::query(queries::INSERT_READING)
            .bind(sensor_id)
            .bind(reading.temperature)
            .bind(reading.humidity)
            .bind(reading.pm25)
            .bind(reading.tvoc)
            .bind(reading.co2)
            .bind(reading.date)
            .execute(&self.pool)
            .await?;

        info!(sensor_id = %sensor_id, date = %reading.date, "Reading recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::*;

    fn input(sensor: &str) -> ReadingInput {
        ReadingInput {
            sensor: Some(sensor.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_month_day_year_format() {
        let date = parse_reading_date("01-15-2024 10:30:00").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(date, expected);
    }

    #[test]
    fn rejects_other_date_formats() {
        for raw in ["2024-01-15 10:30:00", "01-15-2024", "13-01-2024 10:30:00", ""] {
            let err = parse_reading_date(raw).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{raw:?}");
        }
    }

    #[test]
    fn local_now_is_four_hours_behind_utc() {
        let local = local_now();
        let utc = Utc::now().naive_utc();
        let drift = (utc - local) - Duration::hours(4);
        assert!(drift >= Duration::zero() && drift < Duration::seconds(5), "{drift}");
    }

    #[test]
    fn validate_requires_sensor() {
        let err = ReadingInput::default().validate().unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = input("").validate().unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn validate_rejects_malformed_sensor_id() {
        let err = input("not-a-uuid").validate().unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn validate_defaults_date_to_local_now() {
        let before = local_now();
        let new = input(&Uuid::new_v4().to_string()).validate().unwrap();
        let after = local_now();
        assert!(new.reading.date >= before && new.reading.date <= after);
    }

    #[test]
    fn validate_keeps_absent_metrics_absent() {
        let mut raw = input(&Uuid::new_v4().to_string());
        raw.pm25 = Some(12.5);
        raw.date = Some("03-02-2024 23:59:59".into());

        let new = raw.validate().unwrap();
        assert_eq!(new.reading.pm25, Some(12.5));
        assert_eq!(new.reading.temperature, None);
        assert_eq!(new.reading.co2, None);
        assert_eq!(new.reading.date.hour(), 23);
    }

    async fn register_sensor(pool: &PgPool) -> Uuid {
        sqlx::query_scalar(queries::INSERT_SENSOR)
            .bind("test sensor")
            .bind(None::<f64>)
            .bind(None::<f64>)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = false)]
    async fn record_stores_row_with_explicit_date(pool: PgPool) {
        let schema = SchemaGuard::new();
        schema.ensure(&pool).await.unwrap();
        let svc = TelemetryService::new(pool.clone(), schema);
        let sensor = register_sensor(&pool).await;

        let mut raw = input(&sensor.to_string());
        raw.date = Some("01-15-2024 10:30:00".into());
        raw.co2 = Some(415.0);
        svc.record(raw).await.unwrap();

        let stored = sqlx::query_as::<_, Reading>(queries::SELECT_LATEST_READING)
            .bind(sensor)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored.date, parse_reading_date("01-15-2024 10:30:00").unwrap());
        assert_eq!(stored.co2, Some(415.0));
        assert_eq!(stored.temperature, None);
    }

    #[sqlx::test(migrations = false)]
    async fn record_creates_schema_on_first_use(pool: PgPool) {
        let schema = SchemaGuard::new();
        let svc = TelemetryService::new(pool.clone(), schema.clone());

        svc.record(input(&Uuid::new_v4().to_string())).await.unwrap();
        assert!(schema.is_ready());
    }

    #[sqlx::test(migrations = false)]
    async fn record_accepts_unregistered_sensor(pool: PgPool) {
        let schema = SchemaGuard::new();
        schema.ensure(&pool).await.unwrap();
        let svc = TelemetryService::new(pool.clone(), schema);
        let sensor = Uuid::new_v4();

        let mut raw = input(&sensor.to_string());
        raw.pm25 = Some(5.0);
        svc.record(raw).await.unwrap();

        let stored = sqlx::query_as::<_, Reading>(queries::SELECT_LATEST_READING)
            .bind(sensor)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored.pm25, Some(5.0));
    }

    #[sqlx::test(migrations = false)]
    async fn invalid_input_writes_nothing(pool: PgPool) {
        let schema = SchemaGuard::new();
        let svc = TelemetryService::new(pool.clone(), schema.clone());

        let mut raw = input(&Uuid::new_v4().to_string());
        raw.date = Some("yesterday".into());
        assert!(svc.record(raw).await.is_err());
        assert!(!schema.is_ready());
    }
}
