use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::{
        models::{DailyAverage, HourlyAverage, Metric, Reading, Scope},
        queries, SchemaGuard,
    },
    error::{ServiceError, ServiceResult},
};

/// Read-side queries over `data` and `user_data`.
///
/// Nothing is cached: every call recomputes from stored rows.
#[derive(Debug, Clone)]
pub struct AggregationService {
    pool: PgPool,
    schema: SchemaGuard,
}

impl AggregationService {
    pub fn new(pool: PgPool, schema: SchemaGuard) -> Self {
        Self { pool, schema }
    }

    /// Mean of `metric` over the owner's rows from the last ten minutes.
    pub async fn rolling_average(&self, scope: Scope, id: Uuid, metric: Metric) -> ServiceResult<f64> {
        let average: Option<f64> = sqlx::query_scalar(&queries::rolling_average(scope, metric))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .flatten();

        average.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No {} data available for {} {id} in the last 10 minutes.",
                metric.label(),
                scope.label(),
            ))
        })
    }

    /// Copy the sensor's most recent reading into `user_data` under
    /// `user_id` and return it.
    ///
    /// Select and insert share a transaction, but nothing serialises
    /// concurrent callers: two simultaneous calls for the same pair both
    /// copy the same reading and leave two `user_data` rows.
    pub async fn latest_reading(&self, sensor_id: Uuid, user_id: Uuid) -> ServiceResult<Reading> {
        self.schema.ensure(&self.pool).await?;

        let mut tx = self.pool.begin().await?;

        let latest = sqlx::query_as::<_, Reading>(queries::SELECT_LATEST_READING)
            .bind(sensor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No data available for sensor {sensor_id}."))
            })?;

        sqlx::query(queries::INSERT_USER_READING)
            .bind(user_id)
            .bind(latest.temperature)
            .bind(latest.humidity)
            .bind(latest.pm25)
            .bind(latest.tvoc)
            .bind(latest.co2)
            .bind(latest.date)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ServiceError::on_foreign_key(e, || {
                    ServiceError::NotFound(format!("User {user_id} not found."))
                })
            })?;

        tx.commit().await?;

        info!(sensor_id = %sensor_id, user_id = %user_id, date = %latest.date, "Latest reading copied to user");
        Ok(latest)
    }

    /// Seven daily buckets ending today, newest first. Always seven rows.
    pub async fn daily_average(
        &self,
        scope: Scope,
        id: Uuid,
        metric: Metric,
    ) -> ServiceResult<Vec<DailyAverage>> {
        require_bucketed(metric)?;

        let rows = sqlx::query_as::<_, DailyAverage>(&queries::daily_average(scope, metric))
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        debug!(scope = scope.label(), id = %id, metric = %metric, buckets = rows.len(), "Daily averages computed");
        Ok(rows)
    }

    /// Hourly buckets from local midnight through the current hour,
    /// oldest first.
    pub async fn hourly_average(
        &self,
        scope: Scope,
        id: Uuid,
        metric: Metric,
    ) -> ServiceResult<Vec<HourlyAverage>> {
        require_bucketed(metric)?;

        let rows = sqlx::query_as::<_, HourlyAverage>(&queries::hourly_average(scope, metric))
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        debug!(scope = scope.label(), id = %id, metric = %metric, buckets = rows.len(), "Hourly averages computed");
        Ok(rows)
    }
}

fn require_bucketed(metric: Metric) -> ServiceResult<()> {
    if metric.is_bucketed() {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "No bucketed averages for {}",
            metric.label()
        )))
    }
}
