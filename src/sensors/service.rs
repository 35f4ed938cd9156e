use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{models::Sensor, queries},
    error::{ServiceError, ServiceResult},
};

/// Partial update for a sensor; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct SensorPatch {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SensorPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.latitude.is_none() && self.longitude.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SensorService {
    pool: PgPool,
}

impl SensorService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> ServiceResult<Uuid> {
        let name = name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::Validation("Missing 'name' in payload".into()))?;

        let id: Uuid = sqlx::query_scalar(queries::INSERT_SENSOR)
            .bind(&name)
            .bind(latitude)
            .bind(longitude)
            .fetch_one(&self.pool)
            .await?;

        info!(sensor_id = %id, name = %name, "Sensor created");
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Sensor> {
        sqlx::query_as::<_, Sensor>(queries::SELECT_SENSOR)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(&self) -> ServiceResult<Vec<Sensor>> {
        let sensors = sqlx::query_as::<_, Sensor>(queries::SELECT_SENSORS)
            .fetch_all(&self.pool)
            .await?;
        Ok(sensors)
    }

    /// Apply `patch`; an empty name counts as absent.
    pub async fn update(&self, id: Uuid, mut patch: SensorPatch) -> ServiceResult<Uuid> {
        patch.name = patch.name.filter(|n| !n.is_empty());
        if patch.is_empty() {
            return Err(ServiceError::Validation(
                "At least one field (name, latitude, or longitude) must be provided.".into(),
            ));
        }

        let updated: Option<Uuid> = sqlx::query_scalar(queries::UPDATE_SENSOR)
            .bind(patch.name)
            .bind(patch.latitude)
            .bind(patch.longitude)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let id = updated.ok_or_else(|| ServiceError::NotFound("Sensor not found.".into()))?;
        info!(sensor_id = %id, "Sensor updated");
        Ok(id)
    }

    /// Delete the sensor together with its readings, atomically. An unknown
    /// id rolls back and leaves any orphan readings in place.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<Uuid> = sqlx::query_scalar(queries::DELETE_SENSOR)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        deleted.ok_or_else(|| not_found(id))?;

        let readings = sqlx::query(queries::DELETE_SENSOR_READINGS)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(sensor_id = %id, readings, "Sensor and its readings deleted");
        Ok(())
    }
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Sensor with ID '{id}' not found."))
}
