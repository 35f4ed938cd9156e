pub mod data;
pub mod sensors;
pub mod system;
pub mod users;

use utoipa::OpenApi;

use super::dto::{
    CreatedResponse, CredentialsRequest, HealthResponse, HumidityAverageResponse,
    LatestReadingResponse, MessageResponse, ReadingDto, ReadingRequest, SensorDto, SensorRequest,
    SensorUpdatedResponse, TemperatureAverageResponse, UserResponse,
};

// ---------------------------------------------------------------------------
// OpenAPI document (served by api::router)
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        system::index,
        system::health,
        sensors::create_sensor,
        sensors::list_sensors,
        sensors::get_sensor,
        sensors::update_sensor,
        sensors::delete_sensor,
        users::create_user,
        users::login,
        users::update_user,
        users::delete_user,
        data::add_reading,
        data::temperature_average,
        data::humidity_average,
        data::latest_reading,
        data::sensor_daily_average,
        data::sensor_hourly_average,
        data::user_daily_average,
        data::user_hourly_average,
    ),
    components(schemas(
        SensorRequest,
        SensorDto,
        SensorUpdatedResponse,
        CredentialsRequest,
        UserResponse,
        CreatedResponse,
        MessageResponse,
        HealthResponse,
        ReadingRequest,
        ReadingDto,
        TemperatureAverageResponse,
        HumidityAverageResponse,
        LatestReadingResponse,
    )),
    tags(
        (name = "sensors", description = "Sensor registry"),
        (name = "users", description = "Accounts and login"),
        (name = "data", description = "Reading ingestion and aggregates"),
        (name = "system", description = "Banner and liveness"),
    ),
    info(
        title = "Air Quality API",
        version = "0.1.0",
        description = "REST API for environmental sensor readings"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
pub(crate) mod test_support {
    use axum_test::TestServer;
    use sqlx::PgPool;

    use crate::{
        api::{router, AppState},
        config::Config,
        db::{schema::ensure_schema, SchemaGuard},
    };

    fn config(expose_error_details: bool) -> Config {
        Config {
            database_url: String::new(),
            server_host: "127.0.0.1".into(),
            server_port: 0,
            db_max_connections: 1,
            password_secret: "test-secret".into(),
            expose_error_details,
        }
    }

    async fn build(pool: PgPool, expose_error_details: bool) -> TestServer {
        ensure_schema(&pool).await.unwrap();
        let state = AppState::new(pool, SchemaGuard::new(), &config(expose_error_details));
        TestServer::new(router(state)).unwrap()
    }

    pub async fn test_server(pool: PgPool) -> TestServer {
        build(pool, false).await
    }

    pub async fn test_server_with_details(pool: PgPool) -> TestServer {
        build(pool, true).await
    }
}
