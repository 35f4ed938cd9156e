pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    aggregation::AggregationService,
    config::Config,
    db::SchemaGuard,
    sensors::SensorService,
    telemetry::TelemetryService,
    users::{PasswordHasher, UserService},
};
use handlers::{data, sensors, system, users, ApiDoc};

/// Everything the handlers need, split per service through `FromRef`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub sensors: SensorService,
    pub users: UserService,
    pub telemetry: TelemetryService,
    pub aggregation: AggregationService,
    #[from_ref(skip)]
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(pool: PgPool, schema: SchemaGuard, config: &Config) -> Self {
        let hasher = PasswordHasher::new(config.password_secret.clone());
        Self {
            sensors: SensorService::new(pool.clone()),
            users: UserService::new(pool.clone(), hasher),
            telemetry: TelemetryService::new(pool.clone(), schema.clone()),
            aggregation: AggregationService::new(pool, schema),
            expose_error_details: config.expose_error_details,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let expose = state.expose_error_details;

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/", get(system::index))
        .route("/health", get(system::health))
        .route(
            "/api/sensor",
            get(sensors::list_sensors).post(sensors::create_sensor),
        )
        .route(
            "/api/sensor/{id}",
            get(sensors::get_sensor)
                .patch(sensors::update_sensor)
                .delete(sensors::delete_sensor),
        )
        .route("/api/user", post(users::create_user))
        .route("/api/user/login", post(users::login))
        .route(
            "/api/user/{id}",
            patch(users::update_user).delete(users::delete_user),
        )
        .route("/api/data", post(data::add_reading))
        .route("/api/data/temp/avg/{sensor_id}", get(data::temperature_average))
        .route("/api/data/humidity/avg/{sensor_id}", get(data::humidity_average))
        .route(
            "/api/data/latest/{sensor_id}/{user_id}",
            get(data::latest_reading),
        )
        .route("/api/data/{metric}/avg/{sensor_id}", get(data::sensor_daily_average))
        .route(
            "/api/data/{metric}/hourly/{sensor_id}",
            get(data::sensor_hourly_average),
        )
        .route(
            "/api/data/{metric}/avg/user/{user_id}",
            get(data::user_daily_average),
        )
        .route(
            "/api/data/{metric}/hourly/user/{user_id}",
            get(data::user_hourly_average),
        )
        .with_state(state)
        .split_for_parts();

    router
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .fallback(errors::route_not_found)
        .method_not_allowed_fallback(errors::method_not_allowed)
        .layer(middleware::map_response_with_state(
            expose,
            errors::attach_error_details,
        ))
        .layer(cors())
}

/// Any origin, method and header, without credentials.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
