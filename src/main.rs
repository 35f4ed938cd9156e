use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use air_quality_service::{
    api::{self, AppState},
    config::Config,
    db::{self, SchemaGuard},
};

const DEFAULT_LOG_FILTER: &str = "info,sqlx::query=warn";

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the variables may come from the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let config = Config::from_env()?;
    info!(database_url = %config.masked_database_url(), "Connecting to database");

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Ingestion and the snapshot retry on first use if this fails.
    let schema = SchemaGuard::new();
    if let Err(e) = schema.ensure(&pool).await {
        warn!(error = %e, "Schema setup failed at startup; will retry on first write");
    }

    if config.expose_error_details {
        warn!("EXPOSE_ERROR_DETAILS is on: storage errors are returned to clients");
    }

    let state = AppState::new(pool, schema, &config);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
