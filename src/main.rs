use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod database;
mod provider;
mod routes;
mod service;
mod transform;

use config::Config;
use database::Database;
use provider::openweather::OpenWeatherClient;
use routes::{create_router, AppState};
use service::WeatherService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_forecast_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./weather_forecast.db".to_string());
    let pool = sqlx::SqlitePool::connect(&database_url).await?;
    let database = Arc::new(Database::new(pool));
    database.init_tables().await?;

    // Initialize weather provider client and the forecast service
    let provider = Arc::new(OpenWeatherClient::new(config.clone()));
    let service = Arc::new(WeatherService::new(database.clone(), provider));

    // Purge rows from past days before serving, then once a day.
    let deleted = service.run_cleanup().await?;
    tracing::info!(deleted, "Startup cleanup completed");
    spawn_cleanup_task(service.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        database,
        service,
    };

    let app = create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("Server starting on http://0.0.0.0:8080");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Daily retention cleanup. The scheduler lives here at the binary boundary;
/// the service only exposes the callable operation.
fn spawn_cleanup_task(service: Arc<WeatherService<OpenWeatherClient>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
        // The first tick fires immediately; startup already cleaned up.
        interval.tick().await;

        loop {
            interval.tick().await;
            match service.run_cleanup().await {
                Ok(deleted) => tracing::info!(deleted, "Scheduled cleanup completed"),
                Err(e) => tracing::error!(error = %e, "Scheduled cleanup failed"),
            }
        }
    });
}
