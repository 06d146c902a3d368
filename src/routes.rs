use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::Config,
    database::{Database, ForecastRecord},
    provider::openweather::OpenWeatherClient,
    service::{WeatherError, WeatherService},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<Database>,
    pub service: Arc<WeatherService<OpenWeatherClient>>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub status: String,
    pub record_count: Option<i64>,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.database.count().await {
        Ok(count) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "UP".to_string(),
                timestamp: chrono::Utc::now(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                database: DatabaseHealth {
                    status: "UP".to_string(),
                    record_count: Some(count),
                },
            }),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "DOWN".to_string(),
                    timestamp: chrono::Utc::now(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    database: DatabaseHealth {
                        status: "DOWN".to_string(),
                        record_count: None,
                    },
                }),
            )
        }
    }
}

/// Tiered forecast for a city: 3-hourly rows for the first day, one summary
/// per later day. Fetches from the provider when the cached rows are stale.
pub async fn get_weather_for_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<Vec<ForecastRecord>>, StatusCode> {
    let lang = params.lang.as_deref().unwrap_or(&state.config.default_lang);

    match state.service.get_transformed_forecast(&city, lang).await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            tracing::error!("Forecast request for {} failed: {}", city, e);
            Err(error_status(&e))
        }
    }
}

/// Raw stored rows for a city and date range. Never contacts the provider.
pub async fn get_weather_for_city_in_range(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<Vec<ForecastRecord>>, StatusCode> {
    let start = params.start_date.and_time(NaiveTime::MIN);
    let end = params
        .end_date
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .unwrap_or_else(|| params.end_date.and_time(NaiveTime::MIN));

    match state.service.get_forecast_in_range(&city, start, end).await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            tracing::error!("Range request for {} failed: {}", city, e);
            Err(error_status(&e))
        }
    }
}

fn error_status(error: &WeatherError) -> StatusCode {
    match error {
        WeatherError::Provider(_) => StatusCode::BAD_GATEWAY,
        WeatherError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/weather/:city", get(get_weather_for_city))
        .route("/api/weather/:city/range", get(get_weather_for_city_in_range))
        .with_state(state)
}
