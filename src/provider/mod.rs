pub mod mock;
pub mod openweather;
pub mod types;

use self::types::ForecastResponse;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Provider API error: {0}")]
    ApiError(String),
    #[error("Malformed provider payload: {0}")]
    MalformedPayload(String),
}

/// The single seam to the external forecast provider. Production code uses
/// [`openweather::OpenWeatherClient`]; tests substitute
/// [`mock::MockForecastClient`].
pub trait ForecastProvider: Send + Sync {
    fn fetch(
        &self,
        city: &str,
        lang: &str,
    ) -> impl Future<Output = Result<ForecastResponse, ProviderError>> + Send;
}
