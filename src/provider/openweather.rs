use super::types::ForecastResponse;
use super::{ForecastProvider, ProviderError};
use crate::config::Config;
use crate::database::NewForecast;
use chrono::NaiveDateTime;
use reqwest::Client;
use std::time::Duration;

/// Fetch-time format of the provider's per-entry `dt_txt` field. The value
/// is calendar-local with no offset and is stored as-is.
pub const PROVIDER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct OpenWeatherClient {
    client: Client,
    config: Config,
}

impl OpenWeatherClient {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .user_agent("WeatherForecastServer/1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

impl ForecastProvider for OpenWeatherClient {
    async fn fetch(&self, city: &str, lang: &str) -> Result<ForecastResponse, ProviderError> {
        let url = format!(
            "{}{}",
            self.config.openweather_base_url, self.config.openweather_forecast_path
        );

        // One attempt per request; a failure is fatal for the caller.
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("lang", lang),
                ("units", "metric"),
                ("appid", &self.config.openweather_api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let forecast: ForecastResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;

        Ok(forecast)
    }
}

/// Maps a provider payload to insertable records.
///
/// The city is the provider's canonical resolved name, not the queried
/// string. A provider timestep may list several condition tags; only the
/// first is used. Any unparseable entry fails the whole mapping, so a fetch
/// is ingested completely or not at all.
pub fn map_to_forecasts(response: &ForecastResponse) -> Result<Vec<NewForecast>, ProviderError> {
    response
        .list
        .iter()
        .map(|item| {
            let condition = item.weather.first().ok_or_else(|| {
                ProviderError::MalformedPayload(format!(
                    "forecast entry {} has no weather condition",
                    item.dt_txt
                ))
            })?;

            let forecast_time = NaiveDateTime::parse_from_str(&item.dt_txt, PROVIDER_TIME_FORMAT)
                .map_err(|e| {
                    ProviderError::MalformedPayload(format!(
                        "invalid timestamp {:?}: {}",
                        item.dt_txt, e
                    ))
                })?;

            Ok(NewForecast {
                city: response.city.name.clone(),
                forecast_time,
                temperature: item.main.temp,
                min_temperature: item.main.temp_min,
                max_temperature: item.main.temp_max,
                humidity: item.main.humidity,
                description: condition.description.clone(),
                icon_code: condition.icon.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{mock_item, mock_payload};

    #[test]
    fn map_uses_canonical_city_and_first_condition() {
        let mut item = mock_item("2026-08-10 09:00:00", 20.5, 18.0, 22.0, 65, "Clear sky", "01d");
        item.weather.push(crate::provider::types::WeatherCondition {
            id: 801,
            main: "Clouds".to_string(),
            description: "few clouds".to_string(),
            icon: "02d".to_string(),
        });
        let payload = mock_payload("Berlin", vec![item]);

        let forecasts = map_to_forecasts(&payload).unwrap();

        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].city, "Berlin");
        assert_eq!(forecasts[0].temperature, 20.5);
        assert_eq!(forecasts[0].description, "Clear sky");
        assert_eq!(forecasts[0].icon_code, "01d");
        assert_eq!(
            forecasts[0].forecast_time,
            NaiveDateTime::parse_from_str("2026-08-10 09:00:00", PROVIDER_TIME_FORMAT).unwrap()
        );
    }

    #[test]
    fn map_fails_whole_payload_on_bad_timestamp() {
        let good = mock_item("2026-08-10 09:00:00", 20.5, 18.0, 22.0, 65, "Clear sky", "01d");
        let bad = mock_item("10.08.2026 09:00", 20.5, 18.0, 22.0, 65, "Clear sky", "01d");
        let payload = mock_payload("Berlin", vec![good, bad]);

        let result = map_to_forecasts(&payload);

        assert!(matches!(result, Err(ProviderError::MalformedPayload(_))));
    }

    #[test]
    fn map_fails_on_missing_condition_entry() {
        let mut item = mock_item("2026-08-10 09:00:00", 20.5, 18.0, 22.0, 65, "Clear sky", "01d");
        item.weather.clear();
        let payload = mock_payload("Berlin", vec![item]);

        let result = map_to_forecasts(&payload);

        assert!(matches!(result, Err(ProviderError::MalformedPayload(_))));
    }
}
