use super::types::*;
use super::{ForecastProvider, ProviderError};
use chrono::{Duration, NaiveDateTime};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned-payload provider for tests. Counts calls so tests can assert
/// whether the pipeline reached for the provider at all.
pub struct MockForecastClient {
    payload: Option<ForecastResponse>,
    calls: AtomicUsize,
}

impl MockForecastClient {
    pub fn new(payload: ForecastResponse) -> Self {
        Self {
            payload: Some(payload),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider that fails every fetch, as when the upstream is down.
    pub fn failing() -> Self {
        Self {
            payload: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ForecastProvider for MockForecastClient {
    async fn fetch(&self, _city: &str, _lang: &str) -> Result<ForecastResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.payload {
            Some(payload) => Ok(payload.clone()),
            None => Err(ProviderError::ApiError("HTTP 503: upstream down".to_string())),
        }
    }
}

pub fn mock_item(
    dt_txt: &str,
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: i32,
    description: &str,
    icon: &str,
) -> ForecastItem {
    ForecastItem {
        dt: 1625097600,
        main: ForecastMain {
            temp,
            feels_like: temp - 0.7,
            temp_min,
            temp_max,
            pressure: 1013.0,
            sea_level: Some(1013.0),
            grnd_level: Some(1010.0),
            humidity,
            temp_kf: Some(0.0),
        },
        weather: vec![WeatherCondition {
            id: 800,
            main: "Clear".to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        }],
        clouds: ForecastClouds { all: 0.0 },
        wind: ForecastWind {
            speed: 3.5,
            deg: 180.0,
            gust: Some(5.0),
        },
        visibility: Some(10000),
        pop: 0.0,
        rain: None,
        snow: None,
        sys: ForecastSys {
            pod: "d".to_string(),
        },
        dt_txt: dt_txt.to_string(),
    }
}

pub fn mock_payload(city: &str, list: Vec<ForecastItem>) -> ForecastResponse {
    ForecastResponse {
        cod: "200".to_string(),
        message: 0.0,
        cnt: list.len() as i32,
        list,
        city: ForecastCity {
            id: 2950159,
            name: city.to_string(),
            coord: ForecastCoord {
                lat: 52.5244,
                lon: 13.4105,
            },
            country: "DE".to_string(),
            population: Some(1_000_000),
            timezone: 7200,
            sunrise: 1625018087,
            sunset: 1625078087,
        },
    }
}

/// A realistic multi-day 3-hour-step payload starting at `start`.
/// Timestamps are deterministic; readings vary per entry.
pub fn generate_mock_payload(city: &str, start: NaiveDateTime, steps: usize) -> ForecastResponse {
    let list = (0..steps)
        .map(|i| {
            let time = start + Duration::hours(3 * i as i64);
            let base_temp = 18.0 + 6.0 * (i as f64 * 0.4).sin() + fastrand::f64();
            let rainy = i % 8 == 5;
            let mut item = mock_item(
                &time.format("%Y-%m-%d %H:%M:%S").to_string(),
                base_temp,
                base_temp - 2.0,
                base_temp + 2.0,
                55 + (i as i32 % 30),
                if rainy { "light rain" } else { "clear sky" },
                if rainy { "10d" } else { "01d" },
            );
            item.dt = time.and_utc().timestamp();
            item.pop = if rainy { 0.6 } else { 0.1 };
            item
        })
        .collect();

    mock_payload(city, list)
}
