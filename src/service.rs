use crate::database::{Database, DatabaseError, ForecastRecord};
use crate::provider::openweather::map_to_forecasts;
use crate::provider::{ForecastProvider, ProviderError};
use crate::transform::transform_forecasts;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use thiserror::Error;

/// Forward-looking window, in days, used both as the store query bound and
/// as the coverage a cached forecast must span to be served without a
/// provider refresh.
const FORECAST_WINDOW_DAYS: i64 = 5;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error(transparent)]
    Store(#[from] DatabaseError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Outcome of the freshness decision for a city's cached rows.
#[derive(Debug)]
pub enum Freshness {
    Sufficient(Vec<ForecastRecord>),
    Insufficient,
}

pub struct WeatherService<P> {
    database: Arc<Database>,
    provider: Arc<P>,
}

impl<P: ForecastProvider> WeatherService<P> {
    pub fn new(database: Arc<Database>, provider: Arc<P>) -> Self {
        Self { database, provider }
    }

    /// Decides whether stored rows can answer a request for `city`.
    ///
    /// The candidate set is rows with a forecast time between now and five
    /// days out. It is sufficient only when non-empty and spanning at least
    /// five distinct calendar dates; a single day of 3-hourly rows is not a
    /// usable multi-day forecast. A store failure propagates as an error,
    /// never as an insufficient verdict.
    pub async fn freshness(&self, city: &str) -> Result<Freshness, WeatherError> {
        let now = Local::now().naive_local();
        let records = self
            .database
            .find_by_city_between(city, now, now + Duration::days(FORECAST_WINDOW_DAYS))
            .await?;

        let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.forecast_time.date()).collect();
        dates.sort_unstable();
        dates.dedup();

        if records.is_empty() || (dates.len() as i64) < FORECAST_WINDOW_DAYS {
            Ok(Freshness::Insufficient)
        } else {
            Ok(Freshness::Sufficient(records))
        }
    }

    /// Fetches the provider forecast for `(city, lang)`, maps it, and
    /// persists the whole batch in one bulk save. Returns the persisted
    /// records with their assigned identities. Every call writes new rows;
    /// rows already covering the same slots are left in place.
    pub async fn fetch_and_persist(
        &self,
        city: &str,
        lang: &str,
    ) -> Result<Vec<ForecastRecord>, WeatherError> {
        let payload = self.provider.fetch(city, lang).await?;
        let forecasts = map_to_forecasts(&payload)?;
        let saved = self.database.save_all(forecasts).await?;

        tracing::info!(city, count = saved.len(), "Persisted provider forecast");
        Ok(saved)
    }

    /// Serves the cached candidate set when fresh enough, otherwise fetches
    /// from the provider. A freshly fetched set replaces the stale rows in
    /// the response; the stale rows themselves stay until cleanup.
    pub async fn get_or_fetch(
        &self,
        city: &str,
        lang: &str,
    ) -> Result<Vec<ForecastRecord>, WeatherError> {
        match self.freshness(city).await? {
            Freshness::Sufficient(records) => Ok(records),
            Freshness::Insufficient => self.fetch_and_persist(city, lang).await,
        }
    }

    /// Full pipeline: decide, fetch if needed, then reshape into the tiered
    /// view (3-hourly rows for the first day, one summary per later day).
    pub async fn get_transformed_forecast(
        &self,
        city: &str,
        lang: &str,
    ) -> Result<Vec<ForecastRecord>, WeatherError> {
        let records = self.get_or_fetch(city, lang).await?;
        Ok(transform_forecasts(records))
    }

    /// Raw store read for an explicit time range. Never triggers a provider
    /// fetch and applies no transformation, even on an empty result.
    pub async fn get_forecast_in_range(
        &self,
        city: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<ForecastRecord>, WeatherError> {
        Ok(self.database.find_by_city_between(city, start, end).await?)
    }

    /// Deletes every record whose forecast time precedes the start of the
    /// current day, returning the number of rows removed. Safe to invoke
    /// repeatedly; a second run with no new old rows deletes nothing.
    pub async fn run_cleanup(&self) -> Result<u64, WeatherError> {
        let start_of_day = Local::now().date_naive().and_time(NaiveTime::MIN);
        Ok(self.database.delete_older_than(start_of_day).await?)
    }
}
