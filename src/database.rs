use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}

/// One forecast data point for a city at a specific time.
///
/// `id` and `created_at` are assigned by the store on insert and stay `None`
/// on records synthesized in memory (daily summaries are never persisted).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ForecastRecord {
    pub id: Option<Uuid>,
    pub city: String,
    pub forecast_time: NaiveDateTime,
    pub temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub humidity: i32,
    pub description: String,
    pub icon_code: String,
    pub created_at: Option<NaiveDateTime>,
}

/// Insert shape produced by provider ingestion, before identity assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewForecast {
    pub city: String,
    pub forecast_time: NaiveDateTime,
    pub temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub humidity: i32,
    pub description: String,
    pub icon_code: String,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_tables(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS forecast_records (
                id TEXT PRIMARY KEY,
                city TEXT NOT NULL,
                forecast_time TEXT NOT NULL,
                temperature REAL NOT NULL,
                min_temperature REAL NOT NULL,
                max_temperature REAL NOT NULL,
                humidity INTEGER NOT NULL,
                description TEXT NOT NULL,
                icon_code TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_forecast_city_time ON forecast_records(city, forecast_time)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Rows for `city` with `forecast_time` in `[start, end]`, ascending.
    pub async fn find_by_city_between(
        &self,
        city: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<ForecastRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, ForecastRecord>(
            r#"
            SELECT * FROM forecast_records
            WHERE city = $1 AND forecast_time >= $2 AND forecast_time <= $3
            ORDER BY forecast_time ASC
            "#,
        )
        .bind(city)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Bulk insert in one transaction, returning the rows with assigned ids.
    ///
    /// Always inserts: repeated fetches for the same (city, forecast_time)
    /// accumulate duplicate rows until retention cleanup removes them.
    pub async fn save_all(
        &self,
        forecasts: Vec<NewForecast>,
    ) -> Result<Vec<ForecastRecord>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(forecasts.len());

        for forecast in forecasts {
            let id = Uuid::new_v4();
            let now = chrono::Local::now().naive_local();

            let record = sqlx::query_as::<_, ForecastRecord>(
                r#"
                INSERT INTO forecast_records (
                    id, city, forecast_time, temperature, min_temperature,
                    max_temperature, humidity, description, icon_code, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(forecast.city)
            .bind(forecast.forecast_time)
            .bind(forecast.temperature)
            .bind(forecast.min_temperature)
            .bind(forecast.max_temperature)
            .bind(forecast.humidity)
            .bind(forecast.description)
            .bind(forecast.icon_code)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            saved.push(record);
        }

        tx.commit().await?;
        Ok(saved)
    }

    /// Deletes all rows with `forecast_time` strictly before `cutoff`.
    pub async fn delete_older_than(&self, cutoff: NaiveDateTime) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM forecast_records WHERE forecast_time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM forecast_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
