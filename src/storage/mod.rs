//! Persistence layer for forecast overrides.
//!
//! Operator-pinned (min, max) temperatures keyed by (city, date), stored in
//! SQLite through an sqlx pool. Records never expire; an upsert replaces
//! both temperatures wholesale.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};

use crate::types::{ForecastWeather, OverrideRecord, WeatherError};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS forecast_overrides (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    city            TEXT    NOT NULL,
    date            TEXT    NOT NULL,
    min_temperature REAL    NOT NULL,
    max_temperature REAL    NOT NULL,
    UNIQUE (city, date)
)";

/// Dates are stored as `YYYY-MM-DD` text.
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, FromRow)]
struct OverrideRow {
    city: String,
    date: String,
    min_temperature: f64,
    max_temperature: f64,
}

impl TryFrom<OverrideRow> for OverrideRecord {
    type Error = WeatherError;

    fn try_from(row: OverrideRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT).map_err(|e| {
            WeatherError::Storage(format!("Corrupt override date '{}': {e}", row.date))
        })?;
        Ok(OverrideRecord {
            city: row.city,
            date,
            min_temperature: row.min_temperature,
            max_temperature: row.max_temperature,
        })
    }
}

fn storage_err(err: sqlx::Error) -> WeatherError {
    WeatherError::Storage(err.to_string())
}

/// Override store backed by SQLite.
#[derive(Clone)]
pub struct OverrideStore {
    pool: SqlitePool,
}

impl OverrideStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open override database: {url}"))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url, "Override store ready");
        Ok(store)
    }

    /// Private in-memory database. One connection, so every query sees
    /// the same data.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory override database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Close the pool. Every later query fails with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Override store closed");
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .context("Failed to create forecast_overrides table")?;
        Ok(())
    }

    /// Exact-match lookup. `Ok(None)` means no override is set.
    pub async fn get(&self, city: &str, date: NaiveDate) -> Result<Option<ForecastWeather>, WeatherError> {
        let row: Option<(f64, f64)> = sqlx::query_as(
            "SELECT min_temperature, max_temperature FROM forecast_overrides \
             WHERE city = ? AND date = ?",
        )
        .bind(city)
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        debug!(city, %date, hit = row.is_some(), "Override lookup");
        Ok(row.map(|(min_temperature, max_temperature)| ForecastWeather {
            min_temperature,
            max_temperature,
        }))
    }

    /// Create or replace the override for (city, date).
    /// Returns the stored record and whether it was newly created.
    pub async fn upsert(
        &self,
        city: &str,
        date: NaiveDate,
        min_temperature: f64,
        max_temperature: f64,
    ) -> Result<(OverrideRecord, bool), WeatherError> {
        let date_key = date.format(DATE_FORMAT).to_string();
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let updated = sqlx::query(
            "UPDATE forecast_overrides SET min_temperature = ?, max_temperature = ? \
             WHERE city = ? AND date = ?",
        )
        .bind(min_temperature)
        .bind(max_temperature)
        .bind(city)
        .bind(&date_key)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?
        .rows_affected();

        let created = updated == 0;
        if created {
            sqlx::query(
                "INSERT INTO forecast_overrides (city, date, min_temperature, max_temperature) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(city)
            .bind(&date_key)
            .bind(min_temperature)
            .bind(max_temperature)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;

        info!(city, %date, min_temperature, max_temperature, created, "Override saved");
        Ok((
            OverrideRecord {
                city: city.to_string(),
                date,
                min_temperature,
                max_temperature,
            },
            created,
        ))
    }

    /// Remove the override for (city, date). Returns whether one existed.
    pub async fn delete(&self, city: &str, date: NaiveDate) -> Result<bool, WeatherError> {
        let removed = sqlx::query("DELETE FROM forecast_overrides WHERE city = ? AND date = ?")
            .bind(city)
            .bind(date.format(DATE_FORMAT).to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?
            .rows_affected();

        info!(city, %date, removed, "Override delete");
        Ok(removed > 0)
    }

    /// All overrides, optionally for one city, ordered by city then date.
    pub async fn list(&self, city: Option<&str>) -> Result<Vec<OverrideRecord>, WeatherError> {
        let rows: Vec<OverrideRow> = match city {
            Some(city) => {
                sqlx::query_as(
                    "SELECT city, date, min_temperature, max_temperature FROM forecast_overrides \
                     WHERE city = ? ORDER BY city, date",
                )
                .bind(city)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT city, date, min_temperature, max_temperature FROM forecast_overrides \
                     ORDER BY city, date",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(storage_err)?;

        rows.into_iter().map(OverrideRecord::try_from).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
