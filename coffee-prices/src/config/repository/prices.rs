//! Historical price repository

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::ingest::{Price, PriceRecord};

/// Get every stored price date, oldest first
pub async fn list_dates(pool: &SqlitePool) -> Result<Vec<NaiveDate>> {
    let rows: Vec<(NaiveDate,)> = sqlx::query_as(
        "SELECT date FROM historical_prices ORDER BY date ASC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list stored price dates")?;

    Ok(rows.into_iter().map(|(date,)| date).collect())
}

/// Insert prices, leaving rows whose date already exists untouched
///
/// Runs in one transaction so the batch lands completely or not at all.
/// Returns the number of rows actually inserted.
pub async fn insert_prices(pool: &SqlitePool, records: &[PriceRecord]) -> Result<u64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let mut inserted = 0;
    for record in records {
        let result = sqlx::query(
            "INSERT INTO historical_prices (date, fnc_price)
             VALUES (?, ?)
             ON CONFLICT(date)
             DO NOTHING",
        )
        .bind(record.date)
        .bind(record.price.value())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert price for {}", record.date))?;

        inserted += result.rows_affected();
    }

    tx.commit().await.context("Failed to commit transaction")?;

    Ok(inserted)
}

/// Get the most recent stored price
pub async fn latest_price(pool: &SqlitePool) -> Result<Option<PriceRecord>> {
    let row: Option<(NaiveDate, f64)> = sqlx::query_as(
        "SELECT date, fnc_price FROM historical_prices
         ORDER BY date DESC
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("Failed to get latest price")?;

    row.map(into_record).transpose()
}

/// Get up to `limit` stored prices, newest first
pub async fn recent_prices(pool: &SqlitePool, limit: u32) -> Result<Vec<PriceRecord>> {
    let rows: Vec<(NaiveDate, f64)> = sqlx::query_as(
        "SELECT date, fnc_price FROM historical_prices
         ORDER BY date DESC
         LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
    .context("Failed to get recent prices")?;

    rows.into_iter().map(into_record).collect()
}

fn into_record((date, value): (NaiveDate, f64)) -> Result<PriceRecord> {
    let price = Price::new(value)
        .with_context(|| format!("Stored price for {} is not positive: {}", date, value))?;
    Ok(PriceRecord::new(date, price))
}
