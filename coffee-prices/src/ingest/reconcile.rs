//! Dedup against stored dates and persist only new prices

use std::collections::HashSet;

use log::{debug, info, warn};

use super::error::IngestError;
use super::store::PriceStore;
use super::types::{IngestionSummary, PriceRecord};

/// Persist the records whose dates are not stored yet
///
/// A failed read of the stored dates is not fatal: the run proceeds as if
/// nothing were stored and relies on the store ignoring conflicting dates.
/// A failed write is fatal. When every date is already stored no write is
/// issued at all.
pub async fn reconcile(
    store: &dyn PriceStore,
    records: &[PriceRecord],
) -> Result<IngestionSummary, IngestError> {
    let existing = match store.list_dates().await {
        Ok(dates) => {
            info!("Found {} stored price dates", dates.len());
            dates
        }
        Err(e) => {
            warn!("Could not read stored price dates, assuming none: {:#}", e);
            HashSet::new()
        }
    };

    // A date repeated within the sheet is only written once, first row wins
    let mut pending = HashSet::new();
    let to_insert: Vec<PriceRecord> = records
        .iter()
        .filter(|r| !existing.contains(&r.date) && pending.insert(r.date))
        .copied()
        .collect();

    let total = records.len();
    let latest_record = records.last().copied();

    if to_insert.is_empty() {
        info!("No new prices; all {} records already stored", total);
        return Ok(IngestionSummary {
            total_records_parsed: total,
            new_records_inserted: 0,
            existing_records_skipped: total,
            latest_record,
        });
    }

    let written = store
        .bulk_upsert(&to_insert)
        .await
        .map_err(|e| IngestError::Store(format!("{:#}", e)))?;

    if written != to_insert.len() as u64 {
        debug!(
            "Store inserted {} of {} new rows; the rest were already present",
            written,
            to_insert.len()
        );
    }

    info!(
        "Inserted {} new prices, skipped {} existing",
        to_insert.len(),
        total - to_insert.len()
    );

    Ok(IngestionSummary {
        total_records_parsed: total,
        new_records_inserted: to_insert.len(),
        existing_records_skipped: total - to_insert.len(),
        latest_record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::store::MemoryPriceStore;
    use crate::ingest::types::Price;
    use chrono::NaiveDate;

    fn record(d: u32, price: f64) -> PriceRecord {
        PriceRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            Price::new(price).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_inserts_into_empty_store() {
        let store = MemoryPriceStore::new();
        let records = vec![record(1, 250_000.0), record(2, 251_500.0)];

        let summary = reconcile(&store, &records).await.unwrap();
        assert_eq!(summary.total_records_parsed, 2);
        assert_eq!(summary.new_records_inserted, 2);
        assert_eq!(summary.existing_records_skipped, 0);
        assert_eq!(summary.latest_record, Some(record(2, 251_500.0)));
        assert_eq!(store.records().await, records);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let store = MemoryPriceStore::new();
        let records = vec![record(1, 250_000.0), record(2, 251_500.0)];

        reconcile(&store, &records).await.unwrap();
        let before = store.records().await;
        let summary = reconcile(&store, &records).await.unwrap();

        assert_eq!(summary.new_records_inserted, 0);
        assert_eq!(summary.existing_records_skipped, 2);
        assert_eq!(summary.latest_record, Some(record(2, 251_500.0)));
        assert_eq!(store.records().await, before);
        // The fast path never reaches the store's write
        assert_eq!(store.write_calls(), 1);
    }

    #[tokio::test]
    async fn test_only_new_dates_are_written() {
        let store = MemoryPriceStore::new();
        store.bulk_upsert(&[record(1, 250_000.0)]).await.unwrap();

        let summary = reconcile(&store, &[record(1, 1.0), record(2, 2.0), record(3, 3.0)])
            .await
            .unwrap();
        assert_eq!(summary.new_records_inserted, 2);
        assert_eq!(summary.existing_records_skipped, 1);
        assert_eq!(
            store.records().await,
            vec![record(1, 250_000.0), record(2, 2.0), record(3, 3.0)]
        );
    }

    #[tokio::test]
    async fn test_read_failure_fails_open() {
        let store = MemoryPriceStore::new();
        store.bulk_upsert(&[record(1, 250_000.0)]).await.unwrap();
        store.fail_reads(true);

        let summary = reconcile(&store, &[record(1, 1.0), record(2, 2.0)]).await.unwrap();
        assert_eq!(summary.new_records_inserted, 2);
        // The stored price for day 1 is never overwritten
        assert_eq!(store.records().await, vec![record(1, 250_000.0), record(2, 2.0)]);
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal() {
        let store = MemoryPriceStore::new();
        store.fail_writes(true);

        let err = reconcile(&store, &[record(1, 1.0)]).await.unwrap_err();
        assert_eq!(err, IngestError::Store("simulated write failure".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_dates_in_sheet_count_once() {
        let store = MemoryPriceStore::new();
        let summary = reconcile(&store, &[record(1, 1.0), record(1, 2.0), record(2, 3.0)])
            .await
            .unwrap();
        assert_eq!(summary.new_records_inserted, 2);
        assert_eq!(summary.existing_records_skipped, 1);
        assert_eq!(store.records().await, vec![record(1, 1.0), record(2, 3.0)]);
    }
}
