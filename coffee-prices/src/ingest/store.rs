//! Persistence seam for the pipeline
//!
//! The coordinator only needs to read the set of stored dates and issue one
//! conflict-ignoring bulk write. Anything that offers those two operations
//! can back a run.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use super::types::{Price, PriceRecord};
use crate::config::repository::prices;

/// Keyed price store, unique on date
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Every date currently stored
    async fn list_dates(&self) -> Result<HashSet<NaiveDate>>;

    /// Insert all records in one all-or-nothing batch, ignoring rows whose
    /// date already exists. Returns how many rows were inserted.
    async fn bulk_upsert(&self, records: &[PriceRecord]) -> Result<u64>;
}

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqlitePriceStore {
    pool: SqlitePool,
}

impl SqlitePriceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PriceStore for SqlitePriceStore {
    async fn list_dates(&self) -> Result<HashSet<NaiveDate>> {
        Ok(prices::list_dates(&self.pool).await?.into_iter().collect())
    }

    async fn bulk_upsert(&self, records: &[PriceRecord]) -> Result<u64> {
        prices::insert_prices(&self.pool, records).await
    }
}

/// In-memory store with switchable failures
#[derive(Debug, Default)]
pub struct MemoryPriceStore {
    rows: Mutex<BTreeMap<NaiveDate, Price>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_calls: AtomicUsize,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `list_dates` fail from now on
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Make `bulk_upsert` fail from now on
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Number of `bulk_upsert` calls received, failed ones included
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::Relaxed)
    }

    /// Stored rows, oldest first
    pub async fn records(&self) -> Vec<PriceRecord> {
        self.rows
            .lock()
            .await
            .iter()
            .map(|(date, price)| PriceRecord::new(*date, *price))
            .collect()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn list_dates(&self) -> Result<HashSet<NaiveDate>> {
        if self.fail_reads.load(Ordering::Relaxed) {
            bail!("simulated read failure");
        }
        Ok(self.rows.lock().await.keys().copied().collect())
    }

    async fn bulk_upsert(&self, records: &[PriceRecord]) -> Result<u64> {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            bail!("simulated write failure");
        }

        let mut rows = self.rows.lock().await;
        let mut inserted = 0;
        for record in records {
            if !rows.contains_key(&record.date) {
                rows.insert(record.date, record.price);
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

/// Reads through to another store, never writes
///
/// `bulk_upsert` reports how many rows the write would have inserted.
pub struct DryRunStore<'a> {
    inner: &'a dyn PriceStore,
}

impl<'a> DryRunStore<'a> {
    pub fn new(inner: &'a dyn PriceStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PriceStore for DryRunStore<'_> {
    async fn list_dates(&self) -> Result<HashSet<NaiveDate>> {
        self.inner.list_dates().await
    }

    async fn bulk_upsert(&self, records: &[PriceRecord]) -> Result<u64> {
        // Same fail-open read as the coordinator
        let existing = self.inner.list_dates().await.unwrap_or_default();
        let mut seen = HashSet::new();
        let would_insert = records
            .iter()
            .filter(|r| !existing.contains(&r.date) && seen.insert(r.date))
            .count();
        log::info!("Dry run: skipping write of {} rows", would_insert);
        Ok(would_insert as u64)
    }
}
