use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use super::LedgerStore;
use crate::error::LedgerError;
use crate::model::attendance::AttendanceRecord;

/// Serves table snapshots from memory for a bounded window.
///
/// Writes go through to the inner store and replace the cached snapshot, so
/// this process always reads its own writes. Writes from other processes
/// become visible once the snapshot expires.
pub struct CachedLedger {
    inner: Arc<dyn LedgerStore>,
    snapshot: Cache<(), Arc<Vec<AttendanceRecord>>>,
}

impl CachedLedger {
    pub fn new(inner: Arc<dyn LedgerStore>, ttl: Duration) -> Self {
        Self {
            inner,
            snapshot: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }
}

#[async_trait]
impl LedgerStore for CachedLedger {
    async fn read_all(&self) -> Result<Vec<AttendanceRecord>, LedgerError> {
        if let Some(records) = self.snapshot.get(&()).await {
            return Ok(records.as_ref().clone());
        }

        let records = self.inner.read_all().await?;
        self.snapshot.insert((), Arc::new(records.clone())).await;
        Ok(records)
    }

    async fn replace_all(&self, records: Vec<AttendanceRecord>) -> Result<(), LedgerError> {
        match self.inner.replace_all(records.clone()).await {
            Ok(()) => {
                self.snapshot.insert((), Arc::new(records)).await;
                Ok(())
            }
            Err(e) => {
                // The write may or may not have landed.
                self.snapshot.invalidate(&()).await;
                Err(e)
            }
        }
    }
}
