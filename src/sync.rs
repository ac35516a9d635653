//! Pushes simulated bin state to the external store.
//!
//! Runs at its own cadence, slower than the tick. Only bins that changed
//! since their last successful write are pushed; a failed write keeps the
//! bin dirty so the next run retries it.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::model::{Bin, PointUpdate};
use crate::traits::PointStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub failed: usize,
}

pub struct SyncTask<S> {
    store: S,
    interval_ms: u64,
    last_run_ms: Option<u64>,
    dirty: BTreeSet<String>,
}

impl<S: PointStore> SyncTask<S> {
    pub fn new(store: S, interval_ms: u64) -> Self {
        Self {
            store,
            interval_ms,
            last_run_ms: None,
            dirty: BTreeSet::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    pub fn mark_dirty<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.dirty.extend(ids.into_iter().map(Into::into));
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_run_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Flushes if the cadence has elapsed since the last run.
    pub fn maybe_flush(&mut self, now_ms: u64, bins: &[Bin]) -> Option<SyncReport> {
        if !self.is_due(now_ms) {
            return None;
        }
        Some(self.flush(now_ms, bins))
    }

    /// Writes every dirty bin now.
    pub fn flush(&mut self, now_ms: u64, bins: &[Bin]) -> SyncReport {
        self.last_run_ms = Some(now_ms);
        let mut report = SyncReport::default();
        if self.dirty.is_empty() {
            return report;
        }

        let by_id: HashMap<&str, &Bin> = bins.iter().map(|bin| (bin.id.as_str(), bin)).collect();
        let pending = std::mem::take(&mut self.dirty);

        for id in pending {
            // Bins removed by the data layer since they changed need no write
            let Some(bin) = by_id.get(id.as_str()) else {
                continue;
            };

            match self.store.update_point(&id, &PointUpdate::from_bin(bin)) {
                Ok(()) => report.pushed += 1,
                Err(err) => {
                    warn!(bin = %id, error = %err, "point update failed; will retry");
                    report.failed += 1;
                    self.dirty.insert(id);
                }
            }
        }

        debug!(pushed = report.pushed, failed = report.failed, "synced bin state");
        report
    }
}

/// Keeps the latest update per point. Useful for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    updates: HashMap<String, PointUpdate>,
    writes: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&PointUpdate> {
        self.updates.get(id)
    }

    /// Total successful writes, including overwrites.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PointStore for InMemoryStore {
    fn update_point(&mut self, id: &str, update: &PointUpdate) -> Result<(), StoreError> {
        self.updates.insert(id.to_string(), update.clone());
        self.writes += 1;
        Ok(())
    }
}
