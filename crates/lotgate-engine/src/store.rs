//! # Batch Store
//!
//! A table of batches, each behind its own mutex. The table lock is held
//! only to look up or insert an entry; all work on one batch happens under
//! that batch's mutex, so operations on distinct batches run in parallel.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use lotgate_core::{BatchId, Rejection};
use lotgate_state::Batch;

/// Shared handle to one batch.
pub type BatchCell = Arc<Mutex<Batch>>;

/// Thread-safe batch table. Batches are never removed.
#[derive(Debug, Default)]
pub struct BatchStore {
    batches: RwLock<BTreeMap<BatchId, BatchCell>>,
}

impl BatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a batch, or `UnknownBatch`.
    pub fn cell(&self, batch_id: &BatchId) -> Result<BatchCell, Rejection> {
        self.batches
            .read()
            .get(batch_id)
            .cloned()
            .ok_or_else(|| Rejection::UnknownBatch {
                batch_id: batch_id.clone(),
            })
    }

    /// Insert a batch built by `build`, holding the table write lock
    /// throughout so that concurrent inserts of the same id cannot both
    /// succeed.
    ///
    /// Returns `DuplicateBatch` without calling `build` if the id exists.
    /// If `build` fails, nothing is inserted.
    pub fn insert_new<E>(
        &self,
        batch_id: &BatchId,
        build: impl FnOnce() -> Result<Batch, E>,
    ) -> Result<Batch, E>
    where
        E: From<Rejection>,
    {
        let mut batches = self.batches.write();
        if batches.contains_key(batch_id) {
            return Err(Rejection::DuplicateBatch {
                batch_id: batch_id.clone(),
            }
            .into());
        }
        let batch = build()?;
        batches.insert(batch_id.clone(), Arc::new(Mutex::new(batch.clone())));
        Ok(batch)
    }

    /// A copy of one batch.
    pub fn get(&self, batch_id: &BatchId) -> Option<Batch> {
        let cell = self.batches.read().get(batch_id).cloned()?;
        let batch = cell.lock().clone();
        Some(batch)
    }

    /// Copies of all batches, ordered by id.
    pub fn list(&self) -> Vec<Batch> {
        let cells: Vec<BatchCell> = self.batches.read().values().cloned().collect();
        cells.iter().map(|cell| cell.lock().clone()).collect()
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        self.batches.read().len()
    }

    /// Whether no batch was ever scheduled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
