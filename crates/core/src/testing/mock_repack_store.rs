//! Mock repack store for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::repack::{RepackRow, RepackStore, RepackStoreError};

/// Mock implementation of the RepackStore trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable set of rows (sorted like a real store)
/// - Simulate an unreachable store
/// - Count reads for assertions
///
/// # Example
///
/// ```rust,ignore
/// use repackhub_core::testing::{MockRepackStore, fixtures};
///
/// let store = MockRepackStore::new();
/// store.set_repacks(vec![fixtures::repack_row(1, "Hades", 100)]);
/// store.set_unavailable(true); // next list_by_upload_date fails
/// ```
#[derive(Debug, Default)]
pub struct MockRepackStore {
    rows: Mutex<Vec<RepackRow>>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl MockRepackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection contents.
    pub fn set_repacks(&self, rows: Vec<RepackRow>) {
        *self.rows.lock().unwrap() = rows;
    }

    /// Make every read fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `list_by_upload_date` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl RepackStore for MockRepackStore {
    fn list_by_upload_date(&self) -> Result<Vec<RepackRow>, RepackStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepackStoreError::Database(
                "mock store unavailable".to_string(),
            ));
        }

        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| a.upload_date.cmp(&b.upload_date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn count(&self) -> Result<u64, RepackStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepackStoreError::Database(
                "mock store unavailable".to_string(),
            ));
        }
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}
