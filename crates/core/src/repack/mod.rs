//! Repack collection - the persisted list of downloadable game releases.
//!
//! The collection is owned by whoever populates it; the search index only
//! reads it through [`RepackStore`].

mod sqlite;
mod types;

pub use sqlite::SqliteRepackStore;
pub use types::*;

/// Read access to the persisted repack collection.
pub trait RepackStore: Send + Sync {
    /// All repacks, ordered by `upload_date` ascending (ties by store id).
    fn list_by_upload_date(&self) -> Result<Vec<RepackRow>, RepackStoreError>;

    /// Number of repacks in the collection.
    fn count(&self) -> Result<u64, RepackStoreError>;
}
