//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use repackhub_core::testing::{MockRepackStore, fixtures};
//!
//! let store = MockRepackStore::new();
//! store.set_repacks(vec![fixtures::repack_row(1, "Dark Souls", 200)]);
//!
//! // Hand it to create_index_service...
//! ```

mod mock_repack_store;

pub use mock_repack_store::MockRepackStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::repack::{NewRepack, RepackRow};

    fn at(upload_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(upload_secs, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A stored repack row with one mirror and a magnet link.
    pub fn repack_row(id: i64, title: &str, upload_secs: i64) -> RepackRow {
        RepackRow {
            id,
            title: title.to_string(),
            upload_date: at(upload_secs),
            uris: vec![format!("https://mirror.example/{}", id)],
            magnet: Some(format!("magnet:?xt=urn:btih:{:040x}", id)),
        }
    }

    /// A repack ready to insert, with one mirror and no magnet.
    pub fn new_repack(title: &str, upload_secs: i64) -> NewRepack {
        NewRepack {
            title: title.to_string(),
            upload_date: at(upload_secs),
            uris: vec![format!("https://mirror.example/{}", upload_secs)],
            magnet: None,
        }
    }
}
