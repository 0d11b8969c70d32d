//! Types for the repack collection and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A repack row as persisted by the collection owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepackRow {
    /// Store primary key.
    pub id: i64,
    /// Release title.
    pub title: String,
    /// When the release was uploaded.
    pub upload_date: DateTime<Utc>,
    /// Direct download / mirror locations.
    pub uris: Vec<String>,
    /// Magnet link, if the release has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
}

/// A repack to be written into a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepack {
    pub title: String,
    pub upload_date: DateTime<Utc>,
    #[serde(default)]
    pub uris: Vec<String>,
    #[serde(default)]
    pub magnet: Option<String>,
}

/// A repack as held by the search index.
///
/// `id` is the ordinal position assigned by the build that produced this
/// record. It changes on every rebuild; use `repack_id` for anything that
/// has to outlive one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepackRecord {
    pub id: usize,
    pub repack_id: i64,
    pub title: String,
    pub upload_date: DateTime<Utc>,
    pub uris: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
}

impl RepackRecord {
    /// Build an index record from a stored row at the given ordinal.
    pub fn from_row(id: usize, row: RepackRow) -> Self {
        Self {
            id,
            repack_id: row.id,
            title: row.title,
            upload_date: row.upload_date,
            uris: row.uris,
            magnet: row.magnet,
        }
    }

    /// All download locations: `uris` in order, then `magnet`, skipping empties.
    pub fn locations(&self) -> Vec<String> {
        self.uris
            .iter()
            .chain(self.magnet.iter())
            .filter(|location| !location.is_empty())
            .cloned()
            .collect()
    }
}

/// One ranked match returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: RepackRecord,
    pub locations: Vec<String>,
}

impl From<&RepackRecord> for SearchResult {
    fn from(record: &RepackRecord) -> Self {
        Self {
            locations: record.locations(),
            record: record.clone(),
        }
    }
}

/// Errors for repack store operations.
#[derive(Debug, Error)]
pub enum RepackStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
