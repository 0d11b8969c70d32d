//! Messages and results exchanged with the repack index worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::repack::SearchResult;

/// Summary of a completed index build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of repacks indexed.
    pub records: usize,
    /// Distinct keys in the inverted index.
    pub keys: usize,
    /// Wall time spent reading the store and building.
    pub duration_ms: u64,
    pub built_at: DateTime<Utc>,
}

/// Snapshot of the worker's state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Whether a build has ever completed.
    pub ready: bool,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_built_at: Option<DateTime<Utc>>,
    /// Error of the most recent failed build, cleared by the next success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Reply to one search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub request_id: String,
    pub results: Vec<SearchResult>,
}

/// Notifications broadcast by the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexEvent {
    /// A build finished and the new index is live.
    IndexingComplete { stats: IndexStats },
    /// A build could not read the store; the previous index is still live.
    IndexingFailed { error: String },
}

/// Errors returned by the index service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Repack index has not been built yet")]
    NotBuilt,

    #[error("Repack store unavailable: {0}")]
    Store(String),

    #[error("Repack index worker is not running")]
    WorkerUnavailable,
}

/// Commands accepted by the worker.
#[derive(Debug)]
pub enum IndexCommand {
    /// Rebuild from the store. `reply` is `None` for fire-and-forget builds.
    IndexRepacks {
        reply: Option<oneshot::Sender<Result<IndexStats, IndexError>>>,
    },
    Search {
        request_id: String,
        query: String,
        reply: oneshot::Sender<Result<SearchResponse, IndexError>>,
    },
    Status {
        reply: oneshot::Sender<IndexStatus>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tags() {
        let event = IndexEvent::IndexingFailed {
            error: "disk gone".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "indexing_failed");
        assert_eq!(json["error"], "disk gone");

        let event = IndexEvent::IndexingComplete {
            stats: IndexStats {
                records: 2,
                keys: 10,
                duration_ms: 3,
                built_at: Utc::now(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "indexing_complete");
        assert_eq!(json["stats"]["records"], 2);
    }

    #[test]
    fn test_status_skips_empty_fields() {
        let json = serde_json::to_string(&IndexStatus::default()).unwrap();
        assert!(json.contains("\"ready\":false"));
        assert!(!json.contains("last_built_at"));
        assert!(!json.contains("last_error"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            IndexError::NotBuilt.to_string(),
            "Repack index has not been built yet"
        );
        assert_eq!(
            IndexError::Store("locked".to_string()).to_string(),
            "Repack store unavailable: locked"
        );
    }
}
