use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};

use super::{
    IndexCommand, IndexError, IndexEvent, IndexState, IndexStats, IndexStatus, RepackIndexHandle,
    SearchResponse,
};
use crate::config::IndexConfig;
use crate::metrics::{
    INDEXED_REPACKS, INDEX_BUILDS, INDEX_BUILD_DURATION, SEARCHES_TOTAL, SEARCH_DURATION,
    SEARCH_RESULTS,
};
use crate::repack::RepackStore;

/// Background task that owns the repack index and serves commands in order.
pub struct RepackIndexWorker {
    rx: mpsc::Receiver<IndexCommand>,
    events: broadcast::Sender<IndexEvent>,
    store: Arc<dyn RepackStore>,
    search_limit: usize,
    state: Option<IndexState>,
    status: IndexStatus,
}

impl RepackIndexWorker {
    /// Create a new worker
    pub fn new(
        rx: mpsc::Receiver<IndexCommand>,
        events: broadcast::Sender<IndexEvent>,
        store: Arc<dyn RepackStore>,
        search_limit: usize,
    ) -> Self {
        Self {
            rx,
            events,
            store,
            search_limit,
            state: None,
            status: IndexStatus::default(),
        }
    }

    /// Run the worker, consuming commands until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!("Repack index worker started");

        while let Some(command) = self.rx.recv().await {
            match command {
                IndexCommand::IndexRepacks { reply } => {
                    let result = self.build().await;
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                IndexCommand::Search {
                    request_id,
                    query,
                    reply,
                } => {
                    let result = self.search(request_id, &query);
                    if reply.send(result).is_err() {
                        tracing::debug!("Search caller went away before the reply");
                    }
                }
                IndexCommand::Status { reply } => {
                    let _ = reply.send(self.status.clone());
                }
            }
        }

        tracing::info!("Repack index worker shutting down");
    }

    async fn build(&mut self) -> Result<IndexStats, IndexError> {
        let started = Instant::now();
        tracing::info!("Building repack index");

        let store = Arc::clone(&self.store);
        let rows = match tokio::task::spawn_blocking(move || store.list_by_upload_date()).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => return Err(self.build_failed(e.to_string())),
            Err(e) => return Err(self.build_failed(format!("store read task failed: {}", e))),
        };

        let state = IndexState::build(rows);
        let elapsed = started.elapsed();
        let stats = IndexStats {
            records: state.len(),
            keys: state.key_count(),
            duration_ms: elapsed.as_millis() as u64,
            built_at: Utc::now(),
        };

        // Swap only once the new state is complete.
        self.state = Some(state);
        self.status = IndexStatus {
            ready: true,
            records: stats.records,
            last_built_at: Some(stats.built_at),
            last_error: None,
        };

        INDEX_BUILDS.with_label_values(&["success"]).inc();
        INDEX_BUILD_DURATION.observe(elapsed.as_secs_f64());
        INDEXED_REPACKS.set(stats.records as i64);

        tracing::info!(
            records = stats.records,
            keys = stats.keys,
            duration_ms = stats.duration_ms,
            "Repack index built"
        );

        let _ = self.events.send(IndexEvent::IndexingComplete {
            stats: stats.clone(),
        });
        Ok(stats)
    }

    fn build_failed(&mut self, error: String) -> IndexError {
        tracing::error!("Failed to build repack index: {}", error);
        INDEX_BUILDS.with_label_values(&["store_error"]).inc();

        self.status.last_error = Some(error.clone());
        let _ = self.events.send(IndexEvent::IndexingFailed {
            error: error.clone(),
        });
        IndexError::Store(error)
    }

    fn search(&self, request_id: String, query: &str) -> Result<SearchResponse, IndexError> {
        let Some(state) = &self.state else {
            tracing::warn!(request_id = %request_id, "Search before the repack index was built");
            SEARCHES_TOTAL.with_label_values(&["not_built"]).inc();
            return Err(IndexError::NotBuilt);
        };

        let timer = SEARCH_DURATION.start_timer();
        let results = state.search(query, self.search_limit);
        timer.observe_duration();

        SEARCHES_TOTAL.with_label_values(&["success"]).inc();
        SEARCH_RESULTS.observe(results.len() as f64);
        tracing::debug!(
            request_id = %request_id,
            query = %query,
            results = results.len(),
            "Repack search"
        );

        Ok(SearchResponse {
            request_id,
            results,
        })
    }
}

/// Create a complete index service
///
/// Returns:
/// - `RepackIndexHandle` - for sending commands (clone this to share across tasks)
/// - `RepackIndexWorker` - spawn this as a background task with `tokio::spawn(worker.run())`
pub fn create_index_service(
    store: Arc<dyn RepackStore>,
    config: &IndexConfig,
) -> (RepackIndexHandle, RepackIndexWorker) {
    let (tx, rx) = mpsc::channel(config.command_buffer);
    let (events, _) = broadcast::channel(config.event_buffer);
    let handle = RepackIndexHandle::new(tx, events.clone());
    let worker = RepackIndexWorker::new(rx, events, store, config.search_limit);
    (handle, worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repack::RepackRow;
    use crate::testing::MockRepackStore;
    use chrono::TimeZone;

    fn row(id: i64, title: &str, upload_secs: i64) -> RepackRow {
        RepackRow {
            id,
            title: title.to_string(),
            upload_date: Utc.timestamp_opt(upload_secs, 0).unwrap(),
            uris: Vec::new(),
            magnet: Some(format!("magnet:?xt=urn:btih:{}", id)),
        }
    }

    fn spawn_service(
        store: Arc<MockRepackStore>,
        config: IndexConfig,
    ) -> (RepackIndexHandle, tokio::task::JoinHandle<()>) {
        let store_dyn: Arc<dyn RepackStore> = Arc::clone(&store) as Arc<dyn RepackStore>;
        let (handle, worker) = create_index_service(store_dyn, &config);
        (handle, tokio::spawn(worker.run()))
    }

    #[tokio::test]
    async fn test_search_before_build_is_not_built() {
        let store = Arc::new(MockRepackStore::new());
        let (handle, _worker) = spawn_service(store, IndexConfig::default());

        let err = handle.search("r1", "anything").await.unwrap_err();
        assert_eq!(err, IndexError::NotBuilt);

        // Worker keeps serving afterwards.
        let status = handle.status().await.unwrap();
        assert!(!status.ready);
    }

    #[tokio::test]
    async fn test_build_then_search() {
        let store = Arc::new(MockRepackStore::new());
        store.set_repacks(vec![row(1, "Hades", 10), row(2, "Hades II", 20)]);
        let (handle, _worker) = spawn_service(Arc::clone(&store), IndexConfig::default());

        let stats = handle.build_index().await.unwrap();
        assert_eq!(stats.records, 2);
        assert!(stats.keys > 0);

        let response = handle.search("r1", "hades").await.unwrap();
        assert_eq!(response.request_id, "r1");
        let titles: Vec<_> = response
            .results
            .iter()
            .map(|r| r.record.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Hades II", "Hades"]);
        assert_eq!(response.results[0].locations, vec!["magnet:?xt=urn:btih:2"]);
    }

    #[tokio::test]
    async fn test_build_emits_complete_event() {
        let store = Arc::new(MockRepackStore::new());
        store.set_repacks(vec![row(1, "Celeste", 1)]);
        let (handle, _worker) = spawn_service(store, IndexConfig::default());
        let mut events = handle.subscribe();

        handle.request_index().await.unwrap();

        match events.recv().await.unwrap() {
            IndexEvent::IndexingComplete { stats } => assert_eq!(stats.records, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_failure_keeps_previous_index() {
        let store = Arc::new(MockRepackStore::new());
        store.set_repacks(vec![row(1, "Celeste", 1)]);
        let (handle, _worker) = spawn_service(Arc::clone(&store), IndexConfig::default());
        let mut events = handle.subscribe();

        handle.build_index().await.unwrap();
        let _ = events.recv().await;

        store.set_unavailable(true);
        let err = handle.build_index().await.unwrap_err();
        assert!(matches!(err, IndexError::Store(_)));
        assert!(matches!(
            events.recv().await.unwrap(),
            IndexEvent::IndexingFailed { .. }
        ));

        let response = handle.search("r", "celeste").await.unwrap();
        assert_eq!(response.results.len(), 1);

        let status = handle.status().await.unwrap();
        assert!(status.ready);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_failed_first_build_stays_not_built() {
        let store = Arc::new(MockRepackStore::new());
        store.set_unavailable(true);
        let (handle, _worker) = spawn_service(Arc::clone(&store), IndexConfig::default());

        assert!(handle.build_index().await.is_err());
        assert_eq!(
            handle.search("r", "x").await.unwrap_err(),
            IndexError::NotBuilt
        );

        store.set_unavailable(false);
        assert!(handle.build_index().await.is_ok());
        assert!(handle.status().await.unwrap().last_error.is_none());
    }

    #[tokio::test]
    async fn test_search_limit_from_config() {
        let store = Arc::new(MockRepackStore::new());
        store.set_repacks((0..10).map(|i| row(i, &format!("Game {}", i), i)).collect());
        let config = IndexConfig {
            search_limit: 3,
            ..IndexConfig::default()
        };
        let (handle, _worker) = spawn_service(store, config);

        handle.build_index().await.unwrap();
        let response = handle.search("r", "game").await.unwrap();
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].record.title, "Game 9");
    }

    #[tokio::test]
    async fn test_search_queued_behind_build_sees_new_index() {
        let store = Arc::new(MockRepackStore::new());
        store.set_repacks(vec![row(1, "Outer Wilds", 1)]);
        let (handle, _worker) = spawn_service(store, IndexConfig::default());

        // Fire-and-forget build followed immediately by a search.
        handle.request_index().await.unwrap();
        let response = handle.search("r", "outer").await.unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn test_worker_exits_when_handles_dropped() {
        let store = Arc::new(MockRepackStore::new());
        let (handle, worker) = spawn_service(store, IndexConfig::default());
        let clone = handle.clone();

        drop(handle);
        assert!(!worker.is_finished());
        drop(clone);

        let result = tokio::time::timeout(tokio::time::Duration::from_secs(1), worker).await;
        assert!(result.is_ok(), "Worker should exit after all handles dropped");
    }
}
