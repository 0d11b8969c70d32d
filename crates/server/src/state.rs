use std::sync::Arc;

use tokio::sync::watch;

use repackhub_core::{Config, RepackIndexHandle, RepackStore};

/// Shared application state
pub struct AppState {
    config: Config,
    index: RepackIndexHandle,
    store: Arc<dyn RepackStore>,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config, index: RepackIndexHandle, store: Arc<dyn RepackStore>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            index,
            store,
            shutdown,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &RepackIndexHandle {
        &self.index
    }

    pub fn store(&self) -> &dyn RepackStore {
        self.store.as_ref()
    }

    /// Tell long-lived connections to close.
    ///
    /// WebSocket tasks outlive `axum::serve`'s graceful shutdown and each
    /// holds this state (and so an index handle); they must let go before
    /// the index worker can stop.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Receiver that flips to `true` once [`begin_shutdown`](Self::begin_shutdown) is called.
    pub fn shutdown_listener(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repackhub_core::{create_index_service, testing::MockRepackStore, IndexConfig};

    fn state() -> AppState {
        let store: Arc<dyn RepackStore> = Arc::new(MockRepackStore::new());
        let (handle, _worker) = create_index_service(Arc::clone(&store), &IndexConfig::default());
        AppState::new(Config::default(), handle, store)
    }

    #[tokio::test]
    async fn test_shutdown_listener_sees_flag() {
        let state = state();
        let mut listener = state.shutdown_listener();
        assert!(!*listener.borrow());

        state.begin_shutdown();
        assert!(listener.wait_for(|stopping| *stopping).await.is_ok());
    }

    #[tokio::test]
    async fn test_late_listener_sees_flag() {
        let state = state();
        state.begin_shutdown();

        let mut listener = state.shutdown_listener();
        assert!(*listener.borrow_and_update());
        assert!(listener.wait_for(|stopping| *stopping).await.is_ok());
    }
}
