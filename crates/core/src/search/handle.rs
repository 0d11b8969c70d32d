use tokio::sync::{broadcast, mpsc, oneshot};

use super::{IndexCommand, IndexError, IndexEvent, IndexStats, IndexStatus, SearchResponse};

/// Handle for talking to the repack index worker.
///
/// This is cheaply cloneable and can be shared across tasks. Every request
/// gets its own reply channel, so concurrent callers never see each other's
/// results.
#[derive(Clone)]
pub struct RepackIndexHandle {
    tx: mpsc::Sender<IndexCommand>,
    events: broadcast::Sender<IndexEvent>,
}

impl RepackIndexHandle {
    /// Create a new handle from a command sender and the event channel.
    pub fn new(tx: mpsc::Sender<IndexCommand>, events: broadcast::Sender<IndexEvent>) -> Self {
        Self { tx, events }
    }

    async fn send(&self, command: IndexCommand) -> Result<(), IndexError> {
        self.tx.send(command).await.map_err(|e| {
            tracing::error!("Failed to send index command: {}", e);
            IndexError::WorkerUnavailable
        })
    }

    /// Queue a rebuild without waiting for it.
    ///
    /// Completion (or failure) is announced on [`subscribe`](Self::subscribe).
    pub async fn request_index(&self) -> Result<(), IndexError> {
        self.send(IndexCommand::IndexRepacks { reply: None }).await
    }

    /// Try to queue a rebuild without blocking.
    ///
    /// Returns true if the command was queued.
    pub fn try_request_index(&self) -> bool {
        match self.tx.try_send(IndexCommand::IndexRepacks { reply: None }) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to queue index build: {}", e);
                false
            }
        }
    }

    /// Rebuild the index and wait for the outcome.
    pub async fn build_index(&self) -> Result<IndexStats, IndexError> {
        let (reply, rx) = oneshot::channel();
        self.send(IndexCommand::IndexRepacks { reply: Some(reply) })
            .await?;
        rx.await.map_err(|_| IndexError::WorkerUnavailable)?
    }

    /// Search the current index.
    pub async fn search(
        &self,
        request_id: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<SearchResponse, IndexError> {
        let (reply, rx) = oneshot::channel();
        self.send(IndexCommand::Search {
            request_id: request_id.into(),
            query: query.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| IndexError::WorkerUnavailable)?
    }

    /// Current worker status.
    pub async fn status(&self) -> Result<IndexStatus, IndexError> {
        let (reply, rx) = oneshot::channel();
        self.send(IndexCommand::Status { reply }).await?;
        rx.await.map_err(|_| IndexError::WorkerUnavailable)
    }

    /// Receive build notifications sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.events.subscribe()
    }
}
