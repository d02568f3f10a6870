//! Background soft-deletion of user URLs.
//!
//! Requests are pushed onto a bounded channel by [`DeletionQueue::enqueue`]
//! and applied one by one by a single worker task. When the channel is full
//! `enqueue` waits, which bounds memory at the cost of stalling the caller.
//! Each request gets exactly one attempt; failures are logged and dropped.

use crate::error::{Result, ShortenerError};
use burrow_core::{DatabaseRepository, UserId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Upper bound on requests taken off the channel per wakeup.
const BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRequest {
    pub user_id: UserId,
    pub short_url: String,
}

/// Producer side of the pipeline. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeletionQueue {
    tx: mpsc::Sender<DeletionRequest>,
}

impl DeletionQueue {
    /// Queues a request, waiting for room if the queue is full.
    pub async fn enqueue(&self, request: DeletionRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| ShortenerError::QueueClosed)
    }
}

pub struct DeletionPipeline;

impl DeletionPipeline {
    /// Spawns the worker and returns the queue feeding it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        repository: Arc<dyn DatabaseRepository>,
        capacity: usize,
    ) -> (DeletionQueue, DeletionWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run(repository, rx, stop_rx));

        (
            DeletionQueue { tx },
            DeletionWorker {
                stop: Some(stop_tx),
                handle,
            },
        )
    }
}

/// Handle to the running worker task.
#[derive(Debug)]
pub struct DeletionWorker {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl DeletionWorker {
    /// Stops intake, applies the requests already queued and waits for the
    /// worker to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            // The worker may already be gone if every queue was dropped.
            let _ = stop.send(());
        }
        if let Err(e) = self.handle.await {
            error!(error = %e, "deletion worker terminated abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run(
    repository: Arc<dyn DatabaseRepository>,
    mut rx: mpsc::Receiver<DeletionRequest>,
    mut stop: oneshot::Receiver<()>,
) {
    debug!("deletion worker started");
    let mut batch = Vec::with_capacity(BATCH_SIZE);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => {
                rx.close();
                break;
            }
            received = rx.recv_many(&mut batch, BATCH_SIZE) => {
                if received == 0 {
                    debug!("deletion queue dropped, worker exiting");
                    return;
                }
                apply(repository.as_ref(), &mut batch).await;
            }
        }
    }

    // Drain whatever was queued before the channel closed.
    while rx.recv_many(&mut batch, BATCH_SIZE).await > 0 {
        apply(repository.as_ref(), &mut batch).await;
    }
    debug!("deletion worker stopped");
}

async fn apply(repository: &dyn DatabaseRepository, batch: &mut Vec<DeletionRequest>) {
    for request in batch.drain(..) {
        match repository
            .mark_deleted(request.user_id, &request.short_url)
            .await
        {
            Ok(true) => {
                debug!(user_id = %request.user_id, short_url = %request.short_url, "marked url deleted")
            }
            Ok(false) => {
                debug!(user_id = %request.user_id, short_url = %request.short_url, "no owned live url to delete")
            }
            Err(e) => {
                warn!(
                    user_id = %request.user_id,
                    short_url = %request.short_url,
                    error = %e,
                    "failed to delete url"
                )
            }
        }
    }
}
