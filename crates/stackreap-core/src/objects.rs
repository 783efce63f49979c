//! Bounded bulk deletion of storage objects
//!
//! Each queued batch is one unit of work. A unit calls the bulk-delete
//! operation, drops the objects the service reported as handled from the
//! front of the batch and calls again until nothing is left. Services whose
//! bulk limit is smaller than the listing page size handle only a prefix of
//! every request, so the loop tolerates partial progress.

use crate::error::{DestroyError, Result};
use stackreap_cloud::{CloudError, ObjectStoreApi};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::debug;

/// Deletes one batch completely.
///
/// Objects the service refused to delete are reported as an error once the
/// batch has been drained. A call that handles nothing is an error as well;
/// sending the same batch again would not change the outcome.
pub async fn delete_batch(
    store: &dyn ObjectStoreApi,
    container: &str,
    mut batch: Vec<String>,
) -> std::result::Result<(), CloudError> {
    let mut refused = Vec::new();

    while !batch.is_empty() {
        debug!(container, "Initiating bulk deletion of {} objects", batch.len());
        let result = store.bulk_delete(container, &batch).await?;
        refused.extend(result.errors.iter().cloned());

        let processed = result.processed() + result.errors.len();
        if processed == 0 {
            return Err(CloudError::CommandFailed(format!(
                "bulk delete in container {container:?} made no progress with {} objects left",
                batch.len()
            )));
        }
        batch.drain(..processed.min(batch.len()));
    }

    match refused.first() {
        None => Ok(()),
        Some((name, reason)) => Err(CloudError::CommandFailed(format!(
            "cannot delete {} objects in container {container:?}, first {name:?}: {reason}",
            refused.len()
        ))),
    }
}

/// Runs batch deletions for one container with bounded concurrency.
///
/// Errors of all units end up in a single channel drained by [`finish`](Self::finish).
pub struct ObjectQueue {
    store: Arc<dyn ObjectStoreApi>,
    container: Arc<str>,
    permits: Arc<Semaphore>,
    units: JoinSet<()>,
    errors_tx: mpsc::UnboundedSender<CloudError>,
    errors_rx: mpsc::UnboundedReceiver<CloudError>,
}

impl ObjectQueue {
    pub fn new(store: Arc<dyn ObjectStoreApi>, container: &str, width: usize) -> Self {
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        Self {
            store,
            container: Arc::from(container),
            permits: Arc::new(Semaphore::new(width.max(1))),
            units: JoinSet::new(),
            errors_tx,
            errors_rx,
        }
    }

    /// Queues a batch, waiting while `width` batches are already in flight.
    pub async fn push(&mut self, batch: Vec<String>) {
        if batch.is_empty() {
            return;
        }
        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return;
        };

        let store = Arc::clone(&self.store);
        let container = Arc::clone(&self.container);
        let errors = self.errors_tx.clone();
        self.units.spawn(async move {
            let _permit = permit;
            if let Err(e) = delete_batch(store.as_ref(), &container, batch).await {
                let _ = errors.send(e);
            }
        });
    }

    /// Waits for every queued batch and returns the aggregated errors.
    pub async fn finish(mut self) -> Result<Vec<CloudError>> {
        let mut panicked = None;
        while let Some(joined) = self.units.join_next().await {
            if let Err(e) = joined {
                panicked.get_or_insert_with(|| e.to_string());
            }
        }
        if let Some(message) = panicked {
            return Err(DestroyError::Join {
                task: format!("objects in {}", self.container),
                message,
            });
        }

        drop(self.errors_tx);
        let mut errors = Vec::new();
        while let Some(e) = self.errors_rx.recv().await {
            errors.push(e);
        }
        Ok(errors)
    }
}
