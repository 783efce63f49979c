//! Fixed-width worker pool
//!
//! ```text
//!  items ──► [bounded queue] ──┬──► worker 1 ──┐
//!                              ├──► worker 2 ──┼──► [results] ──► caller
//!                              └──► worker N ──┘
//! ```
//!
//! Every item is received by exactly one worker. Workers share the queue's
//! receiving end behind a mutex and stop when the queue is closed and empty.

use crate::error::{DestroyError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    width: usize,
}

impl WorkerPool {
    /// A width of zero is raised to one.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Runs `work` over `items` with at most `width` items in flight.
    ///
    /// Results come back in completion order. A panicking worker is
    /// reported as [`DestroyError::Join`] once the pool has drained.
    pub async fn run<T, R, F, Fut>(&self, task: &str, items: Vec<T>, work: F) -> Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let (item_tx, item_rx) = mpsc::channel::<T>(self.width);
        let (result_tx, mut result_rx) = mpsc::channel::<R>(self.width);
        let item_rx = Arc::new(Mutex::new(item_rx));
        let work = Arc::new(work);

        let mut workers = JoinSet::new();
        for _ in 0..self.width {
            let item_rx = Arc::clone(&item_rx);
            let result_tx = result_tx.clone();
            let work = Arc::clone(&work);
            workers.spawn(async move {
                loop {
                    let next = item_rx.lock().await.recv().await;
                    let Some(item) = next else { break };
                    if result_tx.send(work(item).await).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let feed = async move {
            for item in items {
                if item_tx.send(item).await.is_err() {
                    break;
                }
            }
        };
        let drain = async {
            let mut results = Vec::new();
            while let Some(result) = result_rx.recv().await {
                results.push(result);
            }
            results
        };
        let ((), results) = tokio::join!(feed, drain);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                return Err(DestroyError::Join {
                    task: task.to_string(),
                    message: e.to_string(),
                });
            }
        }

        Ok(results)
    }
}
