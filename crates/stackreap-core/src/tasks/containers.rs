//! Swift containers
//!
//! Ownership lives in container metadata. Objects are listed page by page
//! and every page is handed to an [`ObjectQueue`]; the container is deleted
//! only once all of its batches finished without error.

use crate::error::{DestroyError, Result};
use crate::objects::ObjectQueue;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, transient};
use async_trait::async_trait;
use stackreap_cloud::ObjectStoreApi;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DeleteContainers;

#[async_trait]
impl DeletionTask for DeleteContainers {
    fn name(&self) -> &'static str {
        "delete-containers"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let store = match ctx.connector.object_store().await {
            Ok(store) => store,
            Err(e) if e.is_endpoint_not_found() => {
                debug!(task, "Skip container deletion because Swift endpoint is not found");
                return Ok(Completion::Done);
            }
            Err(e) => return transient(task, "object store client", e),
        };

        let containers = match store.list_containers().await {
            Ok(containers) => containers,
            Err(e) if e.is_permission_denied() => {
                debug!(task, error = %e, "Skip container deletion because the user lacks the object store operator role");
                return Ok(Completion::Done);
            }
            Err(e) => return transient(task, "list containers", e),
        };

        let mut owned = Vec::new();
        for container in containers {
            let metadata = match store.container_metadata(&container).await {
                Ok(metadata) => metadata,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return transient(task, "container metadata", e),
            };
            if is_owned(ctx, &metadata) {
                owned.push(container);
            }
        }

        let mut tally = Tally::new(task, owned.len());
        for container in owned {
            if let Completion::Pending(left) = delete_objects(task, ctx, &store, &container).await? {
                debug!(task, "Objects left in container {container:?}");
                tally.left(left.join(", "));
                continue;
            }
            debug!(task, "Deleting container {container:?}");
            tally.record("container", &container, store.delete_container(&container).await)?;
        }
        Ok(tally.finish())
    }
}

/// Swift normalizes metadata key case, so keys are compared case-insensitively.
fn is_owned(ctx: &TaskContext, metadata: &HashMap<String, String>) -> bool {
    ctx.filter.tags().iter().any(|(key, value)| {
        metadata
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case(key) && v == value)
    })
}

async fn delete_objects(
    task: &'static str,
    ctx: &TaskContext,
    store: &Arc<dyn ObjectStoreApi>,
    container: &str,
) -> Result<Completion> {
    let mut queue = ObjectQueue::new(Arc::clone(store), container, ctx.settings.workers.objects);
    let mut marker: Option<String> = None;

    loop {
        let page = match store.list_objects(container, marker.as_deref()).await {
            Ok(page) => page,
            Err(e) if e.is_not_found() => {
                debug!(task, "Cannot find container {container:?}. It's probably already been deleted.");
                break;
            }
            Err(e) => return transient(task, "list objects", e),
        };
        let Some(last) = page.last() else {
            break;
        };
        marker = Some(last.clone());
        queue.push(page).await;
    }

    let errors = queue.finish().await?;
    if errors.is_empty() {
        return Ok(Completion::Done);
    }
    let (fatal, errors): (Vec<_>, Vec<_>) = errors.into_iter().partition(|e| e.is_fatal());
    if let Some(source) = fatal.into_iter().next() {
        return Err(DestroyError::Cloud {
            task: task.to_string(),
            source,
        });
    }
    for e in &errors {
        warn!(task, error = %e, "Deleting objects in container {container:?} failed");
    }
    Ok(Completion::pending(format!(
        "container {container}: {} object batches failed",
        errors.len()
    )))
}
