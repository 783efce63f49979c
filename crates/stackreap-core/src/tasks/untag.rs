use crate::error::{DestroyError, Result};
use crate::task::{Completion, DeletionTask, TaskContext, pending_on_err, transient};
use async_trait::async_trait;
use stackreap_cloud::{TagQuery, TaggedResource};
use tracing::{debug, info};

/// Removes the installer's primary-network tag.
///
/// The primary network may be user-provided, in which case it survives the
/// teardown and only loses the tag. Runs last.
pub struct UntagPrimaryNetwork;

#[async_trait]
impl DeletionTask for UntagPrimaryNetwork {
    fn name(&self) -> &'static str {
        "untag-primary-network"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let tag = ctx.primary_network_tag();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let networks = pending_on_err!(
            task,
            "list primary networks",
            network
                .list_networks(&TagQuery::Every(vec![tag.clone()]))
                .await
        );

        let primary = match networks.as_slice() {
            [] => {
                debug!(task, "No network carries tag {tag:?}");
                return Ok(Completion::Done);
            }
            [only] => only,
            many => {
                let ids: Vec<_> = many.iter().map(|n| n.id.as_str()).collect();
                return Err(DestroyError::Ambiguous {
                    task: task.to_string(),
                    message: format!(
                        "expected one network with tag {tag:?}, found {}: {}",
                        many.len(),
                        ids.join(", ")
                    ),
                });
            }
        };

        match network
            .delete_tag(TaggedResource::Network, &primary.id, &tag)
            .await
        {
            Ok(()) => {
                info!(task, "Removed tag {tag:?} from network {:?}", primary.id);
                Ok(Completion::Done)
            }
            Err(e) if e.is_not_found() => Ok(Completion::Done),
            Err(e) => transient(task, "untag primary network", e),
        }
    }
}
