use crate::error::Result;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err, transient};
use async_trait::async_trait;
use stackreap_cloud::{NetworkApi, TagQuery, TrunkQuery};
use tracing::{debug, warn};

pub struct DeleteTrunks;

#[async_trait]
impl DeletionTask for DeleteTrunks {
    fn name(&self) -> &'static str {
        "delete-trunks"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);

        let query = TrunkQuery::Tags(TagQuery::Any(ctx.filter.tags_any()));
        let trunks = match network.list_trunks(&query).await {
            Ok(trunks) => trunks,
            Err(e) if e.is_not_found() => {
                debug!(task, "Skip trunk deletion because the cloud doesn't support trunk ports");
                return Ok(Completion::Done);
            }
            Err(e) => return transient(task, "list trunks", e),
        };

        let mut tally = Tally::new(task, trunks.len());
        for trunk in trunks {
            debug!(task, "Deleting trunk {:?}", trunk.id);
            tally.record("trunk", &trunk.id, network.delete_trunk(&trunk.id).await)?;
        }
        Ok(tally.finish())
    }
}

/// Best effort removal of the trunk whose parent is `port_id`.
///
/// The port delete itself is left to the next pass of the calling task.
pub(crate) async fn delete_associated_trunk(task: &'static str, network: &dyn NetworkApi, port_id: &str) {
    let trunks = match network.list_trunks(&TrunkQuery::Port(port_id.to_string())).await {
        Ok(trunks) => trunks,
        Err(e) if e.is_not_found() => return,
        Err(e) => {
            warn!(task, port_id, error = %e, "Listing trunks of port failed");
            return;
        }
    };

    for trunk in trunks {
        debug!(task, port_id, "Deleting trunk {:?}", trunk.id);
        match network.delete_trunk(&trunk.id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(task, "Cannot find trunk {:?}. It's probably already been deleted.", trunk.id);
            }
            Err(e) => debug!(task, error = %e, "Deleting trunk {:?} failed", trunk.id),
        }
    }
}
