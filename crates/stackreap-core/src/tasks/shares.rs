use crate::error::Result;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err, transient};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Manila shares created by the CSI driver, snapshots first.
pub struct DeleteShares;

#[async_trait]
impl DeletionTask for DeleteShares {
    fn name(&self) -> &'static str {
        "delete-shares"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let shares_api = match ctx.connector.shared_file_system().await {
            Ok(api) => api,
            Err(e) if e.is_endpoint_not_found() => {
                debug!(task, "Skip share deletion because Manila endpoint is not found");
                return Ok(Completion::Done);
            }
            Err(e) => return transient(task, "share client", e),
        };

        let metadata = HashMap::from([(
            ctx.settings.cluster.manila_csi_key.clone(),
            ctx.cluster_id().to_string(),
        )]);
        let shares = pending_on_err!(task, "list shares", shares_api.list_shares(&metadata).await);

        let mut tally = Tally::new(task, shares.len());
        for share in shares {
            let snapshots = pending_on_err!(
                task,
                "list share snapshots",
                shares_api.list_share_snapshots(&share.id).await
            );

            let mut snapshot_tally = Tally::new(task, snapshots.len());
            for snapshot in snapshots {
                debug!(task, "Deleting share snapshot {:?}", snapshot.id);
                snapshot_tally.record(
                    "share snapshot",
                    &snapshot.id,
                    shares_api.delete_share_snapshot(&snapshot.id).await,
                )?;
            }
            if let Completion::Pending(left) = snapshot_tally.finish() {
                debug!(task, "Share {:?} still has snapshots", share.id);
                return Ok(Completion::Pending(left));
            }

            debug!(task, "Deleting share {:?}", share.id);
            tally.record("share", &share.id, shares_api.delete_share(&share.id).await)?;
        }
        Ok(tally.finish())
    }
}
