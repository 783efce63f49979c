//! Cinder volumes and snapshots
//!
//! Volumes are matched either by name (installer-created) or by the CSI
//! driver's cluster metadata (created for persistent volume claims).

use crate::error::Result;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

pub struct DeleteVolumes;

#[async_trait]
impl DeletionTask for DeleteVolumes {
    fn name(&self) -> &'static str {
        "delete-volumes"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let storage = pending_on_err!(task, "block storage client", ctx.connector.block_storage().await);
        let volumes = pending_on_err!(task, "list volumes", storage.list_volumes().await);

        let cluster_id = ctx.cluster_id();
        let csi_key = &ctx.settings.cluster.cinder_csi_key;
        let mut seen = HashSet::new();
        let owned: Vec<_> = volumes
            .into_iter()
            .filter(|v| {
                v.name.starts_with(cluster_id)
                    || v.metadata.get(csi_key).is_some_and(|id| id == cluster_id)
            })
            .filter(|v| seen.insert(v.id.clone()))
            .collect();

        let mut tally = Tally::new(task, owned.len());
        for volume in owned {
            debug!(task, "Deleting volume {:?}", volume.id);
            tally.record("volume", &volume.id, storage.delete_volume(&volume.id).await)?;
        }
        Ok(tally.finish())
    }
}

pub struct DeleteVolumeSnapshots;

#[async_trait]
impl DeletionTask for DeleteVolumeSnapshots {
    fn name(&self) -> &'static str {
        "delete-volume-snapshots"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let storage = pending_on_err!(task, "block storage client", ctx.connector.block_storage().await);
        let snapshots = pending_on_err!(task, "list volume snapshots", storage.list_volume_snapshots().await);

        let cluster_id = ctx.cluster_id();
        let csi_key = &ctx.settings.cluster.cinder_csi_key;
        let owned: Vec<_> = snapshots
            .into_iter()
            .filter(|s| s.metadata.get(csi_key).is_some_and(|id| id == cluster_id))
            .collect();

        let mut tally = Tally::new(task, owned.len());
        for snapshot in owned {
            debug!(task, "Deleting volume snapshot {:?}", snapshot.id);
            tally.record(
                "volume snapshot",
                &snapshot.id,
                storage.delete_volume_snapshot(&snapshot.id).await,
            )?;
        }
        Ok(tally.finish())
    }
}
