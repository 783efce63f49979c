use crate::error::Result;
use crate::filter::{ResourceHandle, filter_objects};
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err};
use async_trait::async_trait;
use tracing::debug;

/// Servers carry ownership in their metadata, which Nova cannot filter on.
pub struct DeleteServers;

#[async_trait]
impl DeletionTask for DeleteServers {
    fn name(&self) -> &'static str {
        "delete-servers"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let compute = pending_on_err!(task, "compute client", ctx.connector.compute().await);
        let servers = pending_on_err!(task, "list servers", compute.list_servers().await);

        let handles = servers
            .into_iter()
            .map(|s| ResourceHandle::new(s.id, s.metadata))
            .collect();
        let owned = filter_objects(handles, &ctx.filter);

        let mut tally = Tally::new(task, owned.len());
        for server in owned {
            debug!(task, "Deleting server {:?}", server.id);
            tally.record("server", &server.id, compute.delete_server(&server.id).await)?;
        }
        Ok(tally.finish())
    }
}

/// Server groups are named after the cluster ID.
pub struct DeleteServerGroups;

#[async_trait]
impl DeletionTask for DeleteServerGroups {
    fn name(&self) -> &'static str {
        "delete-server-groups"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let compute = pending_on_err!(task, "compute client", ctx.connector.compute().await);
        let groups = pending_on_err!(task, "list server groups", compute.list_server_groups().await);

        let owned: Vec<_> = groups
            .into_iter()
            .filter(|g| g.name.starts_with(ctx.cluster_id()))
            .collect();

        let mut tally = Tally::new(task, owned.len());
        for group in owned {
            debug!(task, "Deleting server group {:?}", group.id);
            tally.record(
                "server group",
                &group.id,
                compute.delete_server_group(&group.id).await,
            )?;
        }
        Ok(tally.finish())
    }
}
