use crate::error::Result;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err};
use async_trait::async_trait;
use stackreap_cloud::TagQuery;
use tracing::debug;

pub struct DeleteSecurityGroups;

#[async_trait]
impl DeletionTask for DeleteSecurityGroups {
    fn name(&self) -> &'static str {
        "delete-security-groups"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let groups = pending_on_err!(
            task,
            "list security groups",
            network
                .list_security_groups(&TagQuery::Any(ctx.filter.tags_any()))
                .await
        );

        let mut tally = Tally::new(task, groups.len());
        for group in groups {
            debug!(task, "Deleting security group {:?}", group.id);
            tally.record(
                "security group",
                &group.id,
                network.delete_security_group(&group.id).await,
            )?;
        }
        Ok(tally.finish())
    }
}
