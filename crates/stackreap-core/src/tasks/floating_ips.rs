use crate::error::Result;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err};
use async_trait::async_trait;
use stackreap_cloud::{FloatingIpQuery, TagQuery};
use tracing::debug;

pub struct DeleteFloatingIps;

#[async_trait]
impl DeletionTask for DeleteFloatingIps {
    fn name(&self) -> &'static str {
        "delete-floating-ips"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let query = FloatingIpQuery::Tags(TagQuery::Any(ctx.filter.tags_any()));
        let fips = pending_on_err!(task, "list floating ips", network.list_floating_ips(&query).await);

        let mut tally = Tally::new(task, fips.len());
        for fip in fips {
            debug!(task, "Deleting floating IP {:?}", fip.id);
            tally.record("floating ip", &fip.id, network.delete_floating_ip(&fip.id).await)?;
        }
        Ok(tally.finish())
    }
}
