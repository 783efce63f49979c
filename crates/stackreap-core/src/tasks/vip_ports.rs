//! User-provided API and Ingress VIP ports
//!
//! These ports belong to the user and survive the teardown. They only lose
//! what the cluster added: its security groups, the floating IP binding and
//! the marker tag.

use super::ports::floating_ips_by_port;
use crate::error::Result;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err, transient};
use async_trait::async_trait;
use stackreap_cloud::{PortQuery, TagQuery, TaggedResource};
use std::collections::HashSet;
use tracing::debug;

pub struct CleanVipsPorts;

#[async_trait]
impl DeletionTask for CleanVipsPorts {
    fn name(&self) -> &'static str {
        "clean-vips-ports"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let tag = ctx.vip_port_tag();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let ports = pending_on_err!(
            task,
            "list VIP ports",
            network
                .list_ports(&PortQuery::Tags(TagQuery::Any(vec![tag.clone()])))
                .await
        );
        if ports.is_empty() {
            return Ok(Completion::Done);
        }

        let cluster_groups: HashSet<String> = pending_on_err!(
            task,
            "list security groups",
            network
                .list_security_groups(&TagQuery::Any(ctx.filter.tags_any()))
                .await
        )
        .into_iter()
        .map(|g| g.id)
        .collect();
        let fip_by_port = pending_on_err!(
            task,
            "list floating ips",
            floating_ips_by_port(network.as_ref()).await
        );

        let mut tally = Tally::new(task, ports.len());
        for port in ports {
            debug!(task, "Updating security groups for port {:?}", port.id);
            let kept: Vec<String> = port
                .security_groups
                .iter()
                .filter(|g| !cluster_groups.contains(*g))
                .cloned()
                .collect();
            pending_on_err!(
                task,
                "update VIP port security groups",
                network.set_port_security_groups(&port.id, &kept).await
            );

            if let Some(fip) = fip_by_port.get(&port.id) {
                debug!(task, "Dissociating floating IP {:?}", fip.id);
                match network.disassociate_floating_ip(&fip.id).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return transient(task, "dissociate VIP floating ip", e),
                }
            }

            debug!(task, "Deleting tag {tag:?} from port {:?}", port.id);
            match network.delete_tag(TaggedResource::Port, &port.id, &tag).await {
                Ok(()) => tally.removed(),
                Err(e) if e.is_not_found() => tally.removed(),
                Err(e) => return transient(task, "untag VIP port", e),
            }
        }
        Ok(tally.finish())
    }
}
