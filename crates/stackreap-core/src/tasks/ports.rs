//! Port deletion through a worker pool
//!
//! Each worker frees one port from everything that would block its
//! deletion: the floating IP bound to it, its security groups and, when the
//! delete is refused, the trunk it is the parent of.

use super::trunks::delete_associated_trunk;
use crate::error::{DestroyError, Result};
use crate::pool::WorkerPool;
use crate::task::{Completion, DeletionTask, TaskContext, pending_on_err};
use async_trait::async_trait;
use stackreap_cloud::{
    CloudError, FloatingIp, FloatingIpQuery, NetworkApi, Port, PortQuery, SecurityGroup, TagQuery,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DeletePorts;

#[async_trait]
impl DeletionTask for DeletePorts {
    fn name(&self) -> &'static str {
        "delete-ports"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let query = PortQuery::Tags(TagQuery::Any(ctx.filter.tags_any()));
        delete_ports(self.name(), ctx, query).await
    }
}

/// Every port on the network, tagged or not.
pub(crate) async fn delete_ports_by_network(
    task: &'static str,
    ctx: &TaskContext,
    network_id: &str,
) -> Result<Completion> {
    delete_ports(task, ctx, PortQuery::Network(network_id.to_string())).await
}

/// Floating IPs keyed by the port they are bound to.
pub(crate) async fn floating_ips_by_port(
    network: &dyn NetworkApi,
) -> std::result::Result<HashMap<String, FloatingIp>, CloudError> {
    let fips = network
        .list_floating_ips(&FloatingIpQuery::Tags(TagQuery::All))
        .await?;
    Ok(fips
        .into_iter()
        .filter_map(|fip| fip.port_id.clone().map(|port_id| (port_id, fip)))
        .collect())
}

/// Read-only lookups shared by all workers of one invocation.
struct PortCaches {
    fip_by_port: HashMap<String, FloatingIp>,
    sg_by_id: HashMap<String, SecurityGroup>,
}

enum PortOutcome {
    Deleted,
    Left(String),
    Fatal(CloudError),
}

async fn delete_ports(task: &'static str, ctx: &TaskContext, query: PortQuery) -> Result<Completion> {
    let network = pending_on_err!(task, "network client", ctx.connector.network().await);
    let ports = pending_on_err!(task, "list ports", network.list_ports(&query).await);
    if ports.is_empty() {
        return Ok(Completion::Done);
    }

    let fip_by_port = pending_on_err!(
        task,
        "list floating ips",
        floating_ips_by_port(network.as_ref()).await
    );
    let groups = pending_on_err!(
        task,
        "list security groups",
        network.list_security_groups(&TagQuery::All).await
    );
    let caches = Arc::new(PortCaches {
        fip_by_port,
        sg_by_id: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
    });

    let total = ports.len();
    let pool = WorkerPool::new(ctx.settings.workers.ports);
    let worker_ctx = Arc::new(ctx.clone());
    let outcomes = pool
        .run(task, ports, move |port| {
            let network = Arc::clone(&network);
            let caches = Arc::clone(&caches);
            let ctx = Arc::clone(&worker_ctx);
            async move { clean_port(task, network.as_ref(), &ctx, &caches, port).await }
        })
        .await?;

    let mut deleted = 0;
    let mut remaining = Vec::new();
    for outcome in outcomes {
        match outcome {
            PortOutcome::Deleted => deleted += 1,
            PortOutcome::Left(what) => remaining.push(what),
            PortOutcome::Fatal(source) => {
                return Err(DestroyError::Cloud {
                    task: task.to_string(),
                    source,
                });
            }
        }
    }

    debug!(task, deleted, total, "Port pass finished");
    if deleted == total {
        Ok(Completion::Done)
    } else {
        Ok(Completion::Pending(remaining))
    }
}

async fn clean_port(
    task: &'static str,
    network: &dyn NetworkApi,
    ctx: &TaskContext,
    caches: &PortCaches,
    port: Port,
) -> PortOutcome {
    let left = || PortOutcome::Left(format!("port {}", port.id));

    if let Some(fip) = caches.fip_by_port.get(&port.id) {
        debug!(task, "Dissociating floating IP {:?}", fip.id);
        match network.disassociate_floating_ip(&fip.id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(task, "Cannot find floating IP {:?}. It's probably already been deleted.", fip.id);
            }
            Err(e) if e.is_fatal() => return PortOutcome::Fatal(e),
            Err(e) => {
                warn!(task, port_id = %port.id, error = %e, "Dissociating floating IP {:?} failed", fip.id);
                return left();
            }
        }
    }

    if !port.security_groups.is_empty() {
        // The port is going away, so every group can be detached.
        if let Err(e) = network.set_port_security_groups(&port.id, &[]).await {
            if e.is_fatal() {
                return PortOutcome::Fatal(e);
            }
            debug!(task, port_id = %port.id, error = %e, "Detaching security groups failed");
        }
    }

    for group_id in &port.security_groups {
        let Some(group) = caches.sg_by_id.get(group_id) else {
            continue;
        };
        if !ctx.is_managed_security_group(&group.name) {
            continue;
        }
        debug!(task, "Deleting load balancer security group {:?}", group_id);
        match network.delete_security_group(group_id).await {
            Ok(()) => {}
            // another port still holds it; the last one through gets it
            Err(e) if e.is_not_found() || e.is_conflict() => {}
            Err(e) if e.is_fatal() => return PortOutcome::Fatal(e),
            Err(e) => {
                warn!(task, port_id = %port.id, error = %e, "Deleting security group {group_id:?} failed. It might get orphaned.");
            }
        }
    }

    debug!(task, "Deleting port {:?}", port.id);
    match network.delete_port(&port.id).await {
        Ok(()) => PortOutcome::Deleted,
        Err(e) if e.is_not_found() => {
            debug!(task, "Cannot find port {:?}. It's probably already been deleted.", port.id);
            PortOutcome::Deleted
        }
        Err(e) if e.is_fatal() => PortOutcome::Fatal(e),
        Err(e) => {
            debug!(task, error = %e, "Deleting port {:?} failed", port.id);
            delete_associated_trunk(task, network, &port.id).await;
            left()
        }
    }
}
