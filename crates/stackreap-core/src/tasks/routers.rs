//! Router interfaces and routers
//!
//! Interfaces are cleared during the parallel phase so subnets can go.
//! Routers themselves are deleted afterwards, once nothing else needs the
//! floating IP bindings that run through them.

use crate::error::{DestroyError, Result};
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err, transient};
use async_trait::async_trait;
use stackreap_cloud::{FloatingIpQuery, NetworkApi, PortQuery, Router, TagQuery};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Detaches cluster subnets from the router serving the cluster networks.
///
/// The router may belong to the user; in that case only interfaces on
/// cluster subnets are removed.
pub struct ClearRouterInterfaces;

#[async_trait]
impl DeletionTask for ClearRouterInterfaces {
    fn name(&self) -> &'static str {
        "clear-router-interfaces"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let networks = pending_on_err!(
            task,
            "list networks",
            network
                .list_networks(&TagQuery::Every(ctx.filter.tags_any()))
                .await
        );

        let mut router_id = None;
        for net in &networks {
            let Some(subnet_id) = net.subnets.first() else {
                continue;
            };
            let subnet = match network.get_subnet(subnet_id).await {
                Ok(subnet) => subnet,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return transient(task, "get subnet", e),
            };
            let Some(gateway_ip) = subnet.gateway_ip.filter(|ip| !ip.is_empty()) else {
                continue;
            };

            let query = PortQuery::FixedIp {
                subnet_id: subnet_id.clone(),
                ip_address: gateway_ip,
            };
            let ports = pending_on_err!(task, "list gateway ports", network.list_ports(&query).await);
            if let Some(port) = ports.first() {
                debug!(task, "Found port {:?} connected to router", port.id);
                router_id = Some(port.device_id.clone());
                break;
            }
        }

        let Some(router_id) = router_id else {
            return Ok(Completion::Done);
        };
        let router = match network.get_router(&router_id).await {
            Ok(router) => router,
            Err(e) if e.is_not_found() => return Ok(Completion::Done),
            Err(e) => return transient(task, "get router", e),
        };

        remove_router_interfaces(task, ctx, network.as_ref(), &router).await
    }
}

async fn remove_router_interfaces(
    task: &'static str,
    ctx: &TaskContext,
    network: &dyn NetworkApi,
    router: &Router,
) -> Result<Completion> {
    let interfaces = pending_on_err!(
        task,
        "list router interfaces",
        network
            .list_ports(&PortQuery::Device(router.id.clone()))
            .await
    );
    let cluster_subnets: HashSet<String> = pending_on_err!(
        task,
        "list subnets",
        network
            .list_subnets(&TagQuery::Any(ctx.filter.tags_any()))
            .await
    )
    .into_iter()
    .map(|s| s.id)
    .collect();

    let cluster_router = router.tags.contains(&ctx.filter.cluster_tag());
    let mut removed_subnets = HashSet::new();
    let mut foreign = 0;

    for port in &interfaces {
        for ip in &port.fixed_ips {
            if !cluster_router && !cluster_subnets.contains(&ip.subnet_id) {
                debug!(task, "Found custom interface {:?} on router {:?}", port.id, router.id);
                foreign += 1;
                continue;
            }
            if !removed_subnets.insert(ip.subnet_id.clone()) {
                continue;
            }

            debug!(task, "Removing subnet {:?} from router {:?}", ip.subnet_id, router.id);
            match network.remove_router_interface(&router.id, &ip.subnet_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(
                        task,
                        "Cannot find subnet {:?}. It's probably already been removed from router {:?}.",
                        ip.subnet_id,
                        router.id
                    );
                }
                Err(e) => return transient(task, "remove router interface", e),
            }
        }
    }

    if foreign > 0 {
        debug!(task, foreign, "Left user interfaces on router {:?}", router.id);
    }
    Ok(Completion::Done)
}

/// Deletes cluster routers after releasing the floating IPs routed through them.
pub struct DeleteRouters;

#[async_trait]
impl DeletionTask for DeleteRouters {
    fn name(&self) -> &'static str {
        "delete-routers"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let routers = pending_on_err!(
            task,
            "list routers",
            network
                .list_routers(&TagQuery::Any(ctx.filter.tags_any()))
                .await
        );

        let mut tally = Tally::new(task, routers.len());
        for router in routers {
            let query = FloatingIpQuery::Router(router.id.clone());
            let fips = pending_on_err!(task, "list router floating ips", network.list_floating_ips(&query).await);

            if !release_floating_ips(task, network.as_ref(), &fips).await? {
                tally.left(format!("router {}", router.id));
                continue;
            }

            if let Err(e) = network.clear_router_gateway(&router.id).await {
                if e.is_fatal() {
                    return Err(DestroyError::Cloud {
                        task: task.to_string(),
                        source: e,
                    });
                }
                warn!(task, error = %e, "Clearing gateway of router {:?} failed", router.id);
            }

            debug!(task, "Deleting router {:?}", router.id);
            tally.record("router", &router.id, network.delete_router(&router.id).await)?;
        }
        Ok(tally.finish())
    }
}

async fn release_floating_ips(
    task: &'static str,
    network: &dyn NetworkApi,
    fips: &[stackreap_cloud::FloatingIp],
) -> Result<bool> {
    for fip in fips {
        debug!(task, "Dissociating floating IP {:?}", fip.id);
        match network.disassociate_floating_ip(&fip.id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) if e.is_fatal() => {
                return Err(DestroyError::Cloud {
                    task: task.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                warn!(task, error = %e, "Dissociating floating IP {:?} for router failed", fip.id);
                return Ok(false);
            }
        }
    }
    Ok(true)
}
