//! Octavia load balancers
//!
//! Load balancer tags are not usable for ownership; the cloud provider
//! writes the cluster ID into the description instead.

use crate::error::{DestroyError, Result};
use crate::task::{Completion, DeletionTask, TaskContext, Tally, transient};
use async_trait::async_trait;
use stackreap_cloud::{FloatingIpQuery, LoadBalancer, NetworkApi};
use tracing::debug;

pub struct DeleteLoadBalancers;

#[async_trait]
impl DeletionTask for DeleteLoadBalancers {
    fn name(&self) -> &'static str {
        "delete-load-balancers"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let lbs = match ctx.connector.load_balancer().await {
            Ok(lbs) => lbs,
            Err(e) if e.is_endpoint_not_found() => {
                debug!(task, "Skip load balancer deletion because Octavia endpoint is not found");
                return Ok(Completion::Done);
            }
            Err(e) => return transient(task, "load balancer client", e),
        };
        let all = match lbs.list_load_balancers(None).await {
            Ok(all) => all,
            Err(e) => return transient(task, "list load balancers", e),
        };

        let owned: Vec<_> = all
            .into_iter()
            .filter(|lb| lb.description.contains(ctx.cluster_id()))
            .collect();

        let mut tally = Tally::new(task, owned.len());
        for lb in owned {
            debug!(task, "Deleting load balancer {:?}", lb.id);
            tally.record("load balancer", &lb.id, lbs.delete_load_balancer(&lb.id, true).await)?;
        }
        Ok(tally.finish())
    }
}

/// Removes the cloud-provider load balancers left on a network.
///
/// Returns true once no load balancer is left on the network. The floating
/// IP of each one is dissociated first; a load balancer whose floating IP
/// could not be released is kept so the binding is not lost.
pub(crate) async fn delete_leftover_load_balancers(
    task: &'static str,
    ctx: &TaskContext,
    network: &dyn NetworkApi,
    network_id: &str,
) -> Result<bool> {
    let lbs = match ctx.connector.load_balancer().await {
        Ok(lbs) => lbs,
        Err(e) if e.is_endpoint_not_found() => return Ok(true),
        Err(e) => return soft_failure(task, "load balancer client", e).map(|_| false),
    };
    let all = match lbs.list_load_balancers(Some(network_id)).await {
        Ok(all) => all,
        Err(e) => return soft_failure(task, "list leftover load balancers", e).map(|_| false),
    };

    let prefix = &ctx.settings.cluster.leftover_lb_description_prefix;
    let mut deleted = 0;
    for lb in &all {
        if !lb.description.starts_with(prefix.as_str()) {
            debug!(
                task,
                "Not deleting load balancer {:?} with description {:?}", lb.id, lb.description
            );
            continue;
        }

        if !release_vip_floating_ips(task, network, lb).await? {
            continue;
        }

        debug!(task, network_id, "Deleting leftover load balancer {:?}", lb.id);
        match lbs.delete_load_balancer(&lb.id, true).await {
            Ok(()) => deleted += 1,
            Err(e) if e.is_not_found() => deleted += 1,
            Err(e) => soft_failure(task, "delete leftover load balancer", e)?,
        }
    }

    Ok(deleted == all.len())
}

/// Cascade deletion keeps the floating IP, so it has to be released by hand.
async fn release_vip_floating_ips(
    task: &'static str,
    network: &dyn NetworkApi,
    lb: &LoadBalancer,
) -> Result<bool> {
    let query = FloatingIpQuery::Port(lb.vip_port_id.clone());
    let fips = match network.list_floating_ips(&query).await {
        Ok(fips) => fips,
        Err(e) => return soft_failure(task, "list load balancer floating ips", e).map(|_| false),
    };

    for fip in fips {
        debug!(task, "Dissociating floating IP {:?} of load balancer {:?}", fip.id, lb.id);
        match network.disassociate_floating_ip(&fip.id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                soft_failure(task, "dissociate load balancer floating ip", e)?;
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Logs a recoverable failure; unrecoverable ones become the error.
fn soft_failure(task: &'static str, what: &str, err: stackreap_cloud::CloudError) -> Result<()> {
    if err.is_fatal() {
        return Err(DestroyError::Cloud {
            task: task.to_string(),
            source: err,
        });
    }
    debug!(task, error = %err, "{what} failed");
    Ok(())
}
