//! Subnets and networks
//!
//! A network that is still in use is unblocked in a fixed order: first the
//! leftover load balancers on it (their floating IPs released), then every
//! remaining port. Deleting the ports first would drop the link between a
//! load balancer's VIP port and its floating IP.

use super::load_balancers::delete_leftover_load_balancers;
use super::ports::delete_ports_by_network;
use crate::error::{DestroyError, Result};
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err};
use async_trait::async_trait;
use stackreap_cloud::{ErrorClass, TagQuery};
use tracing::{debug, warn};

pub struct DeleteSubnets;

#[async_trait]
impl DeletionTask for DeleteSubnets {
    fn name(&self) -> &'static str {
        "delete-subnets"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let subnets = pending_on_err!(
            task,
            "list subnets",
            network
                .list_subnets(&TagQuery::Any(ctx.filter.tags_any()))
                .await
        );

        let mut tally = Tally::new(task, subnets.len());
        for subnet in subnets {
            debug!(task, "Deleting subnet {:?}", subnet.id);
            tally.record("subnet", &subnet.id, network.delete_subnet(&subnet.id).await)?;
        }
        Ok(tally.finish())
    }
}

pub struct DeleteNetworks;

#[async_trait]
impl DeletionTask for DeleteNetworks {
    fn name(&self) -> &'static str {
        "delete-networks"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let network = pending_on_err!(task, "network client", ctx.connector.network().await);
        let networks = pending_on_err!(
            task,
            "list networks",
            network
                .list_networks(&TagQuery::Any(ctx.filter.tags_any()))
                .await
        );

        let mut tally = Tally::new(task, networks.len());
        for net in networks {
            debug!(task, "Deleting network {:?}", net.id);
            let err = match network.delete_network(&net.id).await {
                Ok(()) => {
                    tally.removed();
                    continue;
                }
                Err(err) => err,
            };

            match err.class() {
                ErrorClass::NotFound => {
                    debug!(task, "Cannot find network {:?}. It's probably already been deleted.", net.id);
                    tally.removed();
                }
                ErrorClass::Fatal => {
                    return Err(DestroyError::Cloud {
                        task: task.to_string(),
                        source: err,
                    });
                }
                ErrorClass::Transient => {
                    warn!(task, error = %err, "Deleting network {:?} failed", net.id);
                    tally.left(format!("network {}", net.id));
                }
                ErrorClass::Conflict => {
                    debug!(task, error = %err, "Network {:?} is still in use", net.id);
                    tally.left(format!("network {}", net.id));

                    if !delete_leftover_load_balancers(task, ctx, network.as_ref(), &net.id).await? {
                        debug!(task, "Keeping ports of network {:?} until its load balancers are gone", net.id);
                        continue;
                    }
                    let ports = delete_ports_by_network(task, ctx, &net.id).await?;
                    if let Completion::Pending(left) = ports {
                        debug!(task, "Ports left on network {:?}: {}", net.id, left.join(", "));
                    }
                }
            }
        }
        Ok(tally.finish())
    }
}
