//! Per-kind deletion tasks

mod compute;
mod containers;
mod floating_ips;
mod images;
mod load_balancers;
mod networks;
mod ports;
mod routers;
mod security_groups;
mod shares;
mod trunks;
mod untag;
mod vip_ports;
mod volumes;

pub use compute::{DeleteServerGroups, DeleteServers};
pub use containers::DeleteContainers;
pub use floating_ips::DeleteFloatingIps;
pub use images::DeleteImages;
pub use load_balancers::DeleteLoadBalancers;
pub use networks::{DeleteNetworks, DeleteSubnets};
pub use ports::DeletePorts;
pub use routers::{ClearRouterInterfaces, DeleteRouters};
pub use security_groups::DeleteSecurityGroups;
pub use shares::DeleteShares;
pub use trunks::DeleteTrunks;
pub use untag::UntagPrimaryNetwork;
pub use vip_ports::CleanVipsPorts;
pub use volumes::{DeleteVolumeSnapshots, DeleteVolumes};

use crate::task::DeletionTask;
use std::sync::Arc;

/// Tasks with no ordering dependency on each other.
pub fn parallel_tasks() -> Vec<Arc<dyn DeletionTask>> {
    vec![
        Arc::new(CleanVipsPorts),
        Arc::new(DeleteServers),
        Arc::new(DeleteServerGroups),
        Arc::new(DeleteTrunks),
        Arc::new(DeleteLoadBalancers),
        Arc::new(DeletePorts),
        Arc::new(DeleteSecurityGroups),
        Arc::new(ClearRouterInterfaces),
        Arc::new(DeleteSubnets),
        Arc::new(DeleteNetworks),
        Arc::new(DeleteContainers),
        Arc::new(DeleteVolumes),
        Arc::new(DeleteShares),
        Arc::new(DeleteVolumeSnapshots),
        Arc::new(DeleteFloatingIps),
        Arc::new(DeleteImages),
    ]
}
