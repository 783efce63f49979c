//! Provider service traits
//!
//! Each OpenStack service is a separate trait so that a deletion routine
//! only depends on the calls it actually makes. A [`CloudConnector`] hands
//! out service clients; optional services that the cloud does not deploy
//! are reported as [`CloudError::EndpointNotFound`](crate::CloudError).

use crate::error::Result;
use crate::query::{FloatingIpQuery, PortQuery, TagQuery, TaggedResource, TrunkQuery};
use crate::resource::{
    BulkDeleteResult, FloatingIp, Image, LoadBalancer, Network, Port, Router, SecurityGroup,
    Server, ServerGroup, Share, ShareSnapshot, Subnet, Trunk, Volume, VolumeSnapshot,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Entry point to the provider: builds one client per service.
#[async_trait]
pub trait CloudConnector: Send + Sync {
    /// Returns the provider name (e.g., "openstack")
    fn name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    async fn compute(&self) -> Result<Arc<dyn ComputeApi>>;
    async fn network(&self) -> Result<Arc<dyn NetworkApi>>;
    async fn block_storage(&self) -> Result<Arc<dyn BlockStorageApi>>;
    async fn image(&self) -> Result<Arc<dyn ImageApi>>;

    /// Octavia; optional.
    async fn load_balancer(&self) -> Result<Arc<dyn LoadBalancerApi>>;
    /// Swift; optional.
    async fn object_store(&self) -> Result<Arc<dyn ObjectStoreApi>>;
    /// Manila; optional.
    async fn shared_file_system(&self) -> Result<Arc<dyn ShareApi>>;
}

#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn list_servers(&self) -> Result<Vec<Server>>;
    async fn delete_server(&self, id: &str) -> Result<()>;
    async fn list_server_groups(&self) -> Result<Vec<ServerGroup>>;
    async fn delete_server_group(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Aliases of the enabled networking extensions.
    async fn list_extensions(&self) -> Result<Vec<String>>;

    async fn list_ports(&self, query: &PortQuery) -> Result<Vec<Port>>;
    /// Replaces the port's security groups with `groups`.
    async fn set_port_security_groups(&self, port_id: &str, groups: &[String]) -> Result<()>;
    async fn delete_port(&self, id: &str) -> Result<()>;

    async fn list_floating_ips(&self, query: &FloatingIpQuery) -> Result<Vec<FloatingIp>>;
    /// Clears the port binding, keeping the address allocated.
    async fn disassociate_floating_ip(&self, id: &str) -> Result<()>;
    async fn delete_floating_ip(&self, id: &str) -> Result<()>;

    async fn list_security_groups(&self, query: &TagQuery) -> Result<Vec<SecurityGroup>>;
    async fn delete_security_group(&self, id: &str) -> Result<()>;

    async fn list_routers(&self, query: &TagQuery) -> Result<Vec<Router>>;
    async fn get_router(&self, id: &str) -> Result<Router>;
    async fn clear_router_gateway(&self, id: &str) -> Result<()>;
    async fn remove_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;
    async fn delete_router(&self, id: &str) -> Result<()>;

    async fn list_networks(&self, query: &TagQuery) -> Result<Vec<Network>>;
    async fn delete_network(&self, id: &str) -> Result<()>;

    async fn list_subnets(&self, query: &TagQuery) -> Result<Vec<Subnet>>;
    async fn get_subnet(&self, id: &str) -> Result<Subnet>;
    async fn delete_subnet(&self, id: &str) -> Result<()>;

    /// A not-found error means the cloud has no trunk extension.
    async fn list_trunks(&self, query: &TrunkQuery) -> Result<Vec<Trunk>>;
    async fn delete_trunk(&self, id: &str) -> Result<()>;

    async fn delete_tag(&self, resource: TaggedResource, id: &str, tag: &str) -> Result<()>;
}

#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn list_load_balancers(&self, vip_network_id: Option<&str>) -> Result<Vec<LoadBalancer>>;
    async fn delete_load_balancer(&self, id: &str, cascade: bool) -> Result<()>;
}

#[async_trait]
pub trait BlockStorageApi: Send + Sync {
    async fn list_volumes(&self) -> Result<Vec<Volume>>;
    async fn delete_volume(&self, id: &str) -> Result<()>;
    async fn list_volume_snapshots(&self) -> Result<Vec<VolumeSnapshot>>;
    async fn delete_volume_snapshot(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn list_images(&self, query: &TagQuery) -> Result<Vec<Image>>;
    async fn delete_image(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ObjectStoreApi: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<String>>;
    async fn container_metadata(&self, container: &str) -> Result<HashMap<String, String>>;
    /// One page of object names after `marker`; an empty page ends the listing.
    async fn list_objects(&self, container: &str, marker: Option<&str>) -> Result<Vec<String>>;
    /// May process fewer objects than requested when the service caps bulk requests.
    async fn bulk_delete(&self, container: &str, objects: &[String]) -> Result<BulkDeleteResult>;
    async fn delete_container(&self, container: &str) -> Result<()>;
}

#[async_trait]
pub trait ShareApi: Send + Sync {
    async fn list_shares(&self, metadata: &HashMap<String, String>) -> Result<Vec<Share>>;
    async fn delete_share(&self, id: &str) -> Result<()>;
    async fn list_share_snapshots(&self, share_id: &str) -> Result<Vec<ShareSnapshot>>;
    async fn delete_share_snapshot(&self, id: &str) -> Result<()>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Project/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}
