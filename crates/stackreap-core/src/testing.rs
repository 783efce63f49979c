//! In-memory cloud for engine tests
//!
//! Models the dependencies that make teardown order matter: trunk-bound
//! ports refuse deletion, networks with ports or load balancers are in use,
//! routers with interfaces cannot go, and bulk object deletes honor a limit.
//! Every mutating call is appended to an ordered log.

use async_trait::async_trait;
use stackreap_cloud::{
    AuthStatus, BlockStorageApi, BulkDeleteResult, CloudConnector, CloudError, ComputeApi,
    FixedIp, FloatingIp, FloatingIpQuery, Image, ImageApi, LoadBalancer, LoadBalancerApi, Network,
    NetworkApi, ObjectStoreApi, Port, PortQuery, Result, Router, SecurityGroup, Server,
    ServerGroup, Share, ShareApi, ShareSnapshot, Subnet, TagQuery, TaggedResource, Trunk,
    TrunkQuery, Volume, VolumeSnapshot,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

pub const LOAD_BALANCER: &str = "load-balancer";
pub const OBJECT_STORE: &str = "object-store";
pub const SHARES: &str = "sharev2";

#[derive(Default)]
struct Container {
    metadata: HashMap<String, String>,
    objects: BTreeSet<String>,
}

#[derive(Default)]
struct State {
    servers: Vec<Server>,
    server_groups: Vec<ServerGroup>,
    ports: Vec<Port>,
    floating_ips: Vec<FloatingIp>,
    security_groups: Vec<SecurityGroup>,
    routers: Vec<Router>,
    gateways: HashSet<String>,
    networks: Vec<Network>,
    subnets: Vec<Subnet>,
    trunks: Vec<Trunk>,
    load_balancers: Vec<LoadBalancer>,
    volumes: Vec<Volume>,
    volume_snapshots: Vec<VolumeSnapshot>,
    shares: Vec<(Share, HashMap<String, String>)>,
    share_snapshots: Vec<ShareSnapshot>,
    images: Vec<Image>,
    containers: BTreeMap<String, Container>,

    extensions: Vec<String>,
    absent: HashSet<&'static str>,
    no_trunk_extension: bool,
    deny_containers: bool,
    bulk_limit: Option<usize>,
    page_size: usize,
    refused_objects: HashSet<String>,
    bulk_batches: Vec<usize>,

    failures: HashMap<String, VecDeque<CloudError>>,
    calls: Vec<String>,
}

impl State {
    /// Logs a call and returns the failure queued for it, if any.
    fn call(&mut self, call: String) -> Result<()> {
        let injected = self.failures.get_mut(&call).and_then(VecDeque::pop_front);
        self.calls.push(call);
        match injected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(kind: &str, id: &str) -> CloudError {
    CloudError::NotFound(format!("{kind} {id}"))
}

fn in_use(kind: &str, id: &str) -> CloudError {
    CloudError::Conflict(format!("{kind} {id} is in use"))
}

fn pairs(items: &[(&str, &str)]) -> HashMap<String, String> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct FakeCloud {
    state: Arc<Mutex<State>>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloud {
    pub fn new() -> Self {
        let state = State {
            extensions: strings(&["standard-attr-tag", "trunk"]),
            page_size: 1000,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    // --- setup ---

    pub fn with_bulk_limit(self, limit: usize) -> Self {
        self.state().bulk_limit = Some(limit);
        self
    }

    pub fn with_page_size(self, size: usize) -> Self {
        self.state().page_size = size;
        self
    }

    pub fn with_extensions(self, aliases: &[&str]) -> Self {
        self.state().extensions = strings(aliases);
        self
    }

    pub fn without_service(self, service: &'static str) -> Self {
        self.state().absent.insert(service);
        self
    }

    pub fn without_trunk_extension(self) -> Self {
        self.state().no_trunk_extension = true;
        self
    }

    pub fn deny_containers(self) -> Self {
        self.state().deny_containers = true;
        self
    }

    /// Makes the next `call` (e.g. `"delete_port p1"`) fail with `err`.
    pub fn fail_next(&self, call: &str, err: CloudError) {
        self.state()
            .failures
            .entry(call.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn add_server(&self, id: &str, name: &str, metadata: &[(&str, &str)]) {
        self.state().servers.push(Server {
            id: id.into(),
            name: name.into(),
            metadata: pairs(metadata),
        });
    }

    pub fn add_server_group(&self, id: &str, name: &str) {
        self.state().server_groups.push(ServerGroup {
            id: id.into(),
            name: name.into(),
        });
    }

    pub fn add_port(&self, port: Port) {
        self.state().ports.push(port);
    }

    pub fn add_floating_ip(&self, id: &str, port_id: Option<&str>, router_id: Option<&str>, tags: &[&str]) {
        self.state().floating_ips.push(FloatingIp {
            id: id.into(),
            floating_ip_address: String::new(),
            port_id: port_id.map(str::to_string),
            router_id: router_id.map(str::to_string),
            tags: strings(tags),
        });
    }

    pub fn add_security_group(&self, id: &str, name: &str, tags: &[&str]) {
        self.state().security_groups.push(SecurityGroup {
            id: id.into(),
            name: name.into(),
            tags: strings(tags),
        });
    }

    pub fn add_router(&self, id: &str, tags: &[&str], gateway: bool) {
        let mut state = self.state();
        state.routers.push(Router {
            id: id.into(),
            name: id.into(),
            tags: strings(tags),
        });
        if gateway {
            state.gateways.insert(id.to_string());
        }
    }

    /// A router interface is a port owned by the router with an address on the subnet.
    pub fn add_router_interface(&self, port_id: &str, router_id: &str, subnet_id: &str, ip: &str) {
        let network_id = self
            .state()
            .subnets
            .iter()
            .find(|s| s.id == subnet_id)
            .map(|s| s.network_id.clone())
            .unwrap_or_default();
        self.add_port(Port {
            id: port_id.into(),
            network_id,
            device_id: router_id.into(),
            fixed_ips: vec![FixedIp {
                subnet_id: subnet_id.into(),
                ip_address: ip.into(),
            }],
            ..Default::default()
        });
    }

    pub fn add_network(&self, id: &str, tags: &[&str]) {
        self.state().networks.push(Network {
            id: id.into(),
            name: id.into(),
            subnets: Vec::new(),
            tags: strings(tags),
        });
    }

    pub fn add_subnet(&self, id: &str, network_id: &str, gateway_ip: Option<&str>, tags: &[&str]) {
        let mut state = self.state();
        state.subnets.push(Subnet {
            id: id.into(),
            name: id.into(),
            network_id: network_id.into(),
            gateway_ip: gateway_ip.map(str::to_string),
            tags: strings(tags),
        });
        if let Some(network) = state.networks.iter_mut().find(|n| n.id == network_id) {
            network.subnets.push(id.to_string());
        }
    }

    pub fn add_trunk(&self, id: &str, port_id: &str, tags: &[&str]) {
        self.state().trunks.push(Trunk {
            id: id.into(),
            port_id: port_id.into(),
            tags: strings(tags),
        });
    }

    pub fn add_load_balancer(&self, lb: LoadBalancer) {
        self.state().load_balancers.push(lb);
    }

    pub fn add_volume(&self, id: &str, name: &str, metadata: &[(&str, &str)]) {
        self.state().volumes.push(Volume {
            id: id.into(),
            name: name.into(),
            metadata: pairs(metadata),
        });
    }

    pub fn add_volume_snapshot(&self, id: &str, metadata: &[(&str, &str)]) {
        self.state().volume_snapshots.push(VolumeSnapshot {
            id: id.into(),
            name: id.into(),
            metadata: pairs(metadata),
        });
    }

    pub fn add_share(&self, id: &str, metadata: &[(&str, &str)]) {
        self.state().shares.push((
            Share {
                id: id.into(),
                name: id.into(),
            },
            pairs(metadata),
        ));
    }

    pub fn add_share_snapshot(&self, id: &str, share_id: &str) {
        self.state().share_snapshots.push(ShareSnapshot {
            id: id.into(),
            share_id: share_id.into(),
        });
    }

    pub fn add_image(&self, id: &str, tags: &[&str]) {
        self.state().images.push(Image {
            id: id.into(),
            name: id.into(),
            tags: strings(tags),
        });
    }

    pub fn add_container(&self, name: &str, metadata: &[(&str, &str)], objects: &[String]) {
        self.state().containers.insert(
            name.to_string(),
            Container {
                metadata: pairs(metadata),
                objects: objects.iter().cloned().collect(),
            },
        );
    }

    pub fn refuse_object(&self, name: &str) {
        self.state().refused_objects.insert(name.to_string());
    }

    // --- inspection ---

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    /// Index of the first logged call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.state().calls.iter().position(|c| c == call)
    }

    pub fn server_ids(&self) -> Vec<String> {
        self.state().servers.iter().map(|s| s.id.clone()).collect()
    }

    pub fn port(&self, id: &str) -> Option<Port> {
        self.state().ports.iter().find(|p| p.id == id).cloned()
    }

    pub fn port_ids(&self) -> Vec<String> {
        self.state().ports.iter().map(|p| p.id.clone()).collect()
    }

    pub fn floating_ip(&self, id: &str) -> Option<FloatingIp> {
        self.state().floating_ips.iter().find(|f| f.id == id).cloned()
    }

    pub fn security_group_ids(&self) -> Vec<String> {
        self.state()
            .security_groups
            .iter()
            .map(|g| g.id.clone())
            .collect()
    }

    pub fn router_ids(&self) -> Vec<String> {
        self.state().routers.iter().map(|r| r.id.clone()).collect()
    }

    pub fn network(&self, id: &str) -> Option<Network> {
        self.state().networks.iter().find(|n| n.id == id).cloned()
    }

    pub fn network_ids(&self) -> Vec<String> {
        self.state().networks.iter().map(|n| n.id.clone()).collect()
    }

    pub fn trunk_ids(&self) -> Vec<String> {
        self.state().trunks.iter().map(|t| t.id.clone()).collect()
    }

    pub fn load_balancer_ids(&self) -> Vec<String> {
        self.state()
            .load_balancers
            .iter()
            .map(|l| l.id.clone())
            .collect()
    }

    pub fn volume_ids(&self) -> Vec<String> {
        self.state().volumes.iter().map(|v| v.id.clone()).collect()
    }

    pub fn share_ids(&self) -> Vec<String> {
        self.state().shares.iter().map(|(s, _)| s.id.clone()).collect()
    }

    pub fn image_ids(&self) -> Vec<String> {
        self.state().images.iter().map(|i| i.id.clone()).collect()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state().containers.keys().cloned().collect()
    }

    pub fn objects_in(&self, container: &str) -> Vec<String> {
        self.state()
            .containers
            .get(container)
            .map(|c| c.objects.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn bulk_batch_sizes(&self) -> Vec<usize> {
        self.state().bulk_batches.clone()
    }
}

#[async_trait]
impl CloudConnector for FakeCloud {
    fn name(&self) -> &str {
        "fake"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok("fake project"))
    }

    async fn compute(&self) -> Result<Arc<dyn ComputeApi>> {
        Ok(Arc::new(self.clone()))
    }

    async fn network(&self) -> Result<Arc<dyn NetworkApi>> {
        Ok(Arc::new(self.clone()))
    }

    async fn block_storage(&self) -> Result<Arc<dyn BlockStorageApi>> {
        Ok(Arc::new(self.clone()))
    }

    async fn image(&self) -> Result<Arc<dyn ImageApi>> {
        Ok(Arc::new(self.clone()))
    }

    async fn load_balancer(&self) -> Result<Arc<dyn LoadBalancerApi>> {
        if self.state().absent.contains(LOAD_BALANCER) {
            return Err(CloudError::EndpointNotFound(LOAD_BALANCER.into()));
        }
        Ok(Arc::new(self.clone()))
    }

    async fn object_store(&self) -> Result<Arc<dyn ObjectStoreApi>> {
        if self.state().absent.contains(OBJECT_STORE) {
            return Err(CloudError::EndpointNotFound(OBJECT_STORE.into()));
        }
        Ok(Arc::new(self.clone()))
    }

    async fn shared_file_system(&self) -> Result<Arc<dyn ShareApi>> {
        if self.state().absent.contains(SHARES) {
            return Err(CloudError::EndpointNotFound(SHARES.into()));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl ComputeApi for FakeCloud {
    async fn list_servers(&self) -> Result<Vec<Server>> {
        Ok(self.state().servers.clone())
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_server {id}"))?;
        let before = state.servers.len();
        state.servers.retain(|s| s.id != id);
        if state.servers.len() == before {
            return Err(not_found("server", id));
        }
        Ok(())
    }

    async fn list_server_groups(&self) -> Result<Vec<ServerGroup>> {
        Ok(self.state().server_groups.clone())
    }

    async fn delete_server_group(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_server_group {id}"))?;
        let before = state.server_groups.len();
        state.server_groups.retain(|g| g.id != id);
        if state.server_groups.len() == before {
            return Err(not_found("server group", id));
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkApi for FakeCloud {
    async fn list_extensions(&self) -> Result<Vec<String>> {
        Ok(self.state().extensions.clone())
    }

    async fn list_ports(&self, query: &PortQuery) -> Result<Vec<Port>> {
        let state = self.state();
        Ok(state
            .ports
            .iter()
            .filter(|p| match query {
                PortQuery::Tags(tags) => tags.matches(&p.tags),
                PortQuery::Network(network_id) => &p.network_id == network_id,
                PortQuery::Device(device_id) => &p.device_id == device_id,
                PortQuery::FixedIp {
                    subnet_id,
                    ip_address,
                } => p
                    .fixed_ips
                    .iter()
                    .any(|ip| &ip.subnet_id == subnet_id && &ip.ip_address == ip_address),
            })
            .cloned()
            .collect())
    }

    async fn set_port_security_groups(&self, port_id: &str, groups: &[String]) -> Result<()> {
        let mut state = self.state();
        state.call(format!("set_port_security_groups {port_id} [{}]", groups.join(",")))?;
        let port = state
            .ports
            .iter_mut()
            .find(|p| p.id == port_id)
            .ok_or_else(|| not_found("port", port_id))?;
        port.security_groups = groups.to_vec();
        Ok(())
    }

    async fn delete_port(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_port {id}"))?;
        if !state.ports.iter().any(|p| p.id == id) {
            return Err(not_found("port", id));
        }
        if state.trunks.iter().any(|t| t.port_id == id) {
            return Err(in_use("port", id));
        }
        state.ports.retain(|p| p.id != id);
        for fip in state.floating_ips.iter_mut() {
            if fip.port_id.as_deref() == Some(id) {
                fip.port_id = None;
            }
        }
        Ok(())
    }

    async fn list_floating_ips(&self, query: &FloatingIpQuery) -> Result<Vec<FloatingIp>> {
        let state = self.state();
        Ok(state
            .floating_ips
            .iter()
            .filter(|f| match query {
                FloatingIpQuery::Tags(tags) => tags.matches(&f.tags),
                FloatingIpQuery::Port(port_id) => f.port_id.as_deref() == Some(port_id.as_str()),
                FloatingIpQuery::Router(router_id) => {
                    f.router_id.as_deref() == Some(router_id.as_str())
                }
            })
            .cloned()
            .collect())
    }

    async fn disassociate_floating_ip(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("disassociate_floating_ip {id}"))?;
        let fip = state
            .floating_ips
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found("floating ip", id))?;
        fip.port_id = None;
        fip.router_id = None;
        Ok(())
    }

    async fn delete_floating_ip(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_floating_ip {id}"))?;
        let before = state.floating_ips.len();
        state.floating_ips.retain(|f| f.id != id);
        if state.floating_ips.len() == before {
            return Err(not_found("floating ip", id));
        }
        Ok(())
    }

    async fn list_security_groups(&self, query: &TagQuery) -> Result<Vec<SecurityGroup>> {
        let state = self.state();
        Ok(state
            .security_groups
            .iter()
            .filter(|g| query.matches(&g.tags))
            .cloned()
            .collect())
    }

    async fn delete_security_group(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_security_group {id}"))?;
        if !state.security_groups.iter().any(|g| g.id == id) {
            return Err(not_found("security group", id));
        }
        if state
            .ports
            .iter()
            .any(|p| p.security_groups.iter().any(|g| g == id))
        {
            return Err(in_use("security group", id));
        }
        state.security_groups.retain(|g| g.id != id);
        Ok(())
    }

    async fn list_routers(&self, query: &TagQuery) -> Result<Vec<Router>> {
        let state = self.state();
        Ok(state
            .routers
            .iter()
            .filter(|r| query.matches(&r.tags))
            .cloned()
            .collect())
    }

    async fn get_router(&self, id: &str) -> Result<Router> {
        self.state()
            .routers
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found("router", id))
    }

    async fn clear_router_gateway(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("clear_router_gateway {id}"))?;
        if !state.routers.iter().any(|r| r.id == id) {
            return Err(not_found("router", id));
        }
        state.gateways.remove(id);
        Ok(())
    }

    async fn remove_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("remove_router_interface {router_id} {subnet_id}"))?;
        let before = state.ports.len();
        state.ports.retain(|p| {
            !(p.device_id == router_id && p.fixed_ips.iter().any(|ip| ip.subnet_id == subnet_id))
        });
        if state.ports.len() == before {
            return Err(not_found("router interface", subnet_id));
        }
        Ok(())
    }

    async fn delete_router(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_router {id}"))?;
        if !state.routers.iter().any(|r| r.id == id) {
            return Err(not_found("router", id));
        }
        let has_interfaces = state.ports.iter().any(|p| p.device_id == id);
        let has_fips = state
            .floating_ips
            .iter()
            .any(|f| f.router_id.as_deref() == Some(id) && f.port_id.is_some());
        if has_interfaces || has_fips {
            return Err(in_use("router", id));
        }
        state.routers.retain(|r| r.id != id);
        state.gateways.remove(id);
        Ok(())
    }

    async fn list_networks(&self, query: &TagQuery) -> Result<Vec<Network>> {
        let state = self.state();
        Ok(state
            .networks
            .iter()
            .filter(|n| query.matches(&n.tags))
            .cloned()
            .collect())
    }

    async fn delete_network(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_network {id}"))?;
        if !state.networks.iter().any(|n| n.id == id) {
            return Err(not_found("network", id));
        }
        let has_ports = state.ports.iter().any(|p| p.network_id == id);
        let has_lbs = state.load_balancers.iter().any(|l| l.vip_network_id == id);
        if has_ports || has_lbs {
            return Err(in_use("network", id));
        }
        state.networks.retain(|n| n.id != id);
        state.subnets.retain(|s| s.network_id != id);
        Ok(())
    }

    async fn list_subnets(&self, query: &TagQuery) -> Result<Vec<Subnet>> {
        let state = self.state();
        Ok(state
            .subnets
            .iter()
            .filter(|s| query.matches(&s.tags))
            .cloned()
            .collect())
    }

    async fn get_subnet(&self, id: &str) -> Result<Subnet> {
        self.state()
            .subnets
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found("subnet", id))
    }

    async fn delete_subnet(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_subnet {id}"))?;
        if !state.subnets.iter().any(|s| s.id == id) {
            return Err(not_found("subnet", id));
        }
        if state
            .ports
            .iter()
            .any(|p| p.fixed_ips.iter().any(|ip| ip.subnet_id == id))
        {
            return Err(in_use("subnet", id));
        }
        state.subnets.retain(|s| s.id != id);
        for network in state.networks.iter_mut() {
            network.subnets.retain(|s| s != id);
        }
        Ok(())
    }

    async fn list_trunks(&self, query: &TrunkQuery) -> Result<Vec<Trunk>> {
        let state = self.state();
        if state.no_trunk_extension {
            return Err(CloudError::Api {
                status: 404,
                message: "trunks: resource not found".into(),
            });
        }
        Ok(state
            .trunks
            .iter()
            .filter(|t| match query {
                TrunkQuery::Tags(tags) => tags.matches(&t.tags),
                TrunkQuery::Port(port_id) => &t.port_id == port_id,
            })
            .cloned()
            .collect())
    }

    async fn delete_trunk(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_trunk {id}"))?;
        let before = state.trunks.len();
        state.trunks.retain(|t| t.id != id);
        if state.trunks.len() == before {
            return Err(not_found("trunk", id));
        }
        Ok(())
    }

    async fn delete_tag(&self, resource: TaggedResource, id: &str, tag: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_tag {} {id} {tag}", resource.as_str()))?;
        let tags = match resource {
            TaggedResource::Network => state
                .networks
                .iter_mut()
                .find(|n| n.id == id)
                .map(|n| &mut n.tags),
            TaggedResource::Port => state.ports.iter_mut().find(|p| p.id == id).map(|p| &mut p.tags),
        }
        .ok_or_else(|| not_found(resource.as_str(), id))?;
        let before = tags.len();
        tags.retain(|t| t != tag);
        if tags.len() == before {
            return Err(not_found("tag", tag));
        }
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerApi for FakeCloud {
    async fn list_load_balancers(&self, vip_network_id: Option<&str>) -> Result<Vec<LoadBalancer>> {
        let state = self.state();
        Ok(state
            .load_balancers
            .iter()
            .filter(|l| vip_network_id.is_none_or(|n| l.vip_network_id == n))
            .cloned()
            .collect())
    }

    /// Cascade removes the VIP port but leaves its floating IP allocated.
    async fn delete_load_balancer(&self, id: &str, cascade: bool) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_load_balancer {id}"))?;
        let Some(lb) = state.load_balancers.iter().find(|l| l.id == id).cloned() else {
            return Err(not_found("load balancer", id));
        };
        state.load_balancers.retain(|l| l.id != id);
        if cascade {
            state.ports.retain(|p| p.id != lb.vip_port_id);
        }
        Ok(())
    }
}

#[async_trait]
impl BlockStorageApi for FakeCloud {
    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        Ok(self.state().volumes.clone())
    }

    async fn delete_volume(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_volume {id}"))?;
        let before = state.volumes.len();
        state.volumes.retain(|v| v.id != id);
        if state.volumes.len() == before {
            return Err(not_found("volume", id));
        }
        Ok(())
    }

    async fn list_volume_snapshots(&self) -> Result<Vec<VolumeSnapshot>> {
        Ok(self.state().volume_snapshots.clone())
    }

    async fn delete_volume_snapshot(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_volume_snapshot {id}"))?;
        let before = state.volume_snapshots.len();
        state.volume_snapshots.retain(|s| s.id != id);
        if state.volume_snapshots.len() == before {
            return Err(not_found("volume snapshot", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageApi for FakeCloud {
    async fn list_images(&self, query: &TagQuery) -> Result<Vec<Image>> {
        let state = self.state();
        Ok(state
            .images
            .iter()
            .filter(|i| query.matches(&i.tags))
            .cloned()
            .collect())
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_image {id}"))?;
        let before = state.images.len();
        state.images.retain(|i| i.id != id);
        if state.images.len() == before {
            return Err(not_found("image", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ShareApi for FakeCloud {
    async fn list_shares(&self, metadata: &HashMap<String, String>) -> Result<Vec<Share>> {
        let state = self.state();
        Ok(state
            .shares
            .iter()
            .filter(|(_, meta)| metadata.iter().all(|(k, v)| meta.get(k) == Some(v)))
            .map(|(share, _)| share.clone())
            .collect())
    }

    async fn delete_share(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_share {id}"))?;
        if !state.shares.iter().any(|(s, _)| s.id == id) {
            return Err(not_found("share", id));
        }
        if state.share_snapshots.iter().any(|s| s.share_id == id) {
            return Err(in_use("share", id));
        }
        state.shares.retain(|(s, _)| s.id != id);
        Ok(())
    }

    async fn list_share_snapshots(&self, share_id: &str) -> Result<Vec<ShareSnapshot>> {
        let state = self.state();
        Ok(state
            .share_snapshots
            .iter()
            .filter(|s| s.share_id == share_id)
            .cloned()
            .collect())
    }

    async fn delete_share_snapshot(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_share_snapshot {id}"))?;
        let before = state.share_snapshots.len();
        state.share_snapshots.retain(|s| s.id != id);
        if state.share_snapshots.len() == before {
            return Err(not_found("share snapshot", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreApi for FakeCloud {
    async fn list_containers(&self) -> Result<Vec<String>> {
        let state = self.state();
        if state.deny_containers {
            return Err(CloudError::Forbidden("swiftoperator role required".into()));
        }
        Ok(state.containers.keys().cloned().collect())
    }

    async fn container_metadata(&self, container: &str) -> Result<HashMap<String, String>> {
        self.state()
            .containers
            .get(container)
            .map(|c| c.metadata.clone())
            .ok_or_else(|| not_found("container", container))
    }

    async fn list_objects(&self, container: &str, marker: Option<&str>) -> Result<Vec<String>> {
        let state = self.state();
        let found = state
            .containers
            .get(container)
            .ok_or_else(|| not_found("container", container))?;
        Ok(found
            .objects
            .iter()
            .filter(|name| marker.is_none_or(|m| name.as_str() > m))
            .take(state.page_size)
            .cloned()
            .collect())
    }

    async fn bulk_delete(&self, container: &str, objects: &[String]) -> Result<BulkDeleteResult> {
        let mut state = self.state();
        state.call(format!("bulk_delete {container} {}", objects.len()))?;
        state.bulk_batches.push(objects.len());

        let limit = state.bulk_limit.unwrap_or(usize::MAX);
        let refused = state.refused_objects.clone();
        let mut result = BulkDeleteResult::default();
        for name in objects.iter().take(limit) {
            if refused.contains(name) {
                result.errors.push((name.clone(), "403 Forbidden".to_string()));
                continue;
            }
            let removed = state
                .containers
                .get_mut(container)
                .is_some_and(|c| c.objects.remove(name));
            if removed {
                result.number_deleted += 1;
            } else {
                result.number_not_found += 1;
            }
        }
        Ok(result)
    }

    async fn delete_container(&self, container: &str) -> Result<()> {
        let mut state = self.state();
        state.call(format!("delete_container {container}"))?;
        match state.containers.get(container) {
            None => Err(not_found("container", container)),
            Some(c) if !c.objects.is_empty() => Err(in_use("container", container)),
            Some(_) => {
                state.containers.remove(container);
                Ok(())
            }
        }
    }
}

pub const CLUSTER: &str = "abc";
pub const CLUSTER_TAG: &str = "openshiftClusterID=abc";
pub const FOREIGN_TAG: &str = "openshiftClusterID=xyz";

/// Defaults with no backoff sleeps and a short budget.
pub fn fast_settings() -> stackreap_config::Settings {
    let mut settings = stackreap_config::Settings::default();
    for retry in [
        &mut settings.retry.parallel,
        &mut settings.retry.routers,
        &mut settings.retry.untag,
    ] {
        retry.initial_delay_secs = 0.0;
        retry.steps = 5;
    }
    settings
}

pub fn cluster_tags() -> BTreeMap<String, String> {
    [("openshiftClusterID".to_string(), CLUSTER.to_string())].into()
}

/// Task context for cluster `abc` whose infra ID is also `abc`.
pub fn context(cloud: &FakeCloud) -> crate::task::TaskContext {
    let filter = crate::filter::Filter::new(cluster_tags(), "openshiftClusterID").unwrap();
    crate::task::TaskContext::new(Arc::new(cloud.clone()), filter, fast_settings(), CLUSTER)
        .unwrap()
}
