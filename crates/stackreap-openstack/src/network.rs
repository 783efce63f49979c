//! Neutron through `openstack port|network|subnet|router|floating ip|...`

use crate::cli::{Extension, OpenStackCli, tag_args};
use async_trait::async_trait;
use serde::Deserialize;
use stackreap_cloud::{
    FloatingIp, FloatingIpQuery, NetworkApi, Network, Port, PortQuery, Result, Router,
    SecurityGroup, Subnet, TagQuery, TaggedResource, Trunk, TrunkQuery,
};

#[derive(Debug, Deserialize)]
struct IdRecord {
    #[serde(alias = "ID")]
    id: String,
}

#[async_trait]
impl NetworkApi for OpenStackCli {
    async fn list_extensions(&self) -> Result<Vec<String>> {
        let extensions: Vec<Extension> = self.list(&["extension", "list", "--network"]).await?;
        Ok(extensions.into_iter().map(|e| e.alias).collect())
    }

    async fn list_ports(&self, query: &PortQuery) -> Result<Vec<Port>> {
        let mut args = vec!["port".to_string(), "list".to_string(), "--long".to_string()];
        match query {
            PortQuery::Tags(tags) => args.extend(tag_args(tags)),
            PortQuery::Network(id) => args.extend(["--network".to_string(), id.clone()]),
            PortQuery::Device(id) => args.extend(["--device-id".to_string(), id.clone()]),
            PortQuery::FixedIp {
                subnet_id,
                ip_address,
            } => args.extend([
                "--fixed-ip".to_string(),
                format!("subnet={subnet_id},ip-address={ip_address}"),
            ]),
        }
        let mut ports: Vec<Port> = self.list(&args).await?;

        // The list output has no network or device columns.
        match query {
            PortQuery::Network(id) => ports.iter_mut().for_each(|p| p.network_id = id.clone()),
            PortQuery::Device(id) => ports.iter_mut().for_each(|p| p.device_id = id.clone()),
            PortQuery::FixedIp { .. } => {
                let mut detailed = Vec::with_capacity(ports.len());
                for port in &ports {
                    detailed.push(self.json::<Port, _>(&["port", "show", port.id.as_str()]).await?);
                }
                ports = detailed;
            }
            PortQuery::Tags(_) => {}
        }
        Ok(ports)
    }

    async fn set_port_security_groups(&self, port_id: &str, groups: &[String]) -> Result<()> {
        let mut args = vec!["port", "set", "--no-security-group"];
        for group in groups {
            args.extend(["--security-group", group.as_str()]);
        }
        args.push(port_id);
        Ok(self.exec(&args).await?)
    }

    async fn delete_port(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["port", "delete", id]).await?)
    }

    async fn list_floating_ips(&self, query: &FloatingIpQuery) -> Result<Vec<FloatingIp>> {
        let mut args = vec!["floating".to_string(), "ip".to_string(), "list".to_string(), "--long".to_string()];
        match query {
            FloatingIpQuery::Tags(tags) => args.extend(tag_args(tags)),
            FloatingIpQuery::Port(id) => args.extend(["--port".to_string(), id.clone()]),
            FloatingIpQuery::Router(id) => args.extend(["--router".to_string(), id.clone()]),
        }
        Ok(self.list(&args).await?)
    }

    async fn disassociate_floating_ip(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["floating", "ip", "unset", "--port", id]).await?)
    }

    async fn delete_floating_ip(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["floating", "ip", "delete", id]).await?)
    }

    async fn list_security_groups(&self, query: &TagQuery) -> Result<Vec<SecurityGroup>> {
        let mut args = vec!["security".to_string(), "group".to_string(), "list".to_string()];
        args.extend(tag_args(query));
        Ok(self.list(&args).await?)
    }

    async fn delete_security_group(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["security", "group", "delete", id]).await?)
    }

    async fn list_routers(&self, query: &TagQuery) -> Result<Vec<Router>> {
        let mut args = vec!["router".to_string(), "list".to_string(), "--long".to_string()];
        args.extend(tag_args(query));
        Ok(self.list(&args).await?)
    }

    async fn get_router(&self, id: &str) -> Result<Router> {
        Ok(self.json(&["router", "show", id]).await?)
    }

    async fn clear_router_gateway(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["router", "unset", "--external-gateway", id]).await?)
    }

    async fn remove_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        Ok(self.exec(&["router", "remove", "subnet", router_id, subnet_id]).await?)
    }

    async fn delete_router(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["router", "delete", id]).await?)
    }

    async fn list_networks(&self, query: &TagQuery) -> Result<Vec<Network>> {
        let mut args = vec!["network".to_string(), "list".to_string(), "--long".to_string()];
        args.extend(tag_args(query));
        Ok(self.list(&args).await?)
    }

    async fn delete_network(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["network", "delete", id]).await?)
    }

    async fn list_subnets(&self, query: &TagQuery) -> Result<Vec<Subnet>> {
        let mut args = vec!["subnet".to_string(), "list".to_string(), "--long".to_string()];
        args.extend(tag_args(query));
        Ok(self.list(&args).await?)
    }

    async fn get_subnet(&self, id: &str) -> Result<Subnet> {
        Ok(self.json(&["subnet", "show", id]).await?)
    }

    async fn delete_subnet(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["subnet", "delete", id]).await?)
    }

    /// Trunk listings carry neither tags nor a tag filter, so tag queries
    /// fetch every trunk's details.
    async fn list_trunks(&self, query: &TrunkQuery) -> Result<Vec<Trunk>> {
        match query {
            TrunkQuery::Port(port_id) => {
                let trunks: Vec<Trunk> = self.list(&["network", "trunk", "list"]).await?;
                Ok(trunks.into_iter().filter(|t| &t.port_id == port_id).collect())
            }
            TrunkQuery::Tags(tags) => {
                let ids: Vec<IdRecord> = self.list(&["network", "trunk", "list"]).await?;
                let mut trunks = Vec::new();
                for record in ids {
                    match self.json::<Trunk, _>(&["network", "trunk", "show", record.id.as_str()]).await {
                        Ok(trunk) if tags.matches(&trunk.tags) => trunks.push(trunk),
                        Ok(_) => {}
                        Err(crate::OpenStackError::NotFound(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(trunks)
            }
        }
    }

    async fn delete_trunk(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["network", "trunk", "delete", id]).await?)
    }

    async fn delete_tag(&self, resource: TaggedResource, id: &str, tag: &str) -> Result<()> {
        let command = match resource {
            TaggedResource::Network => "network",
            TaggedResource::Port => "port",
        };
        Ok(self.exec(&[command, "unset", "--tag", tag, id]).await?)
    }
}
