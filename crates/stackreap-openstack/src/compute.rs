use crate::cli::OpenStackCli;
use async_trait::async_trait;
use stackreap_cloud::{ComputeApi, Result, Server, ServerGroup};

#[async_trait]
impl ComputeApi for OpenStackCli {
    /// `--long` adds the metadata ("Properties") column.
    async fn list_servers(&self) -> Result<Vec<Server>> {
        Ok(self.list(&["server", "list", "--long"]).await?)
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["server", "delete", id]).await?)
    }

    async fn list_server_groups(&self) -> Result<Vec<ServerGroup>> {
        Ok(self.list(&["server", "group", "list"]).await?)
    }

    async fn delete_server_group(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["server", "group", "delete", id]).await?)
    }
}
