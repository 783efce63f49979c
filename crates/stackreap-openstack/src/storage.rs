//! Cinder, Glance, Manila, Swift and Octavia

use crate::cli::{NamedRecord, OpenStackCli};
use crate::error::OpenStackError;
use async_trait::async_trait;
use serde::Deserialize;
use stackreap_cloud::resource::string_map;
use stackreap_cloud::{
    BlockStorageApi, BulkDeleteResult, Image, ImageApi, LoadBalancer, LoadBalancerApi,
    ObjectStoreApi, Result, Share, ShareApi, ShareSnapshot, TagQuery, Volume, VolumeSnapshot,
};
use std::collections::HashMap;
use tracing::debug;

/// Objects per `object delete` invocation, keeping the command line short.
const OBJECT_DELETE_CHUNK: usize = 100;

/// Page size of `object list`.
const OBJECT_PAGE: &str = "1000";

#[async_trait]
impl BlockStorageApi for OpenStackCli {
    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        Ok(self.list(&["volume", "list", "--long"]).await?)
    }

    async fn delete_volume(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["volume", "delete", id]).await?)
    }

    async fn list_volume_snapshots(&self) -> Result<Vec<VolumeSnapshot>> {
        Ok(self.list(&["volume", "snapshot", "list", "--long"]).await?)
    }

    async fn delete_volume_snapshot(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["volume", "snapshot", "delete", id]).await?)
    }
}

#[async_trait]
impl ImageApi for OpenStackCli {
    /// Glance only filters on "all of these tags"; other queries are
    /// evaluated on the listing.
    async fn list_images(&self, query: &TagQuery) -> Result<Vec<Image>> {
        let mut args = vec!["image".to_string(), "list".to_string(), "--long".to_string()];
        if let TagQuery::Every(tags) = query {
            for tag in tags {
                args.extend(["--tag".to_string(), tag.clone()]);
            }
        }
        let images: Vec<Image> = self.list(&args).await?;
        Ok(images.into_iter().filter(|i| query.matches(&i.tags)).collect())
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["image", "delete", id]).await?)
    }
}

#[async_trait]
impl ShareApi for OpenStackCli {
    async fn list_shares(&self, metadata: &HashMap<String, String>) -> Result<Vec<Share>> {
        let mut args = vec!["share".to_string(), "list".to_string()];
        for (key, value) in metadata {
            args.extend(["--property".to_string(), format!("{key}={value}")]);
        }
        Ok(self.list(&args).await?)
    }

    async fn delete_share(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["share", "delete", id]).await?)
    }

    async fn list_share_snapshots(&self, share_id: &str) -> Result<Vec<ShareSnapshot>> {
        let mut snapshots: Vec<ShareSnapshot> = self
            .list(&["share", "snapshot", "list", "--share", share_id])
            .await?;
        for snapshot in &mut snapshots {
            snapshot.share_id = share_id.to_string();
        }
        Ok(snapshots)
    }

    async fn delete_share_snapshot(&self, id: &str) -> Result<()> {
        Ok(self.exec(&["share", "snapshot", "delete", id]).await?)
    }
}

#[derive(Debug, Deserialize)]
struct ContainerDetails {
    #[serde(default, deserialize_with = "string_map")]
    properties: HashMap<String, String>,
}

#[async_trait]
impl ObjectStoreApi for OpenStackCli {
    async fn list_containers(&self) -> Result<Vec<String>> {
        let containers: Vec<NamedRecord> = self.list(&["container", "list", "--all"]).await?;
        Ok(containers.into_iter().map(|c| c.name).collect())
    }

    async fn container_metadata(&self, container: &str) -> Result<HashMap<String, String>> {
        let details: ContainerDetails = self.json(&["container", "show", container]).await?;
        Ok(details.properties)
    }

    async fn list_objects(&self, container: &str, marker: Option<&str>) -> Result<Vec<String>> {
        let mut args = vec!["object", "list", container, "--limit", OBJECT_PAGE];
        if let Some(marker) = marker {
            args.extend(["--marker", marker]);
        }
        let objects: Vec<NamedRecord> = self.list(&args).await?;
        Ok(objects.into_iter().map(|o| o.name).collect())
    }

    /// Deletes a prefix of `objects` in one command. When the command fails
    /// the prefix is retried object by object so the result can tell
    /// deleted, missing and refused objects apart.
    async fn bulk_delete(&self, container: &str, objects: &[String]) -> Result<BulkDeleteResult> {
        let chunk = &objects[..objects.len().min(OBJECT_DELETE_CHUNK)];
        let mut result = BulkDeleteResult::default();
        if chunk.is_empty() {
            return Ok(result);
        }

        let mut args = vec!["object", "delete", container];
        args.extend(chunk.iter().map(String::as_str));
        match self.exec(&args).await {
            Ok(()) => {
                result.number_deleted = chunk.len();
                return Ok(result);
            }
            Err(OpenStackError::CliNotFound) => return Err(OpenStackError::CliNotFound.into()),
            Err(e) => debug!(container, error = %e, "Bulk object delete failed, deleting one by one"),
        }

        for name in chunk {
            match self.exec(&["object", "delete", container, name.as_str()]).await {
                Ok(()) => result.number_deleted += 1,
                Err(OpenStackError::NotFound(_)) => result.number_not_found += 1,
                Err(e) => result.errors.push((name.clone(), e.to_string())),
            }
        }
        Ok(result)
    }

    async fn delete_container(&self, container: &str) -> Result<()> {
        Ok(self.exec(&["container", "delete", container]).await?)
    }
}

#[derive(Debug, Deserialize)]
struct LoadBalancerRecord {
    id: String,
}

#[async_trait]
impl LoadBalancerApi for OpenStackCli {
    /// The listing lacks the description and VIP port, so each balancer is
    /// shown individually.
    async fn list_load_balancers(&self, vip_network_id: Option<&str>) -> Result<Vec<LoadBalancer>> {
        let mut args = vec!["loadbalancer", "list"];
        if let Some(network_id) = vip_network_id {
            args.extend(["--vip-network-id", network_id]);
        }
        let records: Vec<LoadBalancerRecord> = self.list(&args).await?;

        let mut lbs = Vec::with_capacity(records.len());
        for record in records {
            match self
                .json::<LoadBalancer, _>(&["loadbalancer", "show", record.id.as_str()])
                .await
            {
                Ok(lb) => lbs.push(lb),
                Err(OpenStackError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(lbs)
    }

    async fn delete_load_balancer(&self, id: &str, cascade: bool) -> Result<()> {
        let mut args = vec!["loadbalancer", "delete"];
        if cascade {
            args.push("--cascade");
        }
        args.push(id);
        Ok(self.exec(&args).await?)
    }
}
