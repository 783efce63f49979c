//! OpenStack connector

use crate::cli::OpenStackCli;
use crate::error::OpenStackError;
use async_trait::async_trait;
use stackreap_cloud::{
    AuthStatus, BlockStorageApi, CloudConnector, CloudError, ComputeApi, ImageApi,
    LoadBalancerApi, NetworkApi, ObjectStoreApi, ShareApi,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

const LOAD_BALANCER: &[&str] = &["load-balancer"];
const OBJECT_STORE: &[&str] = &["object-store"];
const SHARED_FILE_SYSTEM: &[&str] = &["sharev2", "shared-file-system"];

/// Hands out the CLI as every service client.
///
/// Optional services are looked up in the service catalog first, so a
/// cloud without Octavia, Swift or Manila reports
/// [`CloudError::EndpointNotFound`] instead of failing each command.
pub struct OpenStackConnector {
    cli: Arc<OpenStackCli>,
    catalog: OnceCell<Vec<String>>,
}

impl OpenStackConnector {
    pub fn new(cli: OpenStackCli) -> Self {
        Self {
            cli: Arc::new(cli),
            catalog: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &OpenStackCli {
        &self.cli
    }

    /// Service types of the catalog, fetched once.
    async fn service_types(&self) -> stackreap_cloud::Result<&[String]> {
        let types = self
            .catalog
            .get_or_try_init(|| async {
                let entries = self.cli.catalog().await?;
                debug!(services = entries.len(), "Loaded service catalog");
                Ok::<_, OpenStackError>(entries.into_iter().map(|e| e.service_type).collect())
            })
            .await?;
        Ok(types)
    }

    async fn optional_service(&self, accepted: &[&str]) -> stackreap_cloud::Result<Arc<OpenStackCli>> {
        let types = self.service_types().await?;
        if types.iter().any(|t| accepted.contains(&t.as_str())) {
            Ok(self.cli.clone())
        } else {
            Err(CloudError::EndpointNotFound(accepted[0].to_string()))
        }
    }
}

#[async_trait]
impl CloudConnector for OpenStackConnector {
    fn name(&self) -> &str {
        "openstack"
    }

    async fn check_auth(&self) -> stackreap_cloud::Result<AuthStatus> {
        match self.cli.token_issue().await {
            Ok(token) => {
                let account_info = match (token.project_id, self.cli.cloud()) {
                    (Some(project), Some(cloud)) => format!("project {project} (cloud {cloud})"),
                    (Some(project), None) => format!("project {project}"),
                    (None, Some(cloud)) => format!("cloud {cloud}"),
                    (None, None) => "Unknown".to_string(),
                };
                Ok(AuthStatus::ok(account_info))
            }
            Err(OpenStackError::CliNotFound) => {
                Ok(AuthStatus::failed(OpenStackError::CliNotFound.to_string()))
            }
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn compute(&self) -> stackreap_cloud::Result<Arc<dyn ComputeApi>> {
        Ok(self.cli.clone())
    }

    async fn network(&self) -> stackreap_cloud::Result<Arc<dyn NetworkApi>> {
        Ok(self.cli.clone())
    }

    async fn block_storage(&self) -> stackreap_cloud::Result<Arc<dyn BlockStorageApi>> {
        Ok(self.cli.clone())
    }

    async fn image(&self) -> stackreap_cloud::Result<Arc<dyn ImageApi>> {
        Ok(self.cli.clone())
    }

    async fn load_balancer(&self) -> stackreap_cloud::Result<Arc<dyn LoadBalancerApi>> {
        Ok(self.optional_service(LOAD_BALANCER).await?)
    }

    async fn object_store(&self) -> stackreap_cloud::Result<Arc<dyn ObjectStoreApi>> {
        Ok(self.optional_service(OBJECT_STORE).await?)
    }

    async fn shared_file_system(&self) -> stackreap_cloud::Result<Arc<dyn ShareApi>> {
        Ok(self.optional_service(SHARED_FILE_SYSTEM).await?)
    }
}
