//! Cluster metadata written by the installer (`metadata.json`)

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(rename = "infraID", default)]
    pub infra_id: String,
    #[serde(default)]
    pub openstack: OpenStackMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenStackMetadata {
    /// Entry in `clouds.yaml`.
    #[serde(default)]
    pub cloud: String,
    /// Tags identifying the cluster's resources.
    #[serde(default)]
    pub identifier: BTreeMap<String, String>,
}

impl ClusterMetadata {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::MetadataNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let metadata: ClusterMetadata = serde_json::from_str(&content)?;
        Ok(metadata)
    }

    /// Fails when a value required for teardown is missing.
    pub fn validate(&self) -> Result<()> {
        if self.infra_id.is_empty() {
            return Err(ConfigError::InvalidMetadata("infraID is empty".to_string()));
        }
        if self.openstack.identifier.is_empty() {
            return Err(ConfigError::InvalidMetadata(
                "openstack.identifier has no tags".to_string(),
            ));
        }
        Ok(())
    }
}
