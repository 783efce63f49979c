//! Which cluster to tear down, and on which cloud

use anyhow::{Context, bail};
use clap::Args;
use stackreap_config::ClusterMetadata;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Installer metadata.json providing infraID, cloud and cluster tags
    #[arg(short, long, value_name = "PATH")]
    pub metadata: Option<PathBuf>,

    /// Entry of clouds.yaml to use
    #[arg(long, env = "OS_CLOUD")]
    pub cloud: Option<String>,

    /// Infrastructure ID (prefix of the cluster's resource names)
    #[arg(long)]
    pub infra_id: Option<String>,

    /// Ownership tag as KEY=VALUE; repeatable, overrides metadata.json
    #[arg(short, long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,
}

/// A fully resolved teardown target.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub cloud: Option<String>,
    pub infra_id: String,
    pub tags: BTreeMap<String, String>,
}

impl TargetArgs {
    /// Merges metadata.json with the flags; flags win.
    ///
    /// Without an explicit infra ID the value of the cluster ID tag is used.
    pub fn resolve(&self, cluster_id_key: &str) -> anyhow::Result<Target> {
        let metadata = match &self.metadata {
            Some(path) => {
                let metadata = ClusterMetadata::load(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                tracing::debug!(path = %path.display(), infra_id = %metadata.infra_id, "Loaded cluster metadata");
                metadata
            }
            None => ClusterMetadata::default(),
        };

        let mut tags = metadata.openstack.identifier;
        tags.extend(self.tags.iter().cloned());
        if tags.is_empty() {
            bail!("no cluster tags given: pass --metadata or --tag {cluster_id_key}=<id>");
        }

        let cloud = self
            .cloud
            .clone()
            .or_else(|| Some(metadata.openstack.cloud).filter(|c| !c.is_empty()));

        let infra_id = match &self.infra_id {
            Some(id) => id.clone(),
            None if !metadata.infra_id.is_empty() => metadata.infra_id,
            None => match tags
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(cluster_id_key))
            {
                Some((_, id)) => id.clone(),
                None => bail!("cannot determine the infra ID: pass --infra-id"),
            },
        };

        Ok(Target {
            cloud,
            infra_id,
            tags,
        })
    }
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
