//! Teardown tuning knobs
//!
//! Every field has a default, so an empty (or absent) settings file
//! yields the stock behavior.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retry: RetrySection,
    pub workers: WorkerSettings,
    pub cluster: ClusterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Used by every task of the parallel phase.
    pub parallel: RetrySettings,
    pub routers: RetrySettings,
    pub untag: RetrySettings,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            parallel: RetrySettings::default(),
            routers: RetrySettings::default(),
            untag: RetrySettings {
                initial_delay_secs: 10.0,
                factor: 1.0,
                steps: 25,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub initial_delay_secs: f64,
    pub factor: f64,
    /// Maximum number of invocations.
    pub steps: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: 15.0,
            factor: 1.3,
            steps: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Width of the port deletion pool.
    pub ports: usize,
    /// Concurrent bulk-delete batches per container.
    pub objects: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            ports: 10,
            objects: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub cluster_id_key: String,
    pub cinder_csi_key: String,
    pub manila_csi_key: String,
    /// Names of load-balancer security groups created by the cloud provider.
    pub managed_sg_pattern: String,
    pub leftover_lb_description_prefix: String,
    pub primary_network_tag_suffix: String,
    pub vip_port_tag_suffix: String,
    pub required_network_extensions: Vec<String>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            cluster_id_key: "openshiftClusterID".to_string(),
            cinder_csi_key: "cinder.csi.openstack.org/cluster".to_string(),
            manila_csi_key: "manila.csi.openstack.org/cluster".to_string(),
            managed_sg_pattern: r"^lb-sg-[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}".to_string(),
            leftover_lb_description_prefix: "Kubernetes external service".to_string(),
            primary_network_tag_suffix: "-primaryClusterNetwork".to_string(),
            vip_port_tag_suffix: "-dual-stack-vips-port".to_string(),
            required_network_extensions: vec!["standard-attr-tag".to_string()],
        }
    }
}
