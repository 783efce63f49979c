//! Cluster ownership filter and client-side tag matching

use crate::error::{DestroyError, Result};
use std::collections::{BTreeMap, HashMap};

/// The tags that mark a resource as belonging to one cluster.
///
/// Keys are unique and matching is exact. The cluster ID is resolved once at
/// construction from the key that equals `cluster_id_key` ignoring ASCII case;
/// a filter carrying two case variants of that key is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    tags: BTreeMap<String, String>,
    cluster_key: String,
    cluster_id: String,
}

impl Filter {
    pub fn new(tags: BTreeMap<String, String>, cluster_id_key: &str) -> Result<Self> {
        let mut candidates = tags
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(cluster_id_key));

        let (cluster_key, cluster_id) = match (candidates.next(), candidates.next()) {
            (Some((k, v)), None) => (k.clone(), v.clone()),
            (None, _) => {
                return Err(DestroyError::InvalidFilter(format!(
                    "missing the {cluster_id_key} tag"
                )));
            }
            (Some(_), Some(_)) => {
                return Err(DestroyError::InvalidFilter(format!(
                    "more than one spelling of the {cluster_id_key} tag"
                )));
            }
        };

        if cluster_id.is_empty() {
            return Err(DestroyError::InvalidFilter(format!(
                "the {cluster_id_key} tag has an empty value"
            )));
        }

        Ok(Self {
            tags,
            cluster_key,
            cluster_id,
        })
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// The cluster-ID pair as a Neutron tag, spelled as in the filter.
    pub fn cluster_tag(&self) -> String {
        format!("{}={}", self.cluster_key, self.cluster_id)
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// `key=value` strings, as used by Neutron tag queries.
    pub fn tags_any(&self) -> Vec<String> {
        self.tags.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    /// True when `handle` carries every filter key with an equal value.
    pub fn matches(&self, handle: &ResourceHandle) -> bool {
        self.tags
            .iter()
            .all(|(k, v)| handle.tags.get(k).is_some_and(|found| found == v))
    }
}

/// Kind-independent projection of a provider resource used for tag matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub id: String,
    pub tags: HashMap<String, String>,
}

impl ResourceHandle {
    pub fn new(id: impl Into<String>, tags: HashMap<String, String>) -> Self {
        Self {
            id: id.into(),
            tags,
        }
    }

    /// Builds a handle from Neutron-style `key=value` tags; bare tags map to "".
    pub fn from_tag_list(id: impl Into<String>, tags: &[String]) -> Self {
        let tags = tags
            .iter()
            .map(|tag| match tag.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (tag.clone(), String::new()),
            })
            .collect();
        Self::new(id, tags)
    }
}

/// Keeps the handles whose tags contain every filter key with an exactly equal value.
pub fn filter_objects(handles: Vec<ResourceHandle>, filter: &Filter) -> Vec<ResourceHandle> {
    handles.into_iter().filter(|h| filter.matches(h)).collect()
}
