//! Typed resource records returned by the provider services
//!
//! Field aliases accept both the list (`"ID"`, `"Name"`) and show
//! (`"id"`, `"name"`) spellings produced by the OpenStack CLI.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(
        alias = "Properties",
        alias = "properties",
        default,
        deserialize_with = "string_map"
    )]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerGroup {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedIp {
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Port {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Network ID", default)]
    pub network_id: String,
    #[serde(alias = "Device ID", default)]
    pub device_id: String,
    #[serde(alias = "Fixed IP Addresses", default)]
    pub fixed_ips: Vec<FixedIp>,
    #[serde(
        alias = "Security Groups",
        alias = "security_group_ids",
        default,
        deserialize_with = "string_list"
    )]
    pub security_groups: Vec<String>,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

impl Port {
    pub fn with_tags(id: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            id: id.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatingIp {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Floating IP Address", default)]
    pub floating_ip_address: String,
    #[serde(alias = "Port", default)]
    pub port_id: Option<String>,
    #[serde(alias = "Router", default)]
    pub router_id: Option<String>,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Router {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Subnets", default, deserialize_with = "string_list")]
    pub subnets: Vec<String>,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Network", default)]
    pub network_id: String,
    #[serde(alias = "Gateway", default)]
    pub gateway_ip: Option<String>,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trunk {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Parent Port", default)]
    pub port_id: String,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vip_port_id: String,
    #[serde(default)]
    pub vip_network_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(
        alias = "Properties",
        alias = "properties",
        default,
        deserialize_with = "string_map"
    )]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeSnapshot {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(
        alias = "Properties",
        alias = "properties",
        default,
        deserialize_with = "string_map"
    )]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Share {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareSnapshot {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Share ID", default)]
    pub share_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Tags", default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

/// Outcome of one bulk object delete call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteResult {
    pub number_deleted: usize,
    pub number_not_found: usize,
    /// `(object name, reason)` pairs for objects the service refused to delete.
    pub errors: Vec<(String, String)>,
}

impl BulkDeleteResult {
    /// Number of objects from the front of the batch the service handled.
    pub fn processed(&self) -> usize {
        self.number_deleted + self.number_not_found
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<String>),
    Str(String),
    Null,
}

/// Accepts either a JSON array or a comma separated string.
pub fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items,
        ListOrString::Str(s) => s
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        ListOrString::Null => Vec::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrString {
    Map(HashMap<String, serde_json::Value>),
    Str(String),
    Null,
}

/// Accepts either a JSON object or the CLI's `key='value', key2='value2'` rendering.
pub fn string_map<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match MapOrString::deserialize(deserializer)? {
        MapOrString::Map(map) => map
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect(),
        MapOrString::Str(s) => parse_properties(&s),
        MapOrString::Null => HashMap::new(),
    })
}

fn parse_properties(raw: &str) -> HashMap<String, String> {
    raw.split(", ")
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| {
            (
                k.trim().to_string(),
                v.trim().trim_matches('\'').to_string(),
            )
        })
        .collect()
}
