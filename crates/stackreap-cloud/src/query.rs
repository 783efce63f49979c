//! Server-side list filters

/// Tag based selection of networking resources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagQuery {
    /// No filtering.
    #[default]
    All,
    /// Resources carrying at least one of these `key=value` tags.
    Any(Vec<String>),
    /// Resources carrying every one of these tags.
    Every(Vec<String>),
}

impl TagQuery {
    /// Client-side evaluation of the query against a tag list.
    pub fn matches(&self, tags: &[String]) -> bool {
        match self {
            TagQuery::All => true,
            TagQuery::Any(wanted) => wanted.iter().any(|t| tags.contains(t)),
            TagQuery::Every(wanted) => wanted.iter().all(|t| tags.contains(t)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortQuery {
    Tags(TagQuery),
    Network(String),
    Device(String),
    /// The port holding `ip_address` on `subnet_id`.
    FixedIp {
        subnet_id: String,
        ip_address: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloatingIpQuery {
    Tags(TagQuery),
    Port(String),
    Router(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrunkQuery {
    Tags(TagQuery),
    /// Trunks whose parent is this port.
    Port(String),
}

/// Neutron resource collections supporting tag removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedResource {
    Network,
    Port,
}

impl TaggedResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaggedResource::Network => "networks",
            TaggedResource::Port => "ports",
        }
    }
}
