//! stackreap cloud abstraction
//!
//! This crate describes the resource provider a teardown runs against:
//! typed records, server-side list filters and one async trait per
//! OpenStack service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 stackreap CLI                    │
//! │             (stackreap destroy)                  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                stackreap-core                    │
//! │     deletion tasks, retry, worker pools          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stackreap-cloud                    │
//! │  trait CloudConnector / ComputeApi / NetworkApi  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼────────┐
//!           │   openstack    │
//!           │  CLI provider  │
//!           └────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod query;
pub mod resource;

// Re-exports
pub use error::{CloudError, ErrorClass, Result};
pub use provider::{
    AuthStatus, BlockStorageApi, CloudConnector, ComputeApi, ImageApi, LoadBalancerApi,
    NetworkApi, ObjectStoreApi, ShareApi,
};
pub use query::{FloatingIpQuery, PortQuery, TagQuery, TaggedResource, TrunkQuery};
pub use resource::{
    BulkDeleteResult, FixedIp, FloatingIp, Image, LoadBalancer, Network, Port, Router,
    SecurityGroup, Server, ServerGroup, Share, ShareSnapshot, Subnet, Trunk, Volume,
    VolumeSnapshot,
};
