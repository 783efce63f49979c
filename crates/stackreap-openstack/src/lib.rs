//! OpenStack provider for stackreap
//!
//! Implements the `stackreap-cloud` service traits on top of the
//! `openstack` command line client.
//!
//! # Requirements
//!
//! - `python-openstackclient` must be installed, with the Octavia and
//!   Manila plugins when those services are deployed
//! - Credentials come from `clouds.yaml` (`--cloud`) or `OS_*` variables
//!
//! # Example
//!
//! ```ignore
//! use stackreap_cloud::CloudConnector;
//! use stackreap_openstack::{OpenStackCli, OpenStackConnector};
//!
//! let connector = OpenStackConnector::new(OpenStackCli::new(Some("mycloud".into())));
//!
//! let auth = connector.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let servers = connector.compute().await?.list_servers().await?;
//! ```

pub mod cli;
pub mod compute;
pub mod error;
pub mod network;
pub mod provider;
pub mod storage;

#[cfg(all(test, unix))]
mod testing;

pub use cli::{CatalogEntry, OpenStackCli, TokenInfo};
pub use error::{OpenStackError, Result};
pub use provider::OpenStackConnector;
