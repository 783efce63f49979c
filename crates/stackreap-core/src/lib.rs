//! stackreap core
//!
//! The deletion engine: cluster ownership filter, the per-kind deletion
//! tasks, their retry loop, and the orchestrator that sequences them.
//!
//! ```no_run
//! # async fn demo(connector: std::sync::Arc<dyn stackreap_cloud::CloudConnector>) -> stackreap_core::Result<()> {
//! let tags = [("openshiftClusterID".to_string(), "mycluster-x7k2p".to_string())].into();
//! let settings = stackreap_config::Settings::default();
//! let teardown = stackreap_core::Teardown::new(connector, tags, "mycluster-x7k2p", settings)?;
//! let report = teardown.run().await?;
//! println!("{} tasks finished", report.tasks.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod objects;
pub mod orchestrator;
pub mod pool;
pub mod retry;
pub mod task;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use error::{DestroyError, Result};
pub use filter::{Filter, ResourceHandle, filter_objects};
pub use orchestrator::{Phase, TaskReport, Teardown, TeardownReport};
pub use retry::{RetryPolicy, retry};
pub use task::{Completion, DeletionTask, TaskContext};
pub use tasks::parallel_tasks;
