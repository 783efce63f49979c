//! Teardown orchestration
//!
//! ```text
//!            ┌─► delete-servers ──────┐
//!            ├─► delete-ports ────────┤
//!  validate ─┼─► ...                  ├─► barrier ─► delete-routers ─► untag-primary-network
//!            └─► delete-images ───────┘
//! ```
//!
//! Every parallel task runs in its own retry loop. Routers wait for the
//! barrier because their floating IP bindings are what links a floating IP
//! to the port or load balancer being deleted. Untagging runs last since it
//! marks the teardown as complete.

use crate::error::{DestroyError, Result};
use crate::filter::Filter;
use crate::retry::{RetryPolicy, retry};
use crate::task::{DeletionTask, TaskContext};
use crate::tasks::{DeleteRouters, UntagPrimaryNetwork, parallel_tasks};
use chrono::{DateTime, Utc};
use stackreap_cloud::CloudConnector;
use stackreap_config::Settings;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parallel,
    Routers,
    Untag,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Parallel => write!(f, "parallel"),
            Phase::Routers => write!(f, "routers"),
            Phase::Untag => write!(f, "untag"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: &'static str,
    pub phase: Phase,
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct TeardownReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Parallel tasks in completion order, then the sequential phases.
    pub tasks: Vec<TaskReport>,
}

impl TeardownReport {
    pub fn total_attempts(&self) -> u32 {
        self.tasks.iter().map(|t| t.attempts).sum()
    }
}

/// Removes every resource of one cluster.
pub struct Teardown {
    ctx: TaskContext,
}

impl Teardown {
    pub fn new(
        connector: Arc<dyn CloudConnector>,
        tags: BTreeMap<String, String>,
        infra_id: impl Into<String>,
        settings: Settings,
    ) -> Result<Self> {
        let filter = Filter::new(tags, &settings.cluster.cluster_id_key)?;
        let ctx = TaskContext::new(connector, filter, settings, infra_id)?;
        Ok(Self { ctx })
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    /// Refuses clouds whose network service cannot filter on tags.
    pub async fn validate_cloud(&self) -> Result<()> {
        let to_error = |source| DestroyError::Cloud {
            task: "validate-cloud".to_string(),
            source,
        };
        let network = self.ctx.connector.network().await.map_err(to_error)?;
        let aliases = network.list_extensions().await.map_err(to_error)?;

        let missing: Vec<_> = self
            .ctx
            .settings
            .cluster
            .required_network_extensions
            .iter()
            .filter(|required| !aliases.contains(required))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(DestroyError::UnsupportedCloud(format!(
                "the network service lacks required extensions: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub async fn run(&self) -> Result<TeardownReport> {
        let started_at = Utc::now();
        self.validate_cloud().await?;
        info!(
            cluster_id = self.ctx.cluster_id(),
            infra_id = %self.ctx.infra_id,
            "Starting teardown"
        );

        let mut tasks = self.run_parallel().await?;

        info!("Deleting routers");
        let routers = RetryPolicy::from(&self.ctx.settings.retry.routers);
        tasks.push(run_task(self.ctx.clone(), Arc::new(DeleteRouters), routers, Phase::Routers).await?);

        info!("Untagging primary network");
        let untag = RetryPolicy::from(&self.ctx.settings.retry.untag);
        tasks.push(run_task(self.ctx.clone(), Arc::new(UntagPrimaryNetwork), untag, Phase::Untag).await?);

        let report = TeardownReport {
            started_at,
            finished_at: Utc::now(),
            tasks,
        };
        info!(attempts = report.total_attempts(), "Teardown complete");
        Ok(report)
    }

    /// Waits for every parallel task; the first failure cancels the rest.
    async fn run_parallel(&self) -> Result<Vec<TaskReport>> {
        let policy = RetryPolicy::from(&self.ctx.settings.retry.parallel);
        let mut set = JoinSet::new();
        for task in parallel_tasks() {
            set.spawn(run_task(self.ctx.clone(), task, policy.clone(), Phase::Parallel));
        }

        let mut reports = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            let outcome = joined.map_err(|e| DestroyError::Join {
                task: Phase::Parallel.to_string(),
                message: e.to_string(),
            });
            match outcome.and_then(|r| r) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(error = %e, "Aborting teardown");
                    set.abort_all();
                    return Err(e);
                }
            }
        }
        Ok(reports)
    }
}

async fn run_task(
    ctx: TaskContext,
    task: Arc<dyn DeletionTask>,
    policy: RetryPolicy,
    phase: Phase,
) -> Result<TaskReport> {
    let name = task.name();
    let start = Instant::now();
    let attempts = retry(name, &policy, || task.run(&ctx)).await?;
    let elapsed = start.elapsed();
    info!(task = name, attempts, "Task done in {:.1}s", elapsed.as_secs_f64());
    Ok(TaskReport {
        name,
        phase,
        attempts,
        elapsed,
    })
}
