//! Deletion task contract
//!
//! A task lists its candidates, deletes them and reports whether anything is
//! left. Tasks keep no state between invocations: each run re-discovers the
//! world, so re-running after a partial success is always safe.

use crate::error::{DestroyError, Result};
use crate::filter::Filter;
use async_trait::async_trait;
use regex::Regex;
use stackreap_cloud::{CloudConnector, CloudError, ErrorClass};
use stackreap_config::Settings;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one task invocation that did not hit an unrecoverable error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Every candidate is gone (or there were none).
    Done,
    /// Something is left; the whole task should run again later.
    /// Carries a description of what is still present.
    Pending(Vec<String>),
}

impl Completion {
    pub fn pending(reason: impl Into<String>) -> Self {
        Completion::Pending(vec![reason.into()])
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Completion::Done)
    }
}

/// One resource kind's idempotent list-filter-delete routine.
///
/// `Ok(Pending)` asks for a retry, `Err` aborts the teardown.
#[async_trait]
pub trait DeletionTask: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &TaskContext) -> Result<Completion>;
}

/// Everything a task needs, shared read-only by all tasks of a teardown.
#[derive(Clone)]
pub struct TaskContext {
    pub connector: Arc<dyn CloudConnector>,
    pub filter: Arc<Filter>,
    pub settings: Arc<Settings>,
    pub infra_id: String,
    managed_sg: Regex,
}

impl TaskContext {
    pub fn new(
        connector: Arc<dyn CloudConnector>,
        filter: Filter,
        settings: Settings,
        infra_id: impl Into<String>,
    ) -> Result<Self> {
        let managed_sg = Regex::new(&settings.cluster.managed_sg_pattern).map_err(|e| {
            DestroyError::InvalidSettings(format!("managed_sg_pattern: {e}"))
        })?;
        Ok(Self {
            connector,
            filter: Arc::new(filter),
            settings: Arc::new(settings),
            infra_id: infra_id.into(),
            managed_sg,
        })
    }

    pub fn cluster_id(&self) -> &str {
        self.filter.cluster_id()
    }

    /// Security groups the cloud provider creates for load balancers.
    pub fn is_managed_security_group(&self, name: &str) -> bool {
        self.managed_sg.is_match(name)
    }

    pub fn primary_network_tag(&self) -> String {
        format!(
            "{}{}",
            self.infra_id, self.settings.cluster.primary_network_tag_suffix
        )
    }

    pub fn vip_port_tag(&self) -> String {
        format!(
            "{}{}",
            self.cluster_id(),
            self.settings.cluster.vip_port_tag_suffix
        )
    }
}

/// Logs a failed provider call and turns it into a retry request, unless the
/// error is unrecoverable.
pub(crate) fn transient(task: &'static str, what: &str, err: CloudError) -> Result<Completion> {
    if err.is_fatal() {
        return Err(DestroyError::Cloud {
            task: task.to_string(),
            source: err,
        });
    }
    warn!(task, error = %err, "{what} failed");
    Ok(Completion::pending(format!("{what}: {err}")))
}

/// Unwraps a provider result or returns `Pending` from the enclosing task.
macro_rules! pending_on_err {
    ($task:expr, $what:expr, $call:expr) => {
        match $call {
            Ok(value) => value,
            Err(err) => return $crate::task::transient($task, $what, err),
        }
    };
}
pub(crate) use pending_on_err;

/// Counts deletions against candidates for one invocation.
#[derive(Debug)]
pub(crate) struct Tally {
    task: &'static str,
    total: usize,
    removed: usize,
    remaining: Vec<String>,
}

impl Tally {
    pub fn new(task: &'static str, total: usize) -> Self {
        Self {
            task,
            total,
            removed: 0,
            remaining: Vec::new(),
        }
    }

    pub fn removed(&mut self) {
        self.removed += 1;
    }

    pub fn left(&mut self, what: impl Into<String>) {
        self.remaining.push(what.into());
    }

    /// Drops a candidate the task decided not to touch.
    pub fn exclude(&mut self) {
        self.total = self.total.saturating_sub(1);
    }

    /// Applies the delete convention: not-found counts as deleted, conflicts and
    /// transient failures leave the resource for the next pass.
    pub fn record(
        &mut self,
        kind: &str,
        id: &str,
        result: std::result::Result<(), CloudError>,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                debug!(task = self.task, "Deleted {kind} {id:?}");
                self.removed += 1;
            }
            Err(err) => match err.class() {
                ErrorClass::NotFound => {
                    debug!(
                        task = self.task,
                        "Cannot find {kind} {id:?}. It's probably already been deleted."
                    );
                    self.removed += 1;
                }
                ErrorClass::Conflict => {
                    debug!(task = self.task, error = %err, "{kind} {id:?} is still in use");
                    self.remaining.push(format!("{kind} {id}"));
                }
                ErrorClass::Transient => {
                    warn!(task = self.task, error = %err, "Deleting {kind} {id:?} failed");
                    self.remaining.push(format!("{kind} {id}"));
                }
                ErrorClass::Fatal => {
                    return Err(DestroyError::Cloud {
                        task: self.task.to_string(),
                        source: err,
                    });
                }
            },
        }
        Ok(())
    }

    pub fn finish(self) -> Completion {
        if self.removed == self.total {
            Completion::Done
        } else {
            Completion::Pending(self.remaining)
        }
    }
}
