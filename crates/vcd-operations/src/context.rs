use std::sync::Arc;

use tracing::debug;
use vcd_core::{Entity, RemoteRequest, Task, TaskStatus};
use vcd_poll::{CancellationToken, Poller};

use crate::traits::RemoteEntityGateway;
use crate::{OperationError, Result};

/// Dependencies shared by every step of a provisioning run.
///
/// All remote waits go through the context's poller, so they share one
/// timeout policy and one cancellation token.
pub struct StepContext<G> {
    gateway: Arc<G>,
    poller: Poller,
}

impl<G> Clone for StepContext<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            poller: self.poller.clone(),
        }
    }
}

impl<G> StepContext<G>
where
    G: RemoteEntityGateway,
{
    pub fn new(gateway: Arc<G>, poller: Poller) -> Self {
        Self { gateway, poller }
    }

    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    #[must_use]
    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        self.poller.cancellation()
    }

    /// A copy whose waits no longer observe the run's cancellation token.
    ///
    /// Rollback runs on a detached context, so undo work still gets to wait
    /// for its tasks after the run was cancelled.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            poller: Poller::new(*self.poller.config(), CancellationToken::new()),
        }
    }

    /// Wait until `entity` has no running tasks and return its fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns `PollTimeout` or `Cancelled` if the wait ends early, the reload
    /// error if a reload fails, and `RemoteCallFailed` if one of the entity's
    /// tasks finished unsuccessfully.
    pub fn wait_entity(&self, entity: &Entity) -> Result<Entity> {
        debug!(entity = %entity.href, name = %entity.name, "waiting for running tasks");
        let settled = self.poller.wait_until(
            || self.gateway.reload(entity),
            |snapshot| !snapshot.has_running_tasks(),
        )?;

        if let Some(failed) = settled.running_tasks.iter().find(|task| !task.is_success()) {
            return Err(task_failure(failed));
        }
        Ok(settled)
    }

    /// Wait until `task` reaches a terminal status.
    ///
    /// # Errors
    ///
    /// Returns `PollTimeout` or `Cancelled` if the wait ends early, the reload
    /// error if a reload fails, and `RemoteCallFailed` if the task did not
    /// succeed.
    pub fn wait_task(&self, task: &Task) -> Result<Task> {
        debug!(task = %task.href, operation = %task.operation, "waiting for task");
        let finished = self
            .poller
            .wait_until(|| self.gateway.reload_task(task), Task::is_terminal)?;

        if finished.is_success() {
            Ok(finished)
        } else {
            Err(task_failure(&finished))
        }
    }

    /// Send `request` and block until the task it starts has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected or the task does not succeed.
    pub fn submit_and_wait(&self, request: RemoteRequest) -> Result<Task> {
        debug!(method = ?request.method, target = %request.target, "submitting request");
        let task = self.gateway.start_task(request)?;
        self.wait_task(&task)
    }
}

fn task_failure(task: &Task) -> OperationError {
    let message = task.error_message.clone().unwrap_or_else(|| {
        match task.status {
            TaskStatus::Aborted => "task aborted",
            _ => "task failed",
        }
        .to_string()
    });
    OperationError::remote(task.operation.clone(), message)
}
