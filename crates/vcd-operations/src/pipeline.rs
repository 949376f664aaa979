use tracing::debug;
use vcd_core::ProvisionState;
use vcd_saga::{Saga, SagaAuditLog, SagaBuilder, SagaStep};

use crate::context::StepContext;
use crate::traits::RemoteEntityGateway;
use crate::{OperationError, Result};

type ProvisionSaga<G> = Saga<ProvisionState, StepContext<G>, OperationError>;

/// An ordered list of provisioning steps run against one [`ProvisionState`].
///
/// A failing step stops the run. Steps that already completed are rolled
/// back newest first, and the failing step's error is returned. Cancelling
/// the context's token stops the run before the next step and interrupts
/// any wait in progress.
pub struct ProvisionPipeline<G> {
    saga: ProvisionSaga<G>,
}

impl<G> ProvisionPipeline<G>
where
    G: RemoteEntityGateway + 'static,
{
    #[must_use]
    pub fn builder() -> ProvisionPipelineBuilder<G> {
        ProvisionPipelineBuilder::new()
    }

    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.saga.step_names()
    }

    /// Run every step and return the final state.
    ///
    /// # Errors
    ///
    /// Returns `SagaFailed` or `SagaCompensationFailed` wrapping the error of
    /// the step that failed. [`OperationError::step_error`] unwraps it.
    pub fn run(&self, ctx: &StepContext<G>, state: ProvisionState) -> Result<ProvisionState> {
        let (result, _audit) = self.run_with_audit(ctx, state);
        result
    }

    /// Like [`run`](Self::run), also returning the per-step audit log.
    pub fn run_with_audit(
        &self,
        ctx: &StepContext<G>,
        state: ProvisionState,
    ) -> (Result<ProvisionState>, SagaAuditLog) {
        debug!(steps = ?self.saga.step_names(), "running provisioning pipeline");
        let (result, audit) = self.saga.execute_with_audit(ctx, state);
        (result.map_err(OperationError::from), audit)
    }
}

pub struct ProvisionPipelineBuilder<G> {
    inner: SagaBuilder<ProvisionState, StepContext<G>, OperationError>,
}

impl<G> ProvisionPipelineBuilder<G>
where
    G: RemoteEntityGateway + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SagaBuilder::new(),
        }
    }

    #[must_use]
    pub fn step<S>(mut self, step: S) -> Self
    where
        S: SagaStep<State = ProvisionState, Context = StepContext<G>, Error = OperationError>
            + 'static,
    {
        self.inner = self.inner.step(step);
        self
    }

    #[must_use]
    pub fn build(self) -> ProvisionPipeline<G> {
        let saga = self
            .inner
            .with_interrupt(|ctx: &StepContext<G>| {
                ctx.cancellation()
                    .is_cancelled()
                    .then_some(OperationError::Cancelled)
            })
            .build();
        ProvisionPipeline { saga }
    }
}

impl<G> Default for ProvisionPipelineBuilder<G>
where
    G: RemoteEntityGateway + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
