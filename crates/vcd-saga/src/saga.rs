use std::fmt::Debug;

use tracing::{debug, warn};

use crate::audit::SagaAuditLog;
use crate::error::{CompensationError, SagaError};
use crate::step::SagaStep;

pub(crate) type BoxedStep<State, Ctx, Err> =
    Box<dyn SagaStep<State = State, Context = Ctx, Error = Err>>;

pub(crate) type Interrupt<Ctx, Err> = Box<dyn Fn(&Ctx) -> Option<Err> + Send + Sync>;

/// A compiled saga ready for execution.
///
/// Steps run strictly in order against one state value. If any step fails,
/// previously completed steps are compensated in reverse order (LIFO), and
/// every one of them gets a compensation attempt even when another
/// compensation fails.
pub struct Saga<State, Ctx, Err> {
    steps: Vec<BoxedStep<State, Ctx, Err>>,
    interrupt: Option<Interrupt<Ctx, Err>>,
}

impl<State, Ctx, Err> Saga<State, Ctx, Err>
where
    Err: Debug,
{
    pub(crate) fn from_parts(
        steps: Vec<BoxedStep<State, Ctx, Err>>,
        interrupt: Option<Interrupt<Ctx, Err>>,
    ) -> Self {
        Self { steps, interrupt }
    }

    /// Names of the steps in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Execute the saga, returning the final state on success.
    ///
    /// On failure, compensates all previously completed steps in reverse order.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if a step fails and all compensations succeed.
    /// Returns `SagaError::CompensationFailed` if a step fails and some compensations also fail.
    pub fn execute(&self, ctx: &Ctx, state: State) -> Result<State, SagaError<Err>> {
        let (result, _audit_log) = self.execute_internal(ctx, state);
        result
    }

    /// Execute the saga and return both the result and an audit log.
    ///
    /// The audit log tracks all step executions and compensations.
    pub fn execute_with_audit(
        &self,
        ctx: &Ctx,
        state: State,
    ) -> (Result<State, SagaError<Err>>, SagaAuditLog) {
        self.execute_internal(ctx, state)
    }

    fn execute_internal(
        &self,
        ctx: &Ctx,
        mut state: State,
    ) -> (Result<State, SagaError<Err>>, SagaAuditLog) {
        let mut audit_log = SagaAuditLog::new();
        let mut completed: Vec<usize> = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            audit_log.record_start(index, step.name());

            if let Some(error) = self.interrupted(ctx) {
                debug!(step = step.name(), index, "saga interrupted before step");
                audit_log.record_interrupted();
                let saga_error = self.compensate(
                    ctx,
                    &mut state,
                    &mut audit_log,
                    completed,
                    step.name(),
                    error,
                );
                return (Err(saga_error), audit_log);
            }

            debug!(step = step.name(), index, "executing saga step");
            match step.execute(ctx, &mut state) {
                Ok(()) => {
                    audit_log.record_success(step.compensation_description());
                    completed.push(index);
                }
                Err(error) => {
                    debug!(step = step.name(), index, error = ?error, "saga step failed");
                    audit_log.record_failure();
                    let saga_error = self.compensate(
                        ctx,
                        &mut state,
                        &mut audit_log,
                        completed,
                        step.name(),
                        error,
                    );
                    return (Err(saga_error), audit_log);
                }
            }
        }

        debug!(steps = self.steps.len(), "saga completed");
        (Ok(state), audit_log)
    }

    fn interrupted(&self, ctx: &Ctx) -> Option<Err> {
        self.interrupt.as_ref().and_then(|check| check(ctx))
    }

    fn compensate(
        &self,
        ctx: &Ctx,
        state: &mut State,
        audit_log: &mut SagaAuditLog,
        mut completed: Vec<usize>,
        failed_step: &str,
        step_error: Err,
    ) -> SagaError<Err> {
        let mut compensation_errors = Vec::new();

        while let Some(index) = completed.pop() {
            let step = &self.steps[index];
            let step_name = step.name();
            let description = step.compensation_description();
            debug!(step = step_name, index, %description, "compensating saga step");

            match step.compensate(ctx, state) {
                Ok(()) => {
                    audit_log.record_compensated(index);
                }
                Err(error) => {
                    warn!(step = step_name, index, error = ?error, "compensation failed");
                    audit_log.record_compensation_failed(index);
                    compensation_errors.push(CompensationError {
                        step: step_name.to_string(),
                        description,
                        error,
                    });
                }
            }
        }

        if compensation_errors.is_empty() {
            SagaError::StepFailed {
                step: failed_step.to_string(),
                source: step_error,
            }
        } else {
            SagaError::CompensationFailed {
                failed_step: failed_step.to_string(),
                step_error,
                compensation_errors,
            }
        }
    }
}
