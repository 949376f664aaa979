/// A step in a saga that can be executed and compensated.
///
/// Steps hold their own arguments and nothing else: everything a later step
/// needs is written into the shared state. Because `execute` only borrows
/// the step, a built saga can be run again.
///
/// # Type Parameters
///
/// - `State`: Mutable state shared by every step of one run
/// - `Context`: Shared dependencies (injected, not written by steps)
/// - `Error`: The error type for step failures
pub trait SagaStep: Send + Sync {
    /// State threaded through every step of a run.
    type State;

    /// Shared context providing dependencies.
    type Context;

    /// Error type for step failures.
    type Error;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Perform the step, recording anything later steps need in `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails to complete.
    fn execute(&self, ctx: &Self::Context, state: &mut Self::State) -> Result<(), Self::Error>;

    /// Compensate (undo) the step's effects.
    ///
    /// Called during rollback when a later step fails, and only for steps
    /// whose `execute()` returned `Ok`. Should remove the state entries that
    /// no longer hold once the effect is undone.
    ///
    /// The default implementation is a no-op, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails. The saga records the error and
    /// keeps compensating earlier steps.
    fn compensate(&self, ctx: &Self::Context, state: &mut Self::State) -> Result<(), Self::Error> {
        let _ = (ctx, state);
        Ok(())
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }
}
