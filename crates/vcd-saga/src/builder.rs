use std::fmt::Debug;

use crate::saga::{BoxedStep, Interrupt, Saga};
use crate::step::SagaStep;

/// Builder for constructing sagas.
///
/// Steps run in the order they are added. All steps share one state type,
/// context type and error type.
///
/// ```
/// use vcd_saga::{SagaBuilder, SagaStep};
///
/// struct Record(&'static str);
///
/// impl SagaStep for Record {
///     type State = Vec<&'static str>;
///     type Context = ();
///     type Error = String;
///
///     fn name(&self) -> &'static str {
///         self.0
///     }
///
///     fn execute(&self, _ctx: &(), state: &mut Self::State) -> Result<(), String> {
///         state.push(self.0);
///         Ok(())
///     }
/// }
///
/// let saga = SagaBuilder::new().step(Record("a")).step(Record("b")).build();
/// let state = saga.execute(&(), Vec::new()).expect("both steps succeed");
/// assert_eq!(state, vec!["a", "b"]);
/// ```
pub struct SagaBuilder<State, Ctx, Err> {
    steps: Vec<BoxedStep<State, Ctx, Err>>,
    interrupt: Option<Interrupt<Ctx, Err>>,
}

impl<State, Ctx, Err> SagaBuilder<State, Ctx, Err> {
    /// Create a new saga builder with no steps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            interrupt: None,
        }
    }

    /// Append a step to the saga.
    #[must_use]
    pub fn step<S>(mut self, step: S) -> Self
    where
        S: SagaStep<State = State, Context = Ctx, Error = Err> + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    /// Append an already boxed step, for callers that assemble steps dynamically.
    #[must_use]
    pub fn boxed_step(mut self, step: BoxedStep<State, Ctx, Err>) -> Self {
        self.steps.push(step);
        self
    }

    /// Install a check that runs against the run's context before every step.
    ///
    /// When it returns an error the pending step is not performed and the
    /// saga compensates as if that step had failed with the returned error.
    #[must_use]
    pub fn with_interrupt<F>(mut self, interrupt: F) -> Self
    where
        F: Fn(&Ctx) -> Option<Err> + Send + Sync + 'static,
    {
        self.interrupt = Some(Box::new(interrupt));
        self
    }

    /// Number of steps added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step has been added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Build the saga from the accumulated steps.
    #[must_use]
    pub fn build(self) -> Saga<State, Ctx, Err>
    where
        Err: Debug,
    {
        Saga::from_parts(self.steps, self.interrupt)
    }
}

impl<State, Ctx, Err> Default for SagaBuilder<State, Ctx, Err> {
    fn default() -> Self {
        Self::new()
    }
}
