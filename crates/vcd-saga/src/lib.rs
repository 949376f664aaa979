//! Saga pattern for multi-step provisioning runs.
//!
//! A [`Saga`] executes an ordered list of steps against one mutable state
//! value. Steps communicate only through that state. If a step fails, every
//! step that already completed is compensated in reverse order before the
//! original failure is reported.

mod audit;
mod builder;
mod error;
mod saga;
mod step;

pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use builder::SagaBuilder;
pub use error::{CompensationError, SagaError};
pub use saga::Saga;
pub use step::SagaStep;
