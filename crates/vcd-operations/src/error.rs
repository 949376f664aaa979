use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use vcd_core::{Entity, EntityKind, Href, LinkRel, Task};
use vcd_poll::{PollConfigError, PollError};
use vcd_saga::SagaError;

/// Details about a failed compensation during pipeline rollback.
#[derive(Debug)]
pub struct CompensationFailure {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The error that occurred during compensation.
    pub error: Box<OperationError>,
}

/// Last state observed by a wait that timed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollSnapshot {
    Entity(Box<Entity>),
    Task(Box<Task>),
}

impl PollSnapshot {
    #[must_use]
    pub fn href(&self) -> &Href {
        match self {
            Self::Entity(entity) => &entity.href,
            Self::Task(task) => &task.href,
        }
    }
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Core(#[from] vcd_core::CoreError),

    #[error("{kind} '{reference}' not found")]
    ObjectNotFound { kind: EntityKind, reference: String },

    #[error("{kind} '{name}' has no '{rel}' link")]
    MissingLink {
        kind: EntityKind,
        name: String,
        rel: LinkRel,
    },

    #[error("timed out after {attempts} attempt(s) in {elapsed:?} waiting for '{}'", last.href())]
    PollTimeout {
        attempts: u32,
        elapsed: Duration,
        last: PollSnapshot,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("remote call '{operation}' failed: {message}")]
    RemoteCallFailed { operation: String, message: String },

    #[error("failed to read config file '{path}'")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config")]
    ConfigSyntax(#[from] toml::de::Error),

    #[error("invalid poll settings")]
    InvalidConfig(#[from] PollConfigError),

    #[error("provisioning pipeline failed at step '{step}'")]
    SagaFailed {
        step: String,
        #[source]
        source: Box<OperationError>,
    },

    #[error(
        "provisioning pipeline failed at step '{step}' and {} compensation(s) also failed", compensation_failures.len()
    )]
    SagaCompensationFailed {
        step: String,
        source: Box<OperationError>,
        compensation_failures: Vec<CompensationFailure>,
    },
}

pub type Result<T> = std::result::Result<T, OperationError>;

impl OperationError {
    /// Shorthand for `RemoteCallFailed`, for gateway implementations.
    #[must_use]
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteCallFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// The error that stopped a pipeline, looking through the saga wrappers.
    ///
    /// Errors that did not come out of a pipeline are returned unchanged.
    #[must_use]
    pub fn step_error(&self) -> &OperationError {
        match self {
            Self::SagaFailed { source, .. } | Self::SagaCompensationFailed { source, .. } => {
                source.step_error()
            }
            other => other,
        }
    }

    /// Map a failed wait, turning a timed-out snapshot into a [`PollSnapshot`].
    pub(crate) fn from_poll<T: Debug>(
        err: PollError<T, OperationError>,
        snapshot: impl FnOnce(T) -> PollSnapshot,
    ) -> Self {
        match err {
            PollError::Timeout {
                last,
                attempts,
                elapsed,
            } => Self::PollTimeout {
                attempts,
                elapsed,
                last: snapshot(last),
            },
            PollError::Cancelled { .. } => Self::Cancelled,
            PollError::Reload(source) => source,
        }
    }

    /// Compensation failures attached to a pipeline failure.
    #[must_use]
    pub fn compensation_failures(&self) -> &[CompensationFailure] {
        match self {
            Self::SagaCompensationFailed {
                compensation_failures,
                ..
            } => compensation_failures,
            _ => &[],
        }
    }
}

impl From<PollError<Entity, OperationError>> for OperationError {
    fn from(err: PollError<Entity, OperationError>) -> Self {
        Self::from_poll(err, |last| PollSnapshot::Entity(Box::new(last)))
    }
}

impl From<PollError<Task, OperationError>> for OperationError {
    fn from(err: PollError<Task, OperationError>) -> Self {
        Self::from_poll(err, |last| PollSnapshot::Task(Box::new(last)))
    }
}

impl From<SagaError<OperationError>> for OperationError {
    fn from(err: SagaError<OperationError>) -> Self {
        match err {
            SagaError::StepFailed { step, source } => Self::SagaFailed {
                step,
                source: Box::new(source),
            },
            SagaError::CompensationFailed {
                failed_step,
                step_error,
                compensation_errors,
            } => {
                let compensation_failures = compensation_errors
                    .into_iter()
                    .map(|e| CompensationFailure {
                        step: e.step,
                        description: e.description,
                        error: Box::new(e.error),
                    })
                    .collect();
                Self::SagaCompensationFailed {
                    step: failed_step,
                    source: Box::new(step_error),
                    compensation_failures,
                }
            }
        }
    }
}
