mod error;

pub mod config;
pub mod context;
pub mod pipeline;
pub mod steps;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{CompensationFailure, OperationError, PollSnapshot, Result};
