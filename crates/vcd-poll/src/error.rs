use std::fmt::Debug;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollConfigError {
    #[error("poll timeout must be greater than zero")]
    ZeroTimeout,

    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

/// Why a poll loop ended without its condition holding.
#[derive(Debug, Error)]
pub enum PollError<T: Debug, E: Debug> {
    /// The condition did not hold before the timeout elapsed.
    #[error("condition not met after {attempts} attempt(s) in {elapsed:?}")]
    Timeout {
        /// Snapshot returned by the last reload.
        last: T,
        attempts: u32,
        elapsed: Duration,
    },

    /// The wait was cancelled through its token.
    #[error("wait cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    /// Reloading the watched entity failed.
    #[error("reload failed while waiting")]
    Reload(#[source] E),
}

impl<T: Debug, E: Debug> PollError<T, E> {
    /// Number of reloads performed before the loop ended, if known.
    #[must_use]
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Timeout { attempts, .. } | Self::Cancelled { attempts } => Some(*attempts),
            Self::Reload(_) => None,
        }
    }
}
