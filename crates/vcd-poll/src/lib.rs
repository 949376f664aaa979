//! Blocking wait primitive for eventually consistent remote state.
//!
//! [`Poller::wait_until`] re-reads a remote snapshot until a predicate holds,
//! sleeping between reads, giving up after a configured timeout, and
//! returning early when its [`CancellationToken`] is cancelled.

mod cancel;
mod config;
mod error;
mod poller;

pub use cancel::CancellationToken;
pub use config::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT, PollConfig};
pub use error::{PollConfigError, PollError};
pub use poller::Poller;
