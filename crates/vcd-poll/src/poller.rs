use std::fmt::Debug;
use std::time::Instant;

use tracing::{debug, trace};

use crate::cancel::CancellationToken;
use crate::config::PollConfig;
use crate::error::PollError;

/// Re-reads remote state until a predicate holds.
///
/// Every iteration performs exactly one call to the reload function and
/// nothing else, so a poll loop never mutates remote state. Cloning a
/// poller shares its cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    config: PollConfig,
    cancellation: CancellationToken,
}

impl Poller {
    #[must_use]
    pub fn new(config: PollConfig, cancellation: CancellationToken) -> Self {
        Self {
            config,
            cancellation,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Reload until `ready` accepts the snapshot, then return that snapshot.
    ///
    /// Sleeps for the configured interval between reloads, never past the
    /// deadline. Cancellation is checked before every reload and interrupts
    /// the sleep.
    ///
    /// # Errors
    ///
    /// - `PollError::Timeout` carrying the last snapshot when the timeout elapses
    /// - `PollError::Cancelled` when the token is cancelled
    /// - `PollError::Reload` when the reload function fails
    pub fn wait_until<T, E, R, P>(&self, mut reload: R, ready: P) -> Result<T, PollError<T, E>>
    where
        T: Debug,
        E: Debug,
        R: FnMut() -> Result<T, E>,
        P: Fn(&T) -> bool,
    {
        let start = Instant::now();
        // A timeout too large for `Instant` means no deadline at all.
        let deadline = start.checked_add(self.config.timeout());
        let mut attempts: u32 = 0;

        loop {
            if self.cancellation.is_cancelled() {
                debug!(attempts, "wait cancelled");
                return Err(PollError::Cancelled { attempts });
            }

            attempts = attempts.saturating_add(1);
            let snapshot = reload().map_err(PollError::Reload)?;
            if ready(&snapshot) {
                debug!(attempts, elapsed = ?start.elapsed(), "wait condition met");
                return Ok(snapshot);
            }

            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                let elapsed = now - start;
                debug!(attempts, ?elapsed, "wait timed out");
                return Err(PollError::Timeout {
                    last: snapshot,
                    attempts,
                    elapsed,
                });
            }

            let pause = deadline.map_or(self.config.interval(), |deadline| {
                self.config.interval().min(deadline - now)
            });
            trace!(attempts, ?pause, "condition not met, sleeping");
            if self.cancellation.wait_timeout(pause) {
                debug!(attempts, "wait cancelled");
                return Err(PollError::Cancelled { attempts });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;

    fn fast_poller(timeout_ms: u64) -> Poller {
        let config = PollConfig::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(1),
        )
        .expect("valid config");
        Poller::new(config, CancellationToken::new())
    }

    #[test]
    fn returns_first_snapshot_when_already_ready() {
        let poller = fast_poller(1_000);
        let reloads = Cell::new(0);

        let result: Result<u32, PollError<u32, ()>> = poller.wait_until(
            || {
                reloads.set(reloads.get() + 1);
                Ok(7)
            },
            |value| *value == 7,
        );

        assert_eq!(result.expect("ready immediately"), 7);
        assert_eq!(reloads.get(), 1);
    }

    #[test]
    fn reload_error_ends_the_wait() {
        let poller = fast_poller(1_000);

        let result: Result<u32, PollError<u32, &str>> =
            poller.wait_until(|| Err("connection reset"), |_| true);

        assert!(matches!(result, Err(PollError::Reload("connection reset"))));
    }

    #[test]
    fn timeout_carries_last_snapshot() {
        let poller = fast_poller(20);
        let reloads = Cell::new(0_u32);

        let result: Result<u32, PollError<u32, ()>> = poller.wait_until(
            || {
                reloads.set(reloads.get() + 1);
                Ok(reloads.get())
            },
            |_| false,
        );

        match result {
            Err(PollError::Timeout { last, attempts, .. }) => {
                assert_eq!(attempts, reloads.get());
                assert_eq!(last, reloads.get());
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn timeout_beyond_clock_range_still_polls() {
        let config = PollConfig::new(Duration::from_secs(u64::MAX), Duration::from_millis(1))
            .expect("valid config");
        let poller = Poller::new(config, CancellationToken::new());
        let reloads = Cell::new(0_u32);

        let result: Result<u32, PollError<u32, ()>> = poller.wait_until(
            || {
                reloads.set(reloads.get() + 1);
                Ok(reloads.get())
            },
            |value| *value == 3,
        );

        assert_eq!(result.expect("ready on third reload"), 3);
    }

    #[test]
    fn cancelled_token_prevents_any_reload() {
        let poller = fast_poller(1_000);
        poller.cancellation().cancel();
        let reloads = Cell::new(0);

        let result: Result<u32, PollError<u32, ()>> = poller.wait_until(
            || {
                reloads.set(reloads.get() + 1);
                Ok(0)
            },
            |_| true,
        );

        assert!(matches!(result, Err(PollError::Cancelled { attempts: 0 })));
        assert_eq!(reloads.get(), 0);
    }
}
