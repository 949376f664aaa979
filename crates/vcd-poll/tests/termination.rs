//! Termination guarantees of the poll loop.

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use vcd_poll::{CancellationToken, PollConfig, PollError, Poller};

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    reload: u32,
    running_tasks: u32,
}

#[test]
fn predicate_true_after_k_iterations_takes_exactly_k_reloads() -> anyhow::Result<()> {
    for k in 1..=5_u32 {
        let config = PollConfig::new(Duration::from_secs(10), Duration::from_millis(1))?;
        let poller = Poller::new(config, CancellationToken::new());
        let reloads = Cell::new(0_u32);

        let result: Result<Snapshot, PollError<Snapshot, ()>> = poller.wait_until(
            || {
                reloads.set(reloads.get() + 1);
                Ok(Snapshot {
                    reload: reloads.get(),
                    running_tasks: k - reloads.get(),
                })
            },
            |snapshot| snapshot.running_tasks == 0,
        );

        let snapshot = result.map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(reloads.get(), k);
        assert_eq!(snapshot.reload, k);
    }
    Ok(())
}

#[test]
fn never_ready_predicate_times_out_within_timeout_plus_one_interval() -> anyhow::Result<()> {
    let timeout = Duration::from_millis(120);
    let interval = Duration::from_millis(50);
    let poller = Poller::new(PollConfig::new(timeout, interval)?, CancellationToken::new());
    let start = Instant::now();

    let result: Result<u32, PollError<u32, ()>> = poller.wait_until(|| Ok(0), |_| false);
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(PollError::Timeout { .. })));
    assert!(elapsed >= timeout, "gave up early after {elapsed:?}");
    // generous slack for slow CI schedulers
    assert!(
        elapsed <= timeout + interval + Duration::from_millis(500),
        "took {elapsed:?}"
    );
    Ok(())
}

#[test]
fn cancellation_interrupts_a_long_wait() -> anyhow::Result<()> {
    let config = PollConfig::new(Duration::from_secs(60), Duration::from_secs(30))?;
    let token = CancellationToken::new();
    let poller = Poller::new(config, token.clone());
    let start = Instant::now();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        token.cancel();
    });
    let result: Result<u32, PollError<u32, ()>> = poller.wait_until(|| Ok(0), |_| false);
    canceller.join().expect("canceller thread should not panic");

    assert!(matches!(result, Err(PollError::Cancelled { attempts: 1 })));
    assert!(start.elapsed() < Duration::from_secs(10));
    Ok(())
}
