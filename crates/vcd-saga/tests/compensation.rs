//! Integration tests for saga compensation ordering.

use std::cell::RefCell;

use vcd_saga::{SagaBuilder, SagaError, SagaStep, StepStatus};

#[derive(Default)]
struct CallLog {
    calls: RefCell<Vec<String>>,
}

impl CallLog {
    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

/// Succeeds unless `fail` is set; logs every perform and rollback.
struct TrackedStep {
    name: &'static str,
    fail: bool,
}

impl SagaStep for TrackedStep {
    type State = Vec<&'static str>;
    type Context = CallLog;
    type Error = TestError;

    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, ctx: &CallLog, state: &mut Self::State) -> Result<(), TestError> {
        ctx.calls.borrow_mut().push(format!("perform {}", self.name));
        if self.fail {
            return Err(TestError(format!("{} failed", self.name)));
        }
        state.push(self.name);
        Ok(())
    }

    fn compensate(&self, ctx: &CallLog, state: &mut Self::State) -> Result<(), TestError> {
        ctx.calls.borrow_mut().push(format!("rollback {}", self.name));
        state.retain(|entry| *entry != self.name);
        Ok(())
    }
}

const NAMES: [&str; 5] = ["s1", "s2", "s3", "s4", "s5"];

#[test]
fn failing_step_k_rolls_back_exactly_the_earlier_steps_in_reverse() {
    for failing in 0..NAMES.len() {
        let ctx = CallLog::default();
        let mut builder = SagaBuilder::new();
        for (index, name) in NAMES.iter().enumerate() {
            builder = builder.step(TrackedStep {
                name: *name,
                fail: index == failing,
            });
        }
        let saga = builder.build();

        let result = saga.execute(&ctx, Vec::new());

        let err = result.expect_err("step should fail");
        assert_eq!(err.failed_step(), NAMES[failing]);

        let mut expected: Vec<String> = NAMES[..=failing]
            .iter()
            .map(|name| format!("perform {name}"))
            .collect();
        expected.extend(
            NAMES[..failing]
                .iter()
                .rev()
                .map(|name| format!("rollback {name}")),
        );
        assert_eq!(ctx.calls(), expected, "failing step index {failing}");
    }
}

#[test]
fn steps_after_the_failure_are_never_performed() {
    let ctx = CallLog::default();
    let saga = SagaBuilder::new()
        .step(TrackedStep {
            name: "instantiate",
            fail: false,
        })
        .step(TrackedStep {
            name: "insert_media",
            fail: true,
        })
        .step(TrackedStep {
            name: "power_on",
            fail: false,
        })
        .build();

    let (result, audit_log) = saga.execute_with_audit(&ctx, Vec::new());

    assert!(result.is_err());
    assert!(!ctx.calls().iter().any(|call| call.contains("power_on")));
    let records = audit_log.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, StepStatus::Compensated);
    assert_eq!(records[1].status, StepStatus::Failed);
}

#[test]
fn failed_step_itself_is_not_rolled_back() {
    let ctx = CallLog::default();
    let saga = SagaBuilder::new()
        .step(TrackedStep {
            name: "only",
            fail: true,
        })
        .build();

    let err = saga
        .execute(&ctx, Vec::new())
        .expect_err("step should fail");

    assert!(matches!(err, SagaError::StepFailed { .. }));
    assert_eq!(ctx.calls(), vec!["perform only"]);
}

#[test]
fn successful_run_returns_final_state_without_rollback() -> anyhow::Result<()> {
    let ctx = CallLog::default();
    let saga = SagaBuilder::new()
        .step(TrackedStep {
            name: "a",
            fail: false,
        })
        .step(TrackedStep {
            name: "b",
            fail: false,
        })
        .build();

    let state = saga.execute(&ctx, vec!["seed"])?;

    assert_eq!(state, vec!["seed", "a", "b"]);
    assert!(!ctx.calls().iter().any(|call| call.starts_with("rollback")));
    Ok(())
}
