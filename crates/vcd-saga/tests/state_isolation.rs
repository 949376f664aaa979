//! Independent runs never observe each other's state.

use std::collections::BTreeMap;
use std::thread;

use vcd_saga::{SagaBuilder, SagaStep};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

struct WriteKey {
    key: &'static str,
}

impl SagaStep for WriteKey {
    type State = BTreeMap<String, String>;
    type Context = String;
    type Error = TestError;

    fn name(&self) -> &'static str {
        "write_key"
    }

    fn execute(&self, run: &String, state: &mut Self::State) -> Result<(), TestError> {
        if let Some(existing) = state.get(self.key) {
            return Err(TestError(format!("{run} saw foreign value {existing}")));
        }
        state.insert(self.key.to_string(), run.clone());
        Ok(())
    }
}

#[test]
fn concurrent_runs_with_separate_state_do_not_interfere() {
    let saga = SagaBuilder::new()
        .step(WriteKey { key: "vapp" })
        .step(WriteKey { key: "vm" })
        .build();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|run| {
                let saga = &saga;
                scope.spawn(move || {
                    let ctx = format!("run-{run}");
                    saga.execute(&ctx, BTreeMap::new())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread should not panic"))
            .collect()
    });

    for (run, result) in results.into_iter().enumerate() {
        let state = result.expect("run should succeed");
        let expected = format!("run-{run}");
        assert_eq!(state.get("vapp"), Some(&expected));
        assert_eq!(state.get("vm"), Some(&expected));
    }
}
