use std::time::{Duration, Instant};

/// Outcome of one step within a saga run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Performed and not undone.
    Executed,
    /// The step that stopped the run.
    Failed,
    /// Skipped because the run was interrupted before it.
    Interrupted,
    /// Performed, then undone.
    Compensated,
    /// Performed, and its undo returned an error.
    CompensationFailed,
}

impl StepStatus {
    fn symbol(self) -> &'static str {
        match self {
            Self::Executed => "✓",
            Self::Failed => "✗",
            Self::Interrupted => "⏹",
            Self::Compensated => "↩",
            Self::CompensationFailed => "⚠",
        }
    }
}

#[derive(Debug)]
pub struct StepRecord {
    /// Position of the step in the saga. Names need not be unique.
    pub index: usize,
    pub name: String,
    pub status: StepStatus,
    pub started_at: Instant,
    /// Set when the step finished or was last compensated.
    pub completed_at: Option<Instant>,
    /// What undoing the step does, recorded once the step succeeded.
    pub compensation_description: Option<String>,
}

impl StepRecord {
    /// Time from start until the last status change, if there was one.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at
            .map(|completed| completed.duration_since(self.started_at))
    }
}

/// Per-step record of a saga run, in execution order.
///
/// Steps that never started do not appear.
#[derive(Debug, Default)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
}

impl SagaAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, index: usize, name: &str) {
        self.records.push(StepRecord {
            index,
            name: name.to_string(),
            status: StepStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
            compensation_description: None,
        });
    }

    pub(crate) fn record_failure(&mut self) {
        self.finish_last(StepStatus::Failed);
    }

    pub(crate) fn record_interrupted(&mut self) {
        self.finish_last(StepStatus::Interrupted);
    }

    pub(crate) fn record_success(&mut self, compensation_description: String) {
        self.finish_last(StepStatus::Executed);
        if let Some(record) = self.records.last_mut() {
            record.compensation_description = Some(compensation_description);
        }
    }

    pub(crate) fn record_compensated(&mut self, index: usize) {
        self.update(index, StepStatus::Compensated);
    }

    pub(crate) fn record_compensation_failed(&mut self, index: usize) {
        self.update(index, StepStatus::CompensationFailed);
    }

    fn finish_last(&mut self, status: StepStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    fn update(&mut self, index: usize, status: StepStatus) {
        if let Some(record) = self.records.iter_mut().find(|r| r.index == index) {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// The step that stopped the run, if any.
    #[must_use]
    pub fn stopped_at(&self) -> Option<&StepRecord> {
        self.records
            .iter()
            .find(|r| matches!(r.status, StepStatus::Failed | StepStatus::Interrupted))
    }

    /// One line per step, e.g. `1 ↩ instantiate (delete vApp 'web')`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.records
            .iter()
            .map(|record| {
                let line = format!("{} {} {}", record.index, record.status.symbol(), record.name);
                match (&record.status, &record.compensation_description) {
                    (StepStatus::Compensated | StepStatus::CompensationFailed, Some(undo)) => {
                        format!("{line} ({undo})")
                    }
                    _ => line,
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_audit_log_is_empty() {
        let log = SagaAuditLog::new();
        assert!(log.records().is_empty());
    }

    #[test]
    fn record_start_adds_step_with_executed_status() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "instantiate");

        assert_eq!(log.records().len(), 1);
        assert_eq!(log.records()[0].name, "instantiate");
        assert_eq!(log.records()[0].index, 0);
        assert_eq!(log.records()[0].status, StepStatus::Executed);
        assert!(log.records()[0].completed_at.is_none());
    }

    #[test]
    fn record_failure_updates_last_step() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "instantiate");
        log.record_failure();

        assert_eq!(log.records()[0].status, StepStatus::Failed);
        assert!(log.records()[0].completed_at.is_some());
    }

    #[test]
    fn record_success_stores_compensation_description() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "instantiate");
        log.record_success("delete vApp".to_string());

        assert!(log.records()[0].completed_at.is_some());
        assert_eq!(
            log.records()[0].compensation_description.as_deref(),
            Some("delete vApp")
        );
    }

    #[test]
    fn compensation_is_tracked_per_position_not_per_name() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "insert_media");
        log.record_success("undo".to_string());
        log.record_start(1, "insert_media");
        log.record_success("undo".to_string());
        log.record_compensated(1);

        assert_eq!(log.records()[0].status, StepStatus::Executed);
        assert_eq!(log.records()[1].status, StepStatus::Compensated);
    }

    #[test]
    fn record_compensation_failed_updates_matching_step() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "instantiate");
        log.record_success("undo".to_string());
        log.record_compensation_failed(0);

        assert_eq!(log.records()[0].status, StepStatus::CompensationFailed);
    }

    #[test]
    fn summary_shows_every_status() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "compensated_step");
        log.record_success("undo".to_string());
        log.record_compensated(0);
        log.record_start(1, "comp_failed_step");
        log.record_success("undo".to_string());
        log.record_compensation_failed(1);
        log.record_start(2, "failed_step");
        log.record_failure();
        log.record_start(3, "interrupted_step");
        log.record_interrupted();

        let summary = log.summary();
        assert!(summary.contains("0 ↩ compensated_step (undo)"));
        assert!(summary.contains("1 ⚠ comp_failed_step (undo)"));
        assert!(summary.contains("2 ✗ failed_step"));
        assert!(summary.contains("3 ⏹ interrupted_step"));
    }

    #[test]
    fn stopped_at_finds_failed_or_interrupted_step() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "instantiate");
        log.record_success("delete vApp".to_string());
        assert!(log.stopped_at().is_none());

        log.record_start(1, "insert_media");
        log.record_interrupted();

        let stopped = log.stopped_at().expect("run was interrupted");
        assert_eq!(stopped.index, 1);
        assert!(stopped.duration().is_some());
    }
}
