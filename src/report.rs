//! Change reports produced by stages and aggregated per pipeline run.

use crate::error::{ErrorKind, StageError};
use crate::table::Value;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of offending raw values kept per report.
pub const FAILURE_SAMPLE_LIMIT: usize = 5;

/// What a single stage changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Cells whose value differs from the input. Cells of a new column count
    /// when they are present.
    pub cells_modified: usize,

    /// Values that failed conversion, however the policy resolved them.
    pub conversion_failures: usize,

    /// First few distinct raw values that failed conversion.
    pub failure_samples: Vec<String>,

    /// Distinct categories seen by an encoding step.
    pub cardinality: Option<usize>,

    pub columns_added: Vec<String>,
    pub columns_removed: Vec<String>,
    pub rows_dropped: usize,
}

impl ChangeReport {
    /// Record a value that failed conversion.
    pub fn record_failure(&mut self, raw: &Value) {
        self.conversion_failures += 1;
        let raw = raw.to_string();
        if self.failure_samples.len() < FAILURE_SAMPLE_LIMIT && !self.failure_samples.contains(&raw)
        {
            self.failure_samples.push(raw);
        }
    }

    /// Fold another report into this one, for stages spanning several columns.
    pub fn merge(&mut self, other: Self) {
        self.cells_modified += other.cells_modified;
        self.conversion_failures += other.conversion_failures;
        for sample in other.failure_samples {
            if self.failure_samples.len() < FAILURE_SAMPLE_LIMIT
                && !self.failure_samples.contains(&sample)
            {
                self.failure_samples.push(sample);
            }
        }
        self.cardinality = match (self.cardinality, other.cardinality) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.columns_added.extend(other.columns_added);
        self.columns_removed.extend(other.columns_removed);
        self.rows_dropped += other.rows_dropped;
    }

    /// Count cells that differ between two versions of a column.
    pub(crate) fn count_changes(before: &[Value], after: &[Value]) -> usize {
        before.iter().zip(after).filter(|(b, a)| b != a).count()
    }
}

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running { stage_index: usize },
    Completed,
    Failed { stage_index: usize },
}

impl RunState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running { stage_index: 0 } | Self::Completed) => true,
            (Self::Running { stage_index: i }, Self::Running { stage_index: j }) => j == i + 1,
            (Self::Running { stage_index: i }, Self::Failed { stage_index: j }) => *i == j,
            (Self::Running { .. }, Self::Completed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Why a stage did not contribute to the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub kind: ErrorKind,
    pub columns: Vec<String>,
    pub message: String,
}

impl From<&StageError> for StageFailure {
    fn from(err: &StageError) -> Self {
        Self {
            kind: err.kind(),
            columns: err.columns.clone(),
            message: err.source.to_string(),
        }
    }
}

/// Result of attempting one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Applied { changes: ChangeReport },
    Skipped { failure: StageFailure },
    Failed { failure: StageFailure },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub index: usize,
    pub stage: String,
    #[serde(flatten)]
    pub status: StageStatus,
}

/// Everything a run did, created fresh per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub pipeline: String,
    pub state: RunState,
    pub stages: Vec<StageOutcome>,
    pub rows_before: usize,
    pub columns_before: usize,
    pub rows_after: usize,
    pub columns_after: usize,
    pub duration: Duration,
}

impl PipelineReport {
    pub(crate) fn new(pipeline: &str, rows: usize, columns: usize) -> Self {
        Self {
            pipeline: pipeline.to_owned(),
            state: RunState::Pending,
            stages: Vec::new(),
            rows_before: rows,
            columns_before: columns,
            rows_after: 0,
            columns_after: 0,
            duration: Duration::ZERO,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Stages skipped under the skip policy, with the reason.
    pub fn skipped(&self) -> Vec<(&str, &StageFailure)> {
        self.stages
            .iter()
            .filter_map(|o| match &o.status {
                StageStatus::Skipped { failure } => Some((o.stage.as_str(), failure)),
                _ => None,
            })
            .collect()
    }

    /// The stage that aborted the run, if any.
    pub fn failed_stage(&self) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|o| matches!(o.status, StageStatus::Failed { .. }))
    }

    /// Change report of a named stage that was applied.
    pub fn changes(&self, stage: &str) -> Option<&ChangeReport> {
        self.stages.iter().find_map(|o| match &o.status {
            StageStatus::Applied { changes } if o.stage == stage => Some(changes),
            _ => None,
        })
    }

    pub fn applied_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|o| matches!(o.status, StageStatus::Applied { .. }))
            .count()
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        match self.state {
            RunState::Failed { stage_index } => {
                let (stage, detail) = self
                    .failed_stage()
                    .and_then(|o| match &o.status {
                        StageStatus::Failed { failure } => Some((
                            o.stage.as_str(),
                            format!("{} on [{}]", failure.kind, failure.columns.join(", ")),
                        )),
                        _ => None,
                    })
                    .unwrap_or(("?", String::new()));
                format!(
                    "Pipeline '{}' failed at stage {} '{stage}': {detail}",
                    self.pipeline,
                    stage_index + 1
                )
            }
            _ => format!(
                "Pipeline '{}' {}: {} rows ({} -> {}), {} columns ({} -> {}), {} applied, {} skipped, {:.3}s",
                self.pipeline,
                if self.is_completed() { "completed" } else { "pending" },
                change_word(self.rows_before, self.rows_after),
                self.rows_before,
                self.rows_after,
                change_word(self.columns_before, self.columns_after),
                self.columns_before,
                self.columns_after,
                self.applied_count(),
                self.skipped().len(),
                self.duration.as_secs_f64()
            ),
        }
    }
}

fn change_word(before: usize, after: usize) -> &'static str {
    match after.cmp(&before) {
        std::cmp::Ordering::Greater => "added",
        std::cmp::Ordering::Less => "removed",
        std::cmp::Ordering::Equal => "unchanged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_failure_keeps_distinct_samples() {
        let mut report = ChangeReport::default();
        for raw in ["ERROR", "ERROR", "UNKNOWN", "a", "b", "c", "d"] {
            report.record_failure(&Value::text(raw));
        }
        assert_eq!(report.conversion_failures, 7);
        assert_eq!(
            report.failure_samples,
            vec!["ERROR", "UNKNOWN", "a", "b", "c"]
        );
    }

    #[test]
    fn test_merge_sums_counts() {
        let mut a = ChangeReport {
            cells_modified: 2,
            columns_added: vec!["x".to_owned()],
            ..Default::default()
        };
        a.merge(ChangeReport {
            cells_modified: 3,
            cardinality: Some(4),
            ..Default::default()
        });
        assert_eq!(a.cells_modified, 5);
        assert_eq!(a.cardinality, Some(4));
        assert_eq!(a.columns_added, vec!["x".to_owned()]);
    }

    #[test]
    fn test_state_transitions() {
        assert!(RunState::Pending.can_transition_to(RunState::Running { stage_index: 0 }));
        assert!(RunState::Pending.can_transition_to(RunState::Completed));
        assert!(
            RunState::Running { stage_index: 1 }
                .can_transition_to(RunState::Running { stage_index: 2 })
        );
        assert!(
            RunState::Running { stage_index: 1 }
                .can_transition_to(RunState::Failed { stage_index: 1 })
        );
        assert!(!RunState::Completed.can_transition_to(RunState::Pending));
        assert!(
            !RunState::Running { stage_index: 1 }
                .can_transition_to(RunState::Running { stage_index: 0 })
        );
        assert!(RunState::Failed { stage_index: 0 }.is_terminal());
    }

    #[test]
    fn test_summary_names_failed_stage() {
        let mut report = PipelineReport::new("loan", 10, 4);
        report.state = RunState::Failed { stage_index: 1 };
        report.stages.push(StageOutcome {
            index: 1,
            stage: "drop_ids".to_owned(),
            status: StageStatus::Failed {
                failure: StageFailure {
                    kind: ErrorKind::Schema,
                    columns: vec!["Loan_ID".to_owned()],
                    message: "missing".to_owned(),
                },
            },
        });
        let summary = report.summary();
        assert!(summary.contains("stage 2 'drop_ids'"));
        assert!(summary.contains("SchemaError on [Loan_ID]"));
    }
}
