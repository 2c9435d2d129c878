//! Pipeline execution engine.
//!
//! Runs a pipeline's stages strictly in order against an input table and
//! records what each one did in a [`PipelineReport`].

use super::spec::{ErrorPolicy, Pipeline};
use crate::error::{CleanError, StageContext as _, StageError};
use crate::report::{PipelineReport, RunState, StageFailure, StageOutcome, StageStatus};
use crate::table::Table;
use std::fmt;
use std::time::Instant;

/// Stage name under which a failed output schema check is reported.
pub const EXPECTED_SCHEMA_STAGE: &str = "expected_schema";

/// Outcome of one run: the cleaned table, if the run completed, and its report.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub output: Option<Table>,
    pub report: PipelineReport,
}

impl PipelineRun {
    pub fn is_completed(&self) -> bool {
        self.output.is_some() && self.report.is_completed()
    }

    /// Split into the output and report, or the failure.
    ///
    /// # Errors
    ///
    /// [`PipelineFailure`] carrying the report when the run aborted.
    pub fn into_result(self) -> Result<(Table, PipelineReport), PipelineFailure> {
        match self.output {
            Some(table) if self.report.is_completed() => Ok((table, self.report)),
            _ => Err(PipelineFailure {
                report: self.report,
            }),
        }
    }
}

/// A run that aborted. The report names the failing stage.
#[derive(Debug, Clone)]
pub struct PipelineFailure {
    pub report: PipelineReport,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report.summary())
    }
}

impl std::error::Error for PipelineFailure {}

fn advance(report: &mut PipelineReport, next: RunState) {
    debug_assert!(
        report.state.can_transition_to(next),
        "illegal transition {:?} -> {next:?}",
        report.state
    );
    log::debug!("Pipeline '{}': {:?} -> {next:?}", report.pipeline, report.state);
    report.state = next;
}

fn outcome(index: usize, stage: &str, status: StageStatus) -> StageOutcome {
    StageOutcome {
        index,
        stage: stage.to_owned(),
        status,
    }
}

impl Pipeline {
    /// Run every stage against `input`.
    ///
    /// The input is never modified. Under the abort policy the first failure
    /// ends the run with no output; under skip the failing stage is recorded
    /// and the table it was given flows on unchanged.
    pub fn run(&self, input: &Table) -> PipelineRun {
        let started = Instant::now();
        let mut report =
            PipelineReport::new(&self.name, input.row_count(), input.column_count());
        log::info!(
            "Running pipeline '{}' ({} stages) on {} rows x {} columns",
            self.name,
            self.stages.len(),
            input.row_count(),
            input.column_count()
        );

        let output = match self.run_stages(input, &mut report) {
            Ok(table) => {
                advance(&mut report, RunState::Completed);
                report.rows_after = table.row_count();
                report.columns_after = table.column_count();
                Some(table)
            }
            Err((index, err)) => {
                log::error!("{err}; pipeline '{}' aborted", self.name);
                report.stages.push(outcome(
                    index,
                    &err.stage,
                    StageStatus::Failed {
                        failure: StageFailure::from(&err),
                    },
                ));
                advance(&mut report, RunState::Failed { stage_index: index });
                None
            }
        };

        report.duration = started.elapsed();
        log::info!("{}", report.summary());
        PipelineRun { output, report }
    }

    fn run_stages(
        &self,
        input: &Table,
        report: &mut PipelineReport,
    ) -> Result<Table, (usize, StageError)> {
        let mut current = input.clone();
        for (index, stage) in self.stages.iter().enumerate() {
            advance(report, RunState::Running { stage_index: index });
            match stage.apply(&current) {
                Ok((next, changes)) => {
                    log::debug!(
                        "Stage '{}' ({}) modified {} cells",
                        stage.name,
                        stage.primitive.op_name(),
                        changes.cells_modified
                    );
                    current = next;
                    report
                        .stages
                        .push(outcome(index, &stage.name, StageStatus::Applied { changes }));
                }
                Err(err) => match self.policy_for(stage) {
                    ErrorPolicy::Skip => {
                        log::warn!("{err}; stage skipped");
                        report.stages.push(outcome(
                            index,
                            &stage.name,
                            StageStatus::Skipped {
                                failure: StageFailure::from(&err),
                            },
                        ));
                    }
                    ErrorPolicy::Abort => return Err((index, err)),
                },
            }
        }

        if !self.expected_schema.is_empty() {
            let index = self.stages.len();
            advance(report, RunState::Running { stage_index: index });
            self.check_output(&current).map_err(|err| (index, err))?;
        }
        Ok(current)
    }

    /// Validate `table` against the declared output schema.
    fn check_output(&self, table: &Table) -> Result<(), StageError> {
        let columns: Vec<String> = self
            .expected_schema
            .iter()
            .map(|spec| spec.name.clone())
            .collect();
        self.expected_schema
            .iter()
            .try_for_each(|spec| -> Result<(), CleanError> {
                spec.validate(table.get_column(&spec.name)?)
            })
            .in_stage(EXPECTED_SCHEMA_STAGE, &columns)
    }
}
