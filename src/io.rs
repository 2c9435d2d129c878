//! Loading and writing tables, and running pipelines end to end.
//!
//! The crate never touches files itself. Callers plug in a [`Loader`] and a
//! [`Writer`]; [`MemoryStore`] implements both for tests and embedding.

use crate::pipeline::Pipeline;
use crate::report::PipelineReport;
use crate::table::Table;
use anyhow::{Context as _, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Produces a raw table from a named source.
pub trait Loader {
    fn load(&self, source: &str) -> Result<Table>;
}

/// Persists a cleaned table to a named sink.
pub trait Writer {
    fn write(&self, table: &Table, sink: &str) -> Result<()>;
}

/// Named tables kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<BTreeMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, table: Table) {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), table);
    }

    /// Store raw text records, typing each column the way a CSV reader would.
    ///
    /// # Errors
    ///
    /// Fails on duplicate headers or ragged records.
    pub fn insert_records<S: AsRef<str>>(
        &self,
        name: impl Into<String>,
        headers: &[S],
        records: &[Vec<S>],
    ) -> Result<()> {
        let name = name.into();
        let table = Table::from_text_records(headers, records)
            .with_context(|| format!("Failed to build table '{name}'"))?;
        self.insert(name, table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Table> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl Loader for MemoryStore {
    fn load(&self, source: &str) -> Result<Table> {
        self.get(source)
            .with_context(|| format!("No table named '{source}' in memory store"))
    }
}

impl Writer for MemoryStore {
    fn write(&self, table: &Table, sink: &str) -> Result<()> {
        self.insert(sink, table.clone());
        Ok(())
    }
}

/// Load `source`, run `pipeline` over it and write the result to `sink`.
///
/// Nothing is written when the run aborts.
///
/// # Errors
///
/// Loader and writer errors with context, or the
/// [`PipelineFailure`](crate::pipeline::PipelineFailure) of an aborted run,
/// which can be recovered with `downcast_ref`.
pub fn run_job<L, W>(
    pipeline: &Pipeline,
    loader: &L,
    source: &str,
    writer: &W,
    sink: &str,
) -> Result<PipelineReport>
where
    L: Loader + ?Sized,
    W: Writer + ?Sized,
{
    let input = loader
        .load(source)
        .with_context(|| format!("Failed to load '{source}'"))?;
    let (output, report) = pipeline.run(&input).into_result()?;
    writer
        .write(&output, sink)
        .with_context(|| format!("Failed to write '{sink}'"))?;
    log::info!("Wrote {} rows to '{sink}'", output.row_count());
    Ok(report)
}

/// One pipeline to run over one dataset.
#[derive(Debug, Clone)]
pub struct Job {
    pub pipeline: Pipeline,
    pub source: String,
    pub sink: String,
}

impl Job {
    pub fn new(pipeline: Pipeline, source: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            pipeline,
            source: source.into(),
            sink: sink.into(),
        }
    }
}

/// Result of one job in a batch.
#[derive(Debug)]
pub struct JobOutcome {
    pub source: String,
    pub sink: String,
    pub result: Result<PipelineReport>,
}

/// Run independent jobs on the rayon pool.
///
/// Each pipeline still runs its stages sequentially. Outcomes come back in
/// the order of `jobs`.
pub fn run_jobs<L, W>(jobs: &[Job], loader: &L, writer: &W) -> Vec<JobOutcome>
where
    L: Loader + Sync + ?Sized,
    W: Writer + Sync + ?Sized,
{
    log::debug!("Running {} jobs in parallel", jobs.len());
    jobs.par_iter()
        .map(|job| JobOutcome {
            source: job.source.clone(),
            sink: job.sink.clone(),
            result: run_job(&job.pipeline, loader, &job.source, writer, &job.sink),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineBuilder, PipelineFailure};
    use crate::primitives::{FillStrategy, Primitive};
    use crate::table::Value;
    use pretty_assertions::assert_eq;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_records(
                "raw",
                &["Item", "Quantity"],
                &[vec!["Coffee", "2"], vec!["Tea", ""], vec!["Cake", "4"]],
            )
            .unwrap();
        store
    }

    fn fill_quantity() -> Pipeline {
        PipelineBuilder::new("fill")
            .stage(
                "fill_quantity",
                Primitive::FillMissing {
                    columns: vec!["Quantity".to_owned()],
                    strategy: FillStrategy::Median,
                },
            )
            .build()
            .unwrap()
    }

    fn broken() -> Pipeline {
        PipelineBuilder::new("broken")
            .stage(
                "drop_price",
                Primitive::DropColumns {
                    columns: vec!["Price".to_owned()],
                    ignore_missing: false,
                },
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_run_job_writes_output() {
        let store = store();
        let report = run_job(&fill_quantity(), &store, "raw", &store, "clean").unwrap();

        assert!(report.is_completed());
        let clean = store.get("clean").unwrap();
        assert_eq!(
            clean.get_column("Quantity").unwrap(),
            &[Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let store = store();
        let err = run_job(&broken(), &store, "raw", &store, "clean").unwrap_err();

        let failure = err.downcast_ref::<PipelineFailure>().unwrap();
        assert_eq!(failure.report.failed_stage().unwrap().stage, "drop_price");
        assert_eq!(store.names(), vec!["raw".to_owned()]);
    }

    #[test]
    fn test_missing_source() {
        let store = store();
        let err = run_job(&fill_quantity(), &store, "nope", &store, "clean").unwrap_err();
        assert!(format!("{err:#}").contains("No table named 'nope'"));
    }

    #[test]
    fn test_run_jobs_keeps_order() {
        let store = store();
        let jobs = vec![
            Job::new(fill_quantity(), "raw", "a"),
            Job::new(broken(), "raw", "b"),
            Job::new(fill_quantity(), "raw", "c"),
        ];

        let outcomes = run_jobs(&jobs, &store, &store);
        let sinks: Vec<&str> = outcomes.iter().map(|o| o.sink.as_str()).collect();
        assert_eq!(sinks, vec!["a", "b", "c"]);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
        assert!(outcomes[2].result.is_ok());
        assert_eq!(store.names(), vec!["a".to_owned(), "c".to_owned(), "raw".to_owned()]);
    }
}
