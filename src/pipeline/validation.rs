//! Pipeline specification validation.
//!
//! Validates a pipeline against the columns of an input table before
//! execution, catching errors early with actionable messages. Stages are
//! simulated in order so that columns added, renamed or dropped by earlier
//! stages are taken into account.

use super::spec::{ErrorPolicy, Pipeline, SPEC_VERSION};
use crate::primitives::Primitive;
use std::collections::BTreeSet;
use std::fmt;

/// How bad a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run would abort.
    Error,
    /// The stage would fail but is skipped under its policy.
    Warning,
}

/// Validation error with helpful context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub stage_index: Option<usize>,
    pub stage: Option<String>,
    pub severity: Severity,
    pub message: String,
}

impl ValidationError {
    fn schema(message: impl Into<String>) -> Self {
        Self {
            stage_index: None,
            stage: None,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.stage_index, &self.stage) {
            (Some(idx), Some(name)) => write!(f, "Stage {} '{name}': {}", idx + 1, self.message)?,
            _ => write!(f, "Schema: {}", self.message)?,
        }
        if self.severity == Severity::Warning {
            f.write_str(" (stage will be skipped)")?;
        }
        Ok(())
    }
}

/// Columns known to exist at some point of the simulation.
#[derive(Debug, Clone, Default)]
struct Columns {
    names: BTreeSet<String>,
    /// Prefixes of one-hot outputs, whose exact names depend on the data.
    generated: Vec<String>,
}

impl Columns {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name) || self.generated.iter().any(|p| name.starts_with(p.as_str()))
    }

    fn require<'a>(&self, wanted: impl IntoIterator<Item = &'a String>, op: &str) -> Vec<String> {
        wanted
            .into_iter()
            .filter(|c| !self.contains(c))
            .map(|c| format!("Cannot {op} non-existent column '{c}'"))
            .collect()
    }
}

/// Validate `pipeline` against the column names of its input.
///
/// Findings on stages that run under the skip policy are warnings; every
/// other finding is an error.
pub fn validate_pipeline<S: AsRef<str>>(
    pipeline: &Pipeline,
    input_columns: &[S],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if pipeline.version != SPEC_VERSION {
        errors.push(ValidationError::schema(format!(
            "Unsupported spec version '{}', expected '{SPEC_VERSION}'",
            pipeline.version
        )));
    }

    let mut columns = Columns {
        names: input_columns
            .iter()
            .map(|c| c.as_ref().to_owned())
            .collect(),
        generated: Vec::new(),
    };

    for (idx, stage) in pipeline.stages.iter().enumerate() {
        let before = columns.clone();
        let mut messages = validate_step(&stage.primitive, &mut columns);
        if let Err(err) = stage.primitive.check() {
            messages.push(err.to_string());
        }
        if messages.is_empty() {
            continue;
        }

        let severity = match pipeline.policy_for(stage) {
            ErrorPolicy::Skip => {
                // A skipped stage passes its input through.
                columns = before;
                Severity::Warning
            }
            ErrorPolicy::Abort => Severity::Error,
        };
        errors.extend(messages.into_iter().map(|message| ValidationError {
            stage_index: Some(idx),
            stage: Some(stage.name.clone()),
            severity,
            message,
        }));
    }

    for spec in &pipeline.expected_schema {
        if !columns.contains(&spec.name) {
            errors.push(ValidationError::schema(format!(
                "Expected output column '{}' is never produced",
                spec.name
            )));
        }
    }

    errors
}

/// Validate a single step and update column tracking
fn validate_step(primitive: &Primitive, columns: &mut Columns) -> Vec<String> {
    match primitive {
        Primitive::FillMissing { columns: cols, .. } => columns.require(cols, "fill"),
        Primitive::CoerceNumeric { columns: cols, .. }
        | Primitive::CoerceInteger { columns: cols }
        | Primitive::CoerceDatetime { columns: cols, .. } => columns.require(cols, "coerce"),
        Primitive::ReplaceValue { columns: cols, .. } => cols
            .as_ref()
            .map(|cols| columns.require(cols, "replace values in"))
            .unwrap_or_default(),
        Primitive::ReplaceText { columns: cols, .. } => columns.require(cols, "replace text in"),
        Primitive::TrimWhitespace { columns: cols } => columns.require(cols, "trim whitespace"),
        Primitive::ClipOutliers { columns: cols, .. } => columns.require(cols, "clip outliers"),
        Primitive::Normalize { columns: cols, .. } => columns.require(cols, "normalize"),
        Primitive::LabelEncode { column, .. } => columns.require([column], "label encode"),

        Primitive::RenameColumns { mapping } => {
            let mut messages = Vec::new();
            for (from, to) in mapping {
                if !columns.contains(from) {
                    messages.push(format!("Cannot rename non-existent column '{from}'"));
                } else if columns.contains(to) && from != to {
                    messages.push(format!(
                        "Cannot rename '{from}' to '{to}': target already exists"
                    ));
                } else {
                    columns.names.remove(from);
                    columns.names.insert(to.clone());
                }
            }
            messages
        }

        Primitive::DeriveColumn { target, expr } => {
            let messages: Vec<String> = expr
                .columns()
                .into_iter()
                .filter(|c| !columns.contains(c))
                .map(|c| format!("Cannot derive '{target}' from non-existent column '{c}'"))
                .collect();
            columns.names.insert(target.clone());
            messages
        }

        Primitive::DropColumns {
            columns: cols,
            ignore_missing,
        } => {
            let messages = if *ignore_missing {
                Vec::new()
            } else {
                columns.require(cols, "drop")
            };
            for col in cols {
                columns.names.remove(col);
            }
            messages
        }

        Primitive::SplitColumn {
            column,
            into,
            drop_source,
            ..
        } => {
            let messages = columns.require([column], "split");
            columns.names.extend(into.iter().cloned());
            if *drop_source && !into.contains(column) {
                columns.names.remove(column);
            }
            messages
        }

        Primitive::OneHotEncode { columns: cols, .. } => {
            let messages = columns.require(cols, "one-hot encode");
            // Encoded column names are only known once the data is seen.
            for col in cols {
                columns.names.remove(col);
                columns.generated.push(format!("{col}_"));
            }
            messages
        }
    }
}
