//! Column transform primitives.
//!
//! Every primitive is a pure function taking a [`Table`] by shared reference
//! and returning a new table together with a [`ChangeReport`]. The input is
//! never modified, so a failing primitive leaves its caller with the table it
//! started from.
//!
//! [`Primitive`] is the declarative form used by pipeline stages: one tagged
//! variant per operation, with the parameters as fields. It serializes with an
//! `op` tag so a stage reads naturally in JSON:
//!
//! ```json
//! { "name": "fill_loan_amount", "op": "fill_missing",
//!   "columns": ["LoanAmount"], "strategy": { "kind": "median" } }
//! ```

pub mod coerce;
pub mod columns;
pub mod encode;
pub mod expr;
pub mod impute;
pub mod outliers;
pub mod text;

pub use coerce::ConversionPolicy;
pub use encode::CategoryOrder;
pub use expr::Expr;
pub use impute::FillStrategy;
pub use outliers::NormalisationMethod;

use crate::error::{CleanError, Result};
use crate::report::ChangeReport;
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cells of `name` that `after` changes. A column that does not exist yet
/// counts its present cells.
pub(crate) fn changed_cells(table: &Table, name: &str, after: &[Value]) -> usize {
    match table.get_column(name) {
        Ok(before) => ChangeReport::count_changes(before, after),
        Err(_) => after.iter().filter(|v| v.is_present()).count(),
    }
}

/// A configured transform, ready to be applied to any table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Primitive {
    FillMissing {
        columns: Vec<String>,
        strategy: FillStrategy,
    },

    CoerceNumeric {
        columns: Vec<String>,
        #[serde(default)]
        on_failure: ConversionPolicy,
    },

    /// Requires fully populated columns; fill them first.
    CoerceInteger { columns: Vec<String> },

    CoerceDatetime {
        columns: Vec<String>,
        #[serde(default)]
        format: Option<String>,
        #[serde(default)]
        on_failure: ConversionPolicy,
    },

    /// Exact-match substitution. Without `columns` every column is targeted.
    ReplaceValue {
        #[serde(default)]
        columns: Option<Vec<String>>,
        from: Value,
        #[serde(default)]
        to: Value,
    },

    ReplaceText {
        columns: Vec<String>,
        pattern: String,
        #[serde(default)]
        replacement: String,
    },

    TrimWhitespace { columns: Vec<String> },

    RenameColumns { mapping: BTreeMap<String, String> },

    DeriveColumn { target: String, expr: Expr },

    DropColumns {
        columns: Vec<String>,
        #[serde(default)]
        ignore_missing: bool,
    },

    SplitColumn {
        column: String,
        delimiter: String,
        into: Vec<String>,
        #[serde(default)]
        drop_source: bool,
    },

    OneHotEncode {
        columns: Vec<String>,
        #[serde(default)]
        drop_first: bool,
    },

    LabelEncode {
        column: String,
        #[serde(default)]
        order: CategoryOrder,
    },

    ClipOutliers {
        columns: Vec<String>,
        lower_quantile: f64,
        upper_quantile: f64,
    },

    Normalize {
        columns: Vec<String>,
        method: NormalisationMethod,
    },
}

impl Primitive {
    /// Run the transform against `table`.
    ///
    /// Multi-column variants apply column by column, in the listed order, and
    /// merge the per-column reports.
    ///
    /// # Errors
    ///
    /// The first error raised by the underlying operation.
    pub fn apply(&self, table: &Table) -> Result<(Table, ChangeReport)> {
        match self {
            Self::FillMissing { columns, strategy } => {
                each_column(table, columns, |t, c| impute::fill_missing(t, c, strategy))
            }
            Self::CoerceNumeric {
                columns,
                on_failure,
            } => each_column(table, columns, |t, c| {
                coerce::coerce_numeric(t, c, *on_failure)
            }),
            Self::CoerceInteger { columns } => each_column(table, columns, coerce::coerce_integer),
            Self::CoerceDatetime {
                columns,
                format,
                on_failure,
            } => each_column(table, columns, |t, c| {
                coerce::coerce_datetime(t, c, format.as_deref(), *on_failure)
            }),
            Self::ReplaceValue { columns, from, to } => {
                let columns = match columns {
                    Some(columns) => columns.clone(),
                    None => table.column_names().into_iter().map(str::to_owned).collect(),
                };
                each_column(table, &columns, |t, c| text::replace_value(t, c, from, to))
            }
            Self::ReplaceText {
                columns,
                pattern,
                replacement,
            } => each_column(table, columns, |t, c| {
                text::replace_text(t, c, pattern, replacement)
            }),
            Self::TrimWhitespace { columns } => {
                each_column(table, columns, text::trim_whitespace)
            }
            Self::RenameColumns { mapping } => columns::rename_columns(table, mapping),
            Self::DeriveColumn { target, expr } => columns::derive_column(table, target, expr),
            Self::DropColumns {
                columns,
                ignore_missing,
            } => columns::drop_columns(table, columns, *ignore_missing),
            Self::SplitColumn {
                column,
                delimiter,
                into,
                drop_source,
            } => text::split_column(table, column, delimiter, into, *drop_source),
            Self::OneHotEncode {
                columns,
                drop_first,
            } => each_column(table, columns, |t, c| {
                encode::one_hot_encode(t, c, *drop_first)
            }),
            Self::LabelEncode { column, order } => encode::label_encode(table, column, *order),
            Self::ClipOutliers {
                columns,
                lower_quantile,
                upper_quantile,
            } => each_column(table, columns, |t, c| {
                outliers::clip_outliers(t, c, *lower_quantile, *upper_quantile)
            }),
            Self::Normalize { columns, method } => {
                each_column(table, columns, |t, c| outliers::normalize(t, c, *method))
            }
        }
    }

    /// The `op` tag of this variant.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::FillMissing { .. } => "fill_missing",
            Self::CoerceNumeric { .. } => "coerce_numeric",
            Self::CoerceInteger { .. } => "coerce_integer",
            Self::CoerceDatetime { .. } => "coerce_datetime",
            Self::ReplaceValue { .. } => "replace_value",
            Self::ReplaceText { .. } => "replace_text",
            Self::TrimWhitespace { .. } => "trim_whitespace",
            Self::RenameColumns { .. } => "rename_columns",
            Self::DeriveColumn { .. } => "derive_column",
            Self::DropColumns { .. } => "drop_columns",
            Self::SplitColumn { .. } => "split_column",
            Self::OneHotEncode { .. } => "one_hot_encode",
            Self::LabelEncode { .. } => "label_encode",
            Self::ClipOutliers { .. } => "clip_outliers",
            Self::Normalize { .. } => "normalize",
        }
    }

    /// Columns the transform reads or rewrites. Empty for a whole-table
    /// replace, which targets whatever columns the input has.
    pub fn target_columns(&self) -> Vec<String> {
        match self {
            Self::FillMissing { columns, .. }
            | Self::CoerceNumeric { columns, .. }
            | Self::CoerceInteger { columns }
            | Self::CoerceDatetime { columns, .. }
            | Self::ReplaceText { columns, .. }
            | Self::TrimWhitespace { columns }
            | Self::DropColumns { columns, .. }
            | Self::OneHotEncode { columns, .. }
            | Self::ClipOutliers { columns, .. }
            | Self::Normalize { columns, .. } => columns.clone(),
            Self::ReplaceValue { columns, .. } => columns.clone().unwrap_or_default(),
            Self::RenameColumns { mapping } => mapping.keys().cloned().collect(),
            Self::DeriveColumn { expr, .. } => {
                expr.columns().into_iter().map(str::to_owned).collect()
            }
            Self::SplitColumn { column, .. } | Self::LabelEncode { column, .. } => {
                vec![column.clone()]
            }
        }
    }

    /// Reject configurations that cannot succeed on any table.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` describing the first problem found.
    pub fn check(&self) -> Result<()> {
        let invalid = |msg: String| Err(CleanError::InvalidConfig(msg));
        match self {
            Self::FillMissing { columns, .. }
            | Self::CoerceNumeric { columns, .. }
            | Self::CoerceInteger { columns }
            | Self::ReplaceText { columns, .. }
            | Self::TrimWhitespace { columns }
            | Self::DropColumns { columns, .. }
            | Self::OneHotEncode { columns, .. }
            | Self::Normalize { columns, .. }
                if columns.is_empty() =>
            {
                invalid(format!("'{}' needs at least one column", self.op_name()))
            }
            Self::ReplaceValue {
                columns: Some(columns),
                ..
            } if columns.is_empty() => invalid(
                "'replace_value' with an explicit column list needs at least one column".to_owned(),
            ),
            Self::CoerceDatetime {
                columns,
                on_failure,
                ..
            } => {
                if columns.is_empty() {
                    invalid("'coerce_datetime' needs at least one column".to_owned())
                } else if *on_failure == ConversionPolicy::Fail {
                    invalid("'coerce_datetime' cannot use the 'fail' policy".to_owned())
                } else {
                    Ok(())
                }
            }
            Self::ReplaceText { pattern, .. } if pattern.is_empty() => {
                invalid("'replace_text' needs a non-empty pattern".to_owned())
            }
            Self::SplitColumn {
                delimiter, into, ..
            } => {
                if into.is_empty() {
                    invalid("'split_column' needs at least one output column".to_owned())
                } else if delimiter.is_empty() {
                    invalid("'split_column' needs a non-empty delimiter".to_owned())
                } else {
                    Ok(())
                }
            }
            Self::ClipOutliers {
                columns,
                lower_quantile,
                upper_quantile,
            } => {
                if columns.is_empty() {
                    invalid("'clip_outliers' needs at least one column".to_owned())
                } else if !(0.0..=1.0).contains(lower_quantile)
                    || !(0.0..=1.0).contains(upper_quantile)
                    || lower_quantile > upper_quantile
                {
                    invalid(format!(
                        "invalid quantiles {lower_quantile}..{upper_quantile} (need 0 <= lower <= upper <= 1)"
                    ))
                } else {
                    Ok(())
                }
            }
            Self::DeriveColumn { target, .. } if target.is_empty() => {
                invalid("'derive_column' needs a target name".to_owned())
            }
            _ => Ok(()),
        }
    }
}

/// Fold `f` over `columns`, threading the table and merging reports.
fn each_column<F>(table: &Table, columns: &[String], f: F) -> Result<(Table, ChangeReport)>
where
    F: Fn(&Table, &str) -> Result<(Table, ChangeReport)>,
{
    let mut current = table.clone();
    let mut report = ChangeReport::default();
    for column in columns {
        let (next, changes) = f(&current, column)?;
        current = next;
        report.merge(changes);
    }
    Ok((current, report))
}
