//! Outlier clipping and scale normalisation for numeric columns.

use super::impute::sorted_numbers;
use crate::error::{CleanError, Result};
use crate::report::ChangeReport;
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};

/// Normalization method for numeric columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalisationMethod {
    /// `(x - mean) / sample std`
    ZScore,
    /// `(x - min) / (max - min)`
    MinMax,
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let (a, b) = (sorted.get(lo)?, sorted.get(hi)?);
    Some(a + (b - a) * (pos - lo as f64))
}

fn empty(column: &str) -> CleanError {
    CleanError::EmptyColumn {
        column: column.to_owned(),
    }
}

/// Clamp numeric values of `column` to its `[lower, upper]` quantile range.
///
/// # Errors
///
/// `InvalidConfig` for quantiles outside `0..=1` or `lower > upper`,
/// `EmptyColumn` with no present values, `TypeMismatch` for non-numeric values.
pub fn clip_outliers(
    table: &Table,
    column: &str,
    lower_quantile: f64,
    upper_quantile: f64,
) -> Result<(Table, ChangeReport)> {
    if !(0.0..=1.0).contains(&lower_quantile)
        || !(0.0..=1.0).contains(&upper_quantile)
        || lower_quantile > upper_quantile
    {
        return Err(CleanError::InvalidConfig(format!(
            "quantiles for '{column}' must satisfy 0 <= lower <= upper <= 1"
        )));
    }

    let before = table.get_column(column)?;
    let sorted = sorted_numbers(column, before)?.ok_or_else(|| empty(column))?;
    let (Some(lo), Some(hi)) = (
        quantile(&sorted, lower_quantile),
        quantile(&sorted, upper_quantile),
    ) else {
        return Err(empty(column));
    };

    let after = rescale(before, |x| {
        if x < lo {
            Some(lo)
        } else if x > hi {
            Some(hi)
        } else {
            None
        }
    });
    finish(table, column, before, after)
}

/// Rescale numeric values of `column`. A column without spread is left as is.
///
/// # Errors
///
/// `EmptyColumn` with no present values, `TypeMismatch` for non-numeric values.
pub fn normalize(
    table: &Table,
    column: &str,
    method: NormalisationMethod,
) -> Result<(Table, ChangeReport)> {
    let before = table.get_column(column)?;
    let sorted = sorted_numbers(column, before)?.ok_or_else(|| empty(column))?;

    let (offset, scale) = match method {
        NormalisationMethod::MinMax => {
            let (min, max) = match (sorted.first(), sorted.last()) {
                (Some(min), Some(max)) => (*min, *max),
                _ => return Err(empty(column)),
            };
            (min, max - min)
        }
        NormalisationMethod::ZScore => {
            let n = sorted.len() as f64;
            let mean = sorted.iter().sum::<f64>() / n;
            let var = if sorted.len() > 1 {
                sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
            } else {
                0.0
            };
            (mean, var.sqrt())
        }
    };

    if scale == 0.0 {
        log::debug!("'{column}' has no spread, normalisation skipped");
        return finish(table, column, before, before.to_vec());
    }

    let after = rescale(before, |x| Some((x - offset) / scale));
    finish(table, column, before, after)
}

/// Apply `f` to numeric cells; `None` keeps the original value.
fn rescale(values: &[Value], f: impl Fn(f64) -> Option<f64>) -> Vec<Value> {
    values
        .iter()
        .map(|v| match v.as_f64().and_then(&f) {
            Some(x) => Value::float(x),
            None => v.clone(),
        })
        .collect()
}

fn finish(
    table: &Table,
    column: &str,
    before: &[Value],
    after: Vec<Value>,
) -> Result<(Table, ChangeReport)> {
    let report = ChangeReport {
        cells_modified: ChangeReport::count_changes(before, &after),
        ..Default::default()
    };
    Ok((table.with_column(column, after)?, report))
}
