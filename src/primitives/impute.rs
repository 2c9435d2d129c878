//! Missing-value imputation.

use crate::error::{CleanError, Result};
use crate::report::ChangeReport;
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to pick the value written into absent cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillStrategy {
    /// Middle of the sorted present values (numeric columns only).
    Median,
    /// Most frequent present value; ties go to the one seen first.
    Mode,
    /// Arithmetic mean of the present values (numeric columns only).
    Mean,
    Constant { value: Value },
}

impl FillStrategy {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant {
            value: value.into(),
        }
    }
}

/// Replace every absent cell of `column` with the value chosen by `strategy`.
///
/// # Errors
///
/// `EmptyColumn` when a statistic is asked of a column with no present
/// values, `TypeMismatch` when median or mean meet non-numeric values.
pub fn fill_missing(
    table: &Table,
    column: &str,
    strategy: &FillStrategy,
) -> Result<(Table, ChangeReport)> {
    let before = table.get_column(column)?;
    let empty = || CleanError::EmptyColumn {
        column: column.to_owned(),
    };

    let fill = match strategy {
        FillStrategy::Constant { value } => value.clone(),
        FillStrategy::Mode => mode(before).ok_or_else(empty)?,
        FillStrategy::Median => median(column, before)?.ok_or_else(empty)?,
        FillStrategy::Mean => mean(column, before)?.ok_or_else(empty)?,
    };
    log::debug!("filling '{column}' with {fill:?}");

    let after: Vec<Value> = before
        .iter()
        .map(|v| if v.is_absent() { fill.clone() } else { v.clone() })
        .collect();
    let report = ChangeReport {
        cells_modified: ChangeReport::count_changes(before, &after),
        ..Default::default()
    };

    Ok((table.with_column(column, after)?, report))
}

/// Most frequent present value, first-seen on ties.
pub(crate) fn mode(values: &[Value]) -> Option<Value> {
    let mut counts: HashMap<_, (usize, usize)> = HashMap::new();
    for (idx, value) in values.iter().enumerate() {
        if let Some(key) = value.key() {
            counts.entry(key).or_insert((0, idx)).0 += 1;
        }
    }

    counts
        .values()
        .max_by(|(count_a, first_a), (count_b, first_b)| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .and_then(|&(_, first)| values.get(first).cloned())
}

/// Present values as floats, sorted. `Ok(None)` if there are none.
pub(crate) fn sorted_numbers(column: &str, values: &[Value]) -> Result<Option<Vec<f64>>> {
    let mut numbers = Vec::with_capacity(values.len());
    for value in values.iter().filter(|v| v.is_present()) {
        let n = value.as_f64().ok_or_else(|| {
            CleanError::type_mismatch(column, "numeric", format!("{} '{value}'", value.type_name()))
        })?;
        numbers.push(n);
    }
    if numbers.is_empty() {
        return Ok(None);
    }
    numbers.sort_by(f64::total_cmp);
    Ok(Some(numbers))
}

fn median(column: &str, values: &[Value]) -> Result<Option<Value>> {
    let Some(numbers) = sorted_numbers(column, values)? else {
        return Ok(None);
    };

    let mid = numbers.len() / 2;
    let middle = if numbers.len() % 2 == 1 {
        numbers.get(mid).copied()
    } else {
        numbers
            .get(mid - 1)
            .zip(numbers.get(mid))
            .map(|(a, b)| a.midpoint(*b))
    };

    let all_int = values.iter().all(|v| matches!(v, Value::Int(_) | Value::Absent));
    Ok(middle.map(|m| integral_or_float(m, all_int)))
}

fn mean(column: &str, values: &[Value]) -> Result<Option<Value>> {
    Ok(sorted_numbers(column, values)?.map(|numbers| {
        let n = numbers.len() as f64;
        Value::float(numbers.iter().sum::<f64>() / n)
    }))
}

fn integral_or_float(v: f64, prefer_int: bool) -> Value {
    if prefer_int && v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::Int(v as i64)
    } else {
        Value::float(v)
    }
}
