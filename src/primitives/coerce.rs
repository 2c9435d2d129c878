//! Type coercion: numeric, integer and datetime.
//!
//! Every coercion runs a value-level conversion over one column. Values that
//! fail to convert are resolved by a [`ConversionPolicy`]; only `fail` turns
//! them into an error.

use crate::error::{CleanError, Result};
use crate::report::ChangeReport;
use crate::table::{ColumnSpec, SemanticType, Table, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// What to do with a value that fails conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPolicy {
    /// Replace the value with `Absent`.
    #[default]
    Null,
    /// Remove the whole row from the table.
    DropRow,
    /// Abort the stage with a `ParseFailure`.
    Fail,
}

/// Formats tried, in order, when no explicit datetime format is configured.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Parse every value of `column` as a number.
///
/// Integers and floats pass through untouched, booleans become 0/1 and text
/// is trimmed then parsed as an integer, falling back to a float. Blank text
/// becomes `Absent` without counting as a failure.
///
/// # Errors
///
/// `ParseFailure` if any value fails and `policy` is `Fail`.
pub fn coerce_numeric(
    table: &Table,
    column: &str,
    policy: ConversionPolicy,
) -> Result<(Table, ChangeReport)> {
    convert_column(table, column, policy, to_numeric)
}

/// Convert every value of a fully populated column to an integer.
///
/// Floats are truncated toward zero, booleans become 0/1, numeric text is
/// parsed first.
///
/// # Errors
///
/// `IncompleteData` if the column holds any absent cell, `ParseFailure` if a
/// value has no integer reading.
pub fn coerce_integer(table: &Table, column: &str) -> Result<(Table, ChangeReport)> {
    let missing = table
        .get_column(column)?
        .iter()
        .filter(|v| v.is_absent())
        .count();
    if missing > 0 {
        return Err(CleanError::IncompleteData {
            column: column.to_owned(),
            missing,
        });
    }

    let (out, report) = convert_column(table, column, ConversionPolicy::Fail, to_integer)?;
    ColumnSpec::new(column, SemanticType::Integer, false).validate(out.get_column(column)?)?;
    Ok((out, report))
}

/// Parse every value of `column` as a timestamp.
///
/// With `format`, the value must match it (a date-only format yields
/// midnight). Without one a fixed list of common layouts is tried. Values
/// that do not parse never abort the stage: they become `Absent` or, under
/// `DropRow`, remove their row.
///
/// # Errors
///
/// `InvalidConfig` if `policy` is `Fail`.
pub fn coerce_datetime(
    table: &Table,
    column: &str,
    format: Option<&str>,
    policy: ConversionPolicy,
) -> Result<(Table, ChangeReport)> {
    if policy == ConversionPolicy::Fail {
        return Err(CleanError::InvalidConfig(format!(
            "datetime coercion of '{column}' cannot use the 'fail' policy"
        )));
    }
    convert_column(table, column, policy, |v| to_timestamp(v, format))
}

/// Run `convert` over one column; `None` marks a failed conversion.
fn convert_column<F>(
    table: &Table,
    column: &str,
    policy: ConversionPolicy,
    convert: F,
) -> Result<(Table, ChangeReport)>
where
    F: Fn(&Value) -> Option<Value>,
{
    let before = table.get_column(column)?;
    let mut report = ChangeReport::default();
    let mut keep = Vec::with_capacity(before.len());
    let mut after = Vec::with_capacity(before.len());

    for value in before {
        if let Some(converted) = convert(value) {
            after.push(converted);
            keep.push(true);
        } else {
            report.record_failure(value);
            after.push(Value::Absent);
            keep.push(policy != ConversionPolicy::DropRow);
        }
    }

    if report.conversion_failures > 0 {
        log::debug!(
            "'{column}': {} value(s) failed conversion, policy {policy:?}",
            report.conversion_failures
        );
        if policy == ConversionPolicy::Fail {
            return Err(CleanError::ParseFailure {
                column: column.to_owned(),
                failures: report.conversion_failures,
                samples: report.failure_samples,
            });
        }
    }

    report.cells_modified = before
        .iter()
        .zip(&after)
        .zip(&keep)
        .filter(|((b, a), k)| **k && b != a)
        .count();

    let mut out = table.with_column(column, after)?;
    if policy == ConversionPolicy::DropRow && report.conversion_failures > 0 {
        out = out.filter_rows(&keep)?;
        report.rows_dropped = keep.iter().filter(|k| !**k).count();
    }

    Ok((out, report))
}

fn to_numeric(value: &Value) -> Option<Value> {
    match value {
        Value::Absent | Value::Int(_) | Value::Float(_) => Some(value.clone()),
        Value::Bool(b) => Some(Value::Int(i64::from(*b))),
        Value::Text(s) => parse_number(s),
        Value::Timestamp(_) => None,
    }
}

/// Parse text as an integer, else a finite float. Blank text is `Absent`.
pub(crate) fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if s.is_empty() {
        return Some(Value::Absent);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Int(_) => Some(value.clone()),
        Value::Bool(b) => Some(Value::Int(i64::from(*b))),
        Value::Float(f) => truncate(*f),
        Value::Text(s) => match parse_number(s)? {
            Value::Float(f) => truncate(f),
            Value::Int(i) => Some(Value::Int(i)),
            _ => None,
        },
        Value::Absent | Value::Timestamp(_) => None,
    }
}

fn truncate(f: f64) -> Option<Value> {
    // bounds exclude values that would saturate on the cast
    (f.is_finite() && f >= -9.2e18 && f <= 9.2e18).then(|| Value::Int(f.trunc() as i64))
}

fn to_timestamp(value: &Value, format: Option<&str>) -> Option<Value> {
    match value {
        Value::Absent | Value::Timestamp(_) => Some(value.clone()),
        Value::Text(s) if s.trim().is_empty() => Some(Value::Absent),
        Value::Text(s) => parse_timestamp(s.trim(), format).map(Value::Timestamp),
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => None,
    }
}

pub(crate) fn parse_timestamp(s: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    let at_midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);

    if let Some(fmt) = format {
        return NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .or_else(|| NaiveDate::parse_from_str(s, fmt).ok().map(at_midnight));
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(at_midnight)
        })
}
