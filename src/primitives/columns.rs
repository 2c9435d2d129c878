//! Adding, removing and renaming whole columns.

use super::changed_cells;
use super::expr::Expr;
use crate::error::Result;
use crate::report::ChangeReport;
use crate::table::Table;
use std::collections::BTreeMap;

/// Compute `name` from `expr` row by row. An existing column of that name is
/// overwritten in place, otherwise the column is appended.
///
/// # Errors
///
/// Whatever [`Expr::evaluate`] raises.
pub fn derive_column(table: &Table, name: &str, expr: &Expr) -> Result<(Table, ChangeReport)> {
    let values = expr.evaluate(table, name)?;
    let mut report = ChangeReport {
        cells_modified: changed_cells(table, name, &values),
        ..Default::default()
    };
    if !table.has_column(name) {
        report.columns_added.push(name.to_owned());
    }
    Ok((table.with_column(name, values)?, report))
}

/// Remove columns. Unknown names are an error unless `ignore_missing`.
///
/// # Errors
///
/// `Schema` for an unknown column when `ignore_missing` is false.
pub fn drop_columns(
    table: &Table,
    columns: &[String],
    ignore_missing: bool,
) -> Result<(Table, ChangeReport)> {
    let present: Vec<&String> = if ignore_missing {
        columns.iter().filter(|c| table.has_column(c)).collect()
    } else {
        columns.iter().collect()
    };

    let out = table.without_columns(&present)?;
    let report = ChangeReport {
        columns_removed: present.into_iter().cloned().collect(),
        ..Default::default()
    };
    Ok((out, report))
}

/// Rename columns in place, keeping their positions.
///
/// # Errors
///
/// `Schema` if a source is missing or a target name is taken.
pub fn rename_columns(
    table: &Table,
    mapping: &BTreeMap<String, String>,
) -> Result<(Table, ChangeReport)> {
    let mut out = table.clone();
    let mut report = ChangeReport::default();
    for (from, to) in mapping {
        out = out.rename_column(from, to)?;
        if from != to {
            report.columns_removed.push(from.clone());
            report.columns_added.push(to.clone());
        }
    }
    Ok((out, report))
}
