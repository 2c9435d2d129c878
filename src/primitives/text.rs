//! Value substitution and text reshaping.

use super::changed_cells;
use crate::error::{CleanError, Result};
use crate::report::ChangeReport;
use crate::table::{Table, Value};

/// Substitute every cell exactly equal to `from` with `to`.
///
/// Equality is strict: `Int(3)` does not match `Float(3.0)` and text is
/// compared case-sensitively.
///
/// # Errors
///
/// `Schema` if the column does not exist.
pub fn replace_value(
    table: &Table,
    column: &str,
    from: &Value,
    to: &Value,
) -> Result<(Table, ChangeReport)> {
    map_cells(table, column, |v| {
        if v == from {
            to.clone()
        } else {
            v.clone()
        }
    })
}

/// Replace every occurrence of `pattern` inside text cells.
///
/// # Errors
///
/// `Schema` if the column does not exist.
pub fn replace_text(
    table: &Table,
    column: &str,
    pattern: &str,
    replacement: &str,
) -> Result<(Table, ChangeReport)> {
    map_cells(table, column, |v| match v {
        Value::Text(s) => Value::Text(s.replace(pattern, replacement)),
        other => other.clone(),
    })
}

/// Strip leading and trailing whitespace from text cells.
///
/// # Errors
///
/// `Schema` if the column does not exist.
pub fn trim_whitespace(table: &Table, column: &str) -> Result<(Table, ChangeReport)> {
    map_cells(table, column, |v| match v {
        Value::Text(s) => Value::text(s.trim()),
        other => other.clone(),
    })
}

fn map_cells(
    table: &Table,
    column: &str,
    f: impl Fn(&Value) -> Value,
) -> Result<(Table, ChangeReport)> {
    let before = table.get_column(column)?;
    let after: Vec<Value> = before.iter().map(f).collect();
    let report = ChangeReport {
        cells_modified: ChangeReport::count_changes(before, &after),
        ..Default::default()
    };
    Ok((table.with_column(column, after)?, report))
}

/// Split each cell of `column` on `delimiter` into the columns named by `into`.
///
/// At most `into.len()` tokens are produced, the last one keeping any
/// remainder. Missing tokens and absent sources give `Absent`. Non-text
/// values are split on their display form.
///
/// # Errors
///
/// `InvalidConfig` for an empty `into` or delimiter, `Schema` if the column
/// does not exist.
pub fn split_column(
    table: &Table,
    column: &str,
    delimiter: &str,
    into: &[String],
    drop_source: bool,
) -> Result<(Table, ChangeReport)> {
    if into.is_empty() || delimiter.is_empty() {
        return Err(CleanError::InvalidConfig(format!(
            "splitting '{column}' needs a delimiter and at least one output column"
        )));
    }

    let source = table.get_column(column)?;
    let mut outputs = vec![Vec::with_capacity(source.len()); into.len()];
    for value in source {
        let text = match value {
            Value::Absent => None,
            Value::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        };
        let mut tokens = text.as_deref().map(|t| t.splitn(into.len(), delimiter));
        for output in &mut outputs {
            let token = tokens.as_mut().and_then(Iterator::next);
            output.push(token.map_or(Value::Absent, Value::text));
        }
    }

    let mut report = ChangeReport::default();
    let mut out = table.clone();
    for (name, values) in into.iter().zip(outputs) {
        report.cells_modified += changed_cells(&out, name, &values);
        if !out.has_column(name) {
            report.columns_added.push(name.clone());
        }
        out = out.with_column(name, values)?;
    }

    if drop_source && !into.iter().any(|n| n == column) {
        out = out.without_columns(&[column])?;
        report.columns_removed.push(column.to_owned());
    }

    Ok((out, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(values: Vec<Value>) -> Table {
        Table::new(vec![("c".to_owned(), values)]).unwrap()
    }

    #[test]
    fn test_replace_value_to_absent() {
        let (out, report) = replace_value(
            &table(vec![Value::text("UNKNOWN"), Value::text("Cash")]),
            "c",
            &Value::text("UNKNOWN"),
            &Value::Absent,
        )
        .unwrap();
        assert_eq!(out.get_column("c").unwrap(), &[Value::Absent, Value::text("Cash")]);
        assert_eq!(report.cells_modified, 1);
    }

    #[test]
    fn test_replace_value_is_exact() {
        let (_, report) = replace_value(
            &table(vec![Value::Int(3), Value::text("3")]),
            "c",
            &Value::Float(3.0),
            &Value::Absent,
        )
        .unwrap();
        assert_eq!(report.cells_modified, 0);
    }

    #[test]
    fn test_replace_text_strips_separators() {
        let (out, _) = replace_text(
            &table(vec![Value::text("1,160.0"), Value::Float(50.0)]),
            "c",
            ",",
            "",
        )
        .unwrap();
        assert_eq!(out.get_column("c").unwrap(), &[Value::text("1160.0"), Value::Float(50.0)]);
    }

    #[test]
    fn test_trim_whitespace() {
        let (out, report) = trim_whitespace(&table(vec![Value::text("  a "), Value::text("b")]), "c")
            .unwrap();
        assert_eq!(out.get_column("c").unwrap(), &[Value::text("a"), Value::text("b")]);
        assert_eq!(report.cells_modified, 1);
    }

    #[test]
    fn test_split_column_pads_with_absent() {
        let input = table(vec![
            Value::text("90 min"),
            Value::text("2 Seasons"),
            Value::text("solo"),
            Value::Absent,
        ]);
        let into = vec!["value".to_owned(), "unit".to_owned()];
        let (out, report) = split_column(&input, "c", " ", &into, true).unwrap();

        assert_eq!(out.column_names(), vec!["value", "unit"]);
        assert_eq!(
            out.get_column("value").unwrap(),
            &[
                Value::text("90"),
                Value::text("2"),
                Value::text("solo"),
                Value::Absent
            ]
        );
        assert_eq!(
            out.get_column("unit").unwrap(),
            &[
                Value::text("min"),
                Value::text("Seasons"),
                Value::Absent,
                Value::Absent
            ]
        );
        assert_eq!(report.columns_added, into);
        assert_eq!(report.columns_removed, vec!["c".to_owned()]);
    }

    #[test]
    fn test_split_column_keeps_remainder_in_last_part() {
        let input = table(vec![Value::text("a,b,c")]);
        let into = vec!["head".to_owned(), "rest".to_owned()];
        let (out, _) = split_column(&input, "c", ",", &into, false).unwrap();
        assert_eq!(out.get_column("rest").unwrap(), &[Value::text("b,c")]);
        assert!(out.has_column("c"));
    }
}
