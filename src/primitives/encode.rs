//! Categorical encoding.

use crate::error::{CleanError, Result};
use crate::report::ChangeReport;
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Order in which label codes are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrder {
    /// Codes follow first appearance in row order. Reordering the input
    /// rows can change the codes.
    #[default]
    FirstSeen,
    /// Codes follow the sorted category order and are stable across row orders.
    Sorted,
}

/// Distinct present values in first-seen order.
pub(crate) fn distinct(values: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| v.key().is_some_and(|k| seen.insert(k)))
        .cloned()
        .collect()
}

/// Replace `column` with one boolean column per category.
///
/// Categories are sorted (see [`Value::total_cmp`]) and the new columns,
/// named `{column}_{category}`, are appended after the existing ones. A whole
/// float and the equal integer are one category, named after its first
/// appearance. With
/// `drop_first` the smallest category gets no column, so its rows are all
/// false. Absent cells are false everywhere.
///
/// # Errors
///
/// `Schema` if the column is missing or a generated name already exists.
pub fn one_hot_encode(
    table: &Table,
    column: &str,
    drop_first: bool,
) -> Result<(Table, ChangeReport)> {
    let source = table.get_column(column)?;
    let mut categories = distinct(source);
    categories.sort_by(Value::total_cmp);

    let kept = categories.get(usize::from(drop_first)..).unwrap_or_default();
    let mut report = ChangeReport {
        cardinality: Some(categories.len()),
        columns_removed: vec![column.to_owned()],
        ..Default::default()
    };

    let mut out = table.without_columns(&[column])?;
    for category in kept {
        let name = format!("{column}_{category}");
        if out.has_column(&name) {
            return Err(CleanError::Schema(format!(
                "One-hot column '{name}' collides with an existing column"
            )));
        }
        let key = category.key();
        let flags: Vec<Value> = source
            .iter()
            .map(|v| Value::Bool(v.is_present() && v.key() == key))
            .collect();
        report.cells_modified += flags.len();
        report.columns_added.push(name.clone());
        out = out.with_column(&name, flags)?;
    }

    log::debug!(
        "one-hot '{column}': {} categories, {} columns",
        categories.len(),
        kept.len()
    );
    Ok((out, report))
}

/// Replace each category of `column` with an integer code.
///
/// Codes run from 0 without gaps; absent cells stay absent.
///
/// # Errors
///
/// `Schema` if the column is missing.
pub fn label_encode(
    table: &Table,
    column: &str,
    order: CategoryOrder,
) -> Result<(Table, ChangeReport)> {
    let before = table.get_column(column)?;
    let mut categories = distinct(before);
    if order == CategoryOrder::Sorted {
        categories.sort_by(Value::total_cmp);
    }

    let codes: HashMap<_, i64> = categories
        .iter()
        .zip(0..)
        .filter_map(|(v, code)| v.key().map(|k| (k, code)))
        .collect();
    let after: Vec<Value> = before
        .iter()
        .map(|v| {
            v.key()
                .and_then(|k| codes.get(&k))
                .map_or(Value::Absent, |code| Value::Int(*code))
        })
        .collect();

    let report = ChangeReport {
        cells_modified: ChangeReport::count_changes(before, &after),
        cardinality: Some(categories.len()),
        ..Default::default()
    };
    Ok((table.with_column(column, after)?, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::coerce::{ConversionPolicy, coerce_numeric};
    use pretty_assertions::assert_eq;

    fn areas() -> Table {
        Table::new(vec![
            (
                "Property_Area".to_owned(),
                vec![
                    Value::text("Urban"),
                    Value::text("Rural"),
                    Value::text("Semiurban"),
                    Value::text("Urban"),
                    Value::Absent,
                ],
            ),
            ("id".to_owned(), vec![Value::Int(1); 5]),
        ])
        .unwrap()
    }

    #[test]
    fn test_one_hot_drop_first() {
        let (out, report) = one_hot_encode(&areas(), "Property_Area", true).unwrap();

        assert_eq!(
            out.column_names(),
            vec!["id", "Property_Area_Semiurban", "Property_Area_Urban"]
        );
        assert_eq!(
            out.get_column("Property_Area_Urban").unwrap(),
            &[
                Value::Bool(true),
                Value::Bool(false),
                Value::Bool(false),
                Value::Bool(true),
                Value::Bool(false)
            ]
        );
        assert_eq!(report.cardinality, Some(3));
        assert_eq!(report.columns_removed, vec!["Property_Area".to_owned()]);
    }

    #[test]
    fn test_one_hot_keep_all() {
        let (out, report) = one_hot_encode(&areas(), "Property_Area", false).unwrap();
        assert_eq!(report.columns_added.len(), 3);
        assert!(out.has_column("Property_Area_Rural"));
    }

    #[test]
    fn test_one_hot_only_column() {
        let table = Table::new(vec![(
            "Married".to_owned(),
            vec![Value::text("Yes"), Value::text("No")],
        )])
        .unwrap();
        let (out, _) = one_hot_encode(&table, "Married", true).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(
            out.get_column("Married_Yes").unwrap(),
            &[Value::Bool(true), Value::Bool(false)]
        );
    }

    #[test]
    fn test_label_encode_first_seen() {
        let (out, report) = label_encode(&areas(), "Property_Area", CategoryOrder::FirstSeen)
            .unwrap();
        assert_eq!(
            out.get_column("Property_Area").unwrap(),
            &[
                Value::Int(0),
                Value::Int(1),
                Value::Int(2),
                Value::Int(0),
                Value::Absent
            ]
        );
        assert_eq!(report.cardinality, Some(3));
        assert_eq!(report.cells_modified, 4);
    }

    #[test]
    fn test_label_encode_sorted() {
        let (out, _) = label_encode(&areas(), "Property_Area", CategoryOrder::Sorted).unwrap();
        assert_eq!(
            out.get_column("Property_Area").unwrap(),
            &[
                Value::Int(2),
                Value::Int(0),
                Value::Int(1),
                Value::Int(2),
                Value::Absent
            ]
        );
    }

    fn coerced_flags() -> Table {
        let raw = Table::new(vec![(
            "c".to_owned(),
            vec![Value::text("1"), Value::text("1.0"), Value::text("0")],
        )])
        .unwrap();
        let (out, _) = coerce_numeric(&raw, "c", ConversionPolicy::Null).unwrap();
        assert_eq!(
            out.get_column("c").unwrap(),
            &[Value::Int(1), Value::Float(1.0), Value::Int(0)]
        );
        out
    }

    #[test]
    fn test_one_hot_mixed_numeric_column() {
        let (out, report) = one_hot_encode(&coerced_flags(), "c", false).unwrap();
        assert_eq!(out.column_names(), vec!["c_0", "c_1"]);
        assert_eq!(
            out.get_column("c_1").unwrap(),
            &[Value::Bool(true), Value::Bool(true), Value::Bool(false)]
        );
        assert_eq!(report.cardinality, Some(2));
    }

    #[test]
    fn test_label_encode_mixed_numeric_column() {
        let (out, report) = label_encode(&coerced_flags(), "c", CategoryOrder::FirstSeen).unwrap();
        assert_eq!(
            out.get_column("c").unwrap(),
            &[Value::Int(0), Value::Int(0), Value::Int(1)]
        );
        assert_eq!(report.cardinality, Some(2));
    }

    #[test]
    fn test_one_hot_names_keep_float_form() {
        let table = Table::new(vec![(
            "Credit_History".to_owned(),
            vec![Value::Float(1.0), Value::Float(0.0)],
        )])
        .unwrap();
        let (out, _) = one_hot_encode(&table, "Credit_History", true).unwrap();
        assert_eq!(out.column_names(), vec!["Credit_History_1.0"]);
    }
}
