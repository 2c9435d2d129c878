//! The in-memory table every pipeline stage operates on.
//!
//! A [`Table`] is an ordered list of uniquely named columns sharing one row
//! count. Tables are values: every operation returns a new table and leaves
//! the receiver untouched. Column data sits behind an [`Arc`] so a new
//! snapshot only allocates for the columns it actually changes.
//!
//! ```
//! use tabwash::table::{Table, Value};
//!
//! let table = Table::new(vec![
//!     ("Quantity".to_owned(), vec![Value::Int(2), Value::Absent]),
//! ])?;
//! let wider = table.with_column("Price", vec![Value::Int(5), Value::Int(5)])?;
//!
//! assert_eq!(table.column_names(), vec!["Quantity"]);
//! assert_eq!(wider.column_names(), vec!["Quantity", "Price"]);
//! assert_eq!(wider.row_count(), 2);
//! # Ok::<(), tabwash::error::CleanError>(())
//! ```

mod infer;
pub mod schema;
pub mod value;

pub use schema::{ColumnSpec, SemanticType};
pub use value::Value;

use crate::error::{CleanError, Result};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Arc<[Value]>,
}

/// Rows × named columns of [`Value`] cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from `(name, values)` pairs.
    ///
    /// # Errors
    ///
    /// `Schema` if two columns share a name or lengths differ.
    pub fn new(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        columns
            .into_iter()
            .try_fold(Self::empty(), |table, (name, values)| {
                if table.has_column(&name) {
                    return Err(CleanError::Schema(format!("Duplicate column '{name}'")));
                }
                table.with_column(&name, values)
            })
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Values of one column in row order.
    ///
    /// # Errors
    ///
    /// `Schema` if the column does not exist.
    pub fn get_column(&self, name: &str) -> Result<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &*c.values)
            .ok_or_else(|| CleanError::missing_column(name))
    }

    /// Iterate `(name, values)` in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns.iter().map(|c| (c.name.as_str(), &*c.values))
    }

    /// Values of one row in column order, or `None` past the end.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        (index < self.row_count).then(|| {
            self.columns
                .iter()
                .filter_map(|c| c.values.get(index))
                .collect()
        })
    }

    /// Return a table with `name` set to `values`.
    ///
    /// An existing column keeps its position; a new one is appended.
    ///
    /// # Errors
    ///
    /// `Schema` if `values` does not have `row_count()` entries. A table with
    /// no columns accepts any length.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Self> {
        if !self.columns.is_empty() && values.len() != self.row_count {
            return Err(CleanError::Schema(format!(
                "Column '{name}' has {} values, table has {} rows",
                values.len(),
                self.row_count
            )));
        }

        let column = Column {
            name: name.to_owned(),
            values: values.into(),
        };
        let row_count = column.values.len();
        let mut columns = self.columns.clone();
        match self.position(name) {
            Some(idx) => {
                if let Some(slot) = columns.get_mut(idx) {
                    *slot = column;
                }
            }
            None => columns.push(column),
        }

        Ok(Self { columns, row_count })
    }

    /// Return a table without the named columns.
    ///
    /// # Errors
    ///
    /// `Schema` if any name is not a column.
    pub fn without_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        if let Some(missing) = names.iter().find(|n| !self.has_column(n.as_ref())) {
            return Err(CleanError::missing_column(missing.as_ref()));
        }

        let columns = self
            .columns
            .iter()
            .filter(|c| !names.iter().any(|n| n.as_ref() == c.name))
            .cloned()
            .collect::<Vec<_>>();
        let row_count = if columns.is_empty() { 0 } else { self.row_count };

        Ok(Self { columns, row_count })
    }

    /// Return a table with column `from` renamed to `to`, keeping its position.
    ///
    /// # Errors
    ///
    /// `Schema` if `from` is missing or `to` already names another column.
    pub fn rename_column(&self, from: &str, to: &str) -> Result<Self> {
        let idx = self
            .position(from)
            .ok_or_else(|| CleanError::missing_column(from))?;
        if from != to && self.has_column(to) {
            return Err(CleanError::Schema(format!(
                "Cannot rename '{from}' to '{to}': column already exists"
            )));
        }

        let mut columns = self.columns.clone();
        if let Some(column) = columns.get_mut(idx) {
            to.clone_into(&mut column.name);
        }
        Ok(Self {
            columns,
            row_count: self.row_count,
        })
    }

    /// Keep only rows whose entry in `keep` is true.
    ///
    /// # Errors
    ///
    /// `Schema` if `keep` does not have one entry per row.
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Self> {
        if keep.len() != self.row_count {
            return Err(CleanError::Schema(format!(
                "Row mask has {} entries, table has {} rows",
                keep.len(),
                self.row_count
            )));
        }

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: c
                    .values
                    .iter()
                    .zip(keep)
                    .filter(|&(_, k)| *k)
                    .map(|(v, _)| v.clone())
                    .collect(),
            })
            .collect();

        Ok(Self {
            columns,
            row_count: keep.iter().filter(|k| **k).count(),
        })
    }

    /// Inferred spec of one column.
    ///
    /// # Errors
    ///
    /// `Schema` if the column does not exist.
    pub fn column_spec(&self, name: &str) -> Result<ColumnSpec> {
        Ok(ColumnSpec::infer(name, self.get_column(name)?))
    }

    /// Inferred specs of all columns, in order.
    pub fn schema(&self) -> Vec<ColumnSpec> {
        self.columns()
            .map(|(name, values)| ColumnSpec::infer(name, values))
            .collect()
    }
}
