//! Typing raw text records the way a delimited-file reader would.

use super::{Table, Value};
use crate::error::{CleanError, Result};

impl Table {
    /// Build a table from raw string cells, inferring one type per column.
    ///
    /// Empty cells become `Absent`. A column whose present cells all parse as
    /// integers becomes `Int`, else all floats becomes `Float`, else all
    /// `true`/`false` (any case) becomes `Bool`; anything else stays `Text`.
    /// A single stray marker such as `ERROR` keeps the whole column textual,
    /// leaving the decision to a coercion stage.
    ///
    /// # Errors
    ///
    /// `Schema` if a record's length differs from the header's or headers repeat.
    pub fn from_text_records<S: AsRef<str>>(headers: &[S], records: &[Vec<S>]) -> Result<Self> {
        if let Some((idx, bad)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(CleanError::Schema(format!(
                "Record {idx} has {} fields, header has {}",
                bad.len(),
                headers.len()
            )));
        }

        let columns = headers
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let raw: Vec<&str> = records
                    .iter()
                    .map(|r| r.get(col_idx).map_or("", AsRef::as_ref))
                    .collect();
                (name.as_ref().to_owned(), infer_column(&raw))
            })
            .collect();

        Self::new(columns)
    }
}

fn infer_column(raw: &[&str]) -> Vec<Value> {
    let present = || raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty());

    if present().all(|s| s.parse::<i64>().is_ok()) {
        return map_cells(raw, |s| s.parse().ok().map(Value::Int));
    }
    if present().all(|s| s.parse::<f64>().is_ok_and(f64::is_finite)) {
        return map_cells(raw, |s| s.parse().ok().map(Value::Float));
    }
    if present().all(|s| parse_bool(s).is_some()) {
        return map_cells(raw, |s| parse_bool(s).map(Value::Bool));
    }
    raw.iter()
        .map(|s| {
            if s.trim().is_empty() {
                Value::Absent
            } else {
                Value::text(*s)
            }
        })
        .collect()
}

fn map_cells(raw: &[&str], parse: impl Fn(&str) -> Option<Value>) -> Vec<Value> {
    raw.iter()
        .map(|s| parse(s.trim()).unwrap_or_default())
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
