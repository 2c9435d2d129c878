//! Row-wise expressions for derived columns.
//!
//! An [`Expr`] is a small serializable tree evaluated one column at a time:
//! every node yields a full column of values, so evaluating `a * b` zips two
//! columns rather than looking cells up row by row.
//!
//! ```
//! use tabwash::primitives::Expr;
//!
//! // ln(ApplicantIncome + CoapplicantIncome + 1)
//! let expr = Expr::col("ApplicantIncome")
//!     .add(Expr::col("CoapplicantIncome"))
//!     .ln1p();
//! assert_eq!(expr.columns(), vec!["ApplicantIncome", "CoapplicantIncome"]);
//! ```

use crate::error::{CleanError, Result};
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fn", rename_all = "snake_case")]
pub enum Expr {
    Column {
        name: String,
    },
    Literal {
        value: Value,
    },
    Add {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Sub {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Mul {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Always a float; division by zero is `Absent`.
    Div {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Natural log of `input + 1`.
    Ln1p {
        input: Box<Expr>,
    },
    /// Last `delimiter`-separated token, trimmed.
    LastToken {
        input: Box<Expr>,
        delimiter: String,
    },
    /// Token at `index` (0-based), trimmed; `Absent` when there are fewer.
    Token {
        input: Box<Expr>,
        delimiter: String,
        index: usize,
    },
    /// Whole days from `start` to `end`.
    DaysBetween {
        start: Box<Expr>,
        end: Box<Expr>,
    },
    /// Whether the value's text contains `needle`; absent is false.
    Contains {
        input: Box<Expr>,
        needle: String,
    },
    /// `then` where `condition` is true, `otherwise` where false or absent.
    IfElse {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// First present value among `items`.
    Coalesce {
        items: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Self::Column { name: name.into() }
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    #[expect(clippy::should_implement_trait)]
    pub fn add(self, other: Self) -> Self {
        Self::Add {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[expect(clippy::should_implement_trait)]
    pub fn sub(self, other: Self) -> Self {
        Self::Sub {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[expect(clippy::should_implement_trait)]
    pub fn mul(self, other: Self) -> Self {
        Self::Mul {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[expect(clippy::should_implement_trait)]
    pub fn div(self, other: Self) -> Self {
        Self::Div {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn ln1p(self) -> Self {
        Self::Ln1p {
            input: Box::new(self),
        }
    }

    pub fn last_token(self, delimiter: impl Into<String>) -> Self {
        Self::LastToken {
            input: Box::new(self),
            delimiter: delimiter.into(),
        }
    }

    pub fn token(self, delimiter: impl Into<String>, index: usize) -> Self {
        Self::Token {
            input: Box::new(self),
            delimiter: delimiter.into(),
            index,
        }
    }

    pub fn days_between(start: Self, end: Self) -> Self {
        Self::DaysBetween {
            start: Box::new(start),
            end: Box::new(end),
        }
    }

    pub fn contains(self, needle: impl Into<String>) -> Self {
        Self::Contains {
            input: Box::new(self),
            needle: needle.into(),
        }
    }

    pub fn if_else(condition: Self, then: Self, otherwise: Self) -> Self {
        Self::IfElse {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn coalesce(items: Vec<Self>) -> Self {
        Self::Coalesce { items }
    }

    /// Column names the expression reads, in first-reference order.
    pub fn columns(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Column { name } => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Self::Literal { .. } => {}
            Self::Add { left, right }
            | Self::Sub { left, right }
            | Self::Mul { left, right }
            | Self::Div { left, right } => {
                left.collect_columns(names);
                right.collect_columns(names);
            }
            Self::Ln1p { input }
            | Self::LastToken { input, .. }
            | Self::Token { input, .. }
            | Self::Contains { input, .. } => input.collect_columns(names),
            Self::DaysBetween { start, end } => {
                start.collect_columns(names);
                end.collect_columns(names);
            }
            Self::IfElse {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_columns(names);
                then.collect_columns(names);
                otherwise.collect_columns(names);
            }
            Self::Coalesce { items } => {
                for item in items {
                    item.collect_columns(names);
                }
            }
        }
    }

    /// Evaluate over every row of `table`. `target` names the column being
    /// derived and only appears in error messages.
    ///
    /// # Errors
    ///
    /// `Schema` for an unknown column, `TypeMismatch` for operands of the
    /// wrong type.
    pub fn evaluate(&self, table: &Table, target: &str) -> Result<Vec<Value>> {
        let n = table.row_count();
        match self {
            Self::Column { name } => Ok(table.get_column(name)?.to_vec()),
            Self::Literal { value } => Ok(vec![value.clone(); n]),
            Self::Add { left, right } => Self::arith(Arith::Add, left, right, table, target),
            Self::Sub { left, right } => Self::arith(Arith::Sub, left, right, table, target),
            Self::Mul { left, right } => Self::arith(Arith::Mul, left, right, table, target),
            Self::Div { left, right } => Self::arith(Arith::Div, left, right, table, target),
            Self::Ln1p { input } => input
                .evaluate(table, target)?
                .iter()
                .map(|v| match v {
                    Value::Absent => Ok(Value::Absent),
                    v => v
                        .as_f64()
                        .map(|x| Value::float(x.ln_1p()))
                        .ok_or_else(|| mismatch(target, "numeric", v)),
                })
                .collect(),
            Self::LastToken { input, delimiter } => Ok(map_text(
                input.evaluate(table, target)?,
                |s| s.rsplit(delimiter.as_str()).next().map(str::trim),
            )),
            Self::Token {
                input,
                delimiter,
                index,
            } => Ok(map_text(input.evaluate(table, target)?, |s| {
                s.split(delimiter.as_str()).nth(*index).map(str::trim)
            })),
            Self::DaysBetween { start, end } => {
                let starts = start.evaluate(table, target)?;
                let ends = end.evaluate(table, target)?;
                starts
                    .iter()
                    .zip(&ends)
                    .map(|pair| match pair {
                        (Value::Timestamp(s), Value::Timestamp(e)) => {
                            Ok(Value::Int((*e - *s).num_days()))
                        }
                        (Value::Absent, _) | (_, Value::Absent) => Ok(Value::Absent),
                        (Value::Timestamp(_), other) | (other, _) => {
                            Err(mismatch(target, "timestamp", other))
                        }
                    })
                    .collect()
            }
            Self::Contains { input, needle } => Ok(input
                .evaluate(table, target)?
                .iter()
                .map(|v| {
                    Value::Bool(match v {
                        Value::Absent => false,
                        Value::Text(s) => s.contains(needle.as_str()),
                        other => other.to_string().contains(needle.as_str()),
                    })
                })
                .collect()),
            Self::IfElse {
                condition,
                then,
                otherwise,
            } => {
                let conditions = condition.evaluate(table, target)?;
                let thens = then.evaluate(table, target)?;
                let otherwises = otherwise.evaluate(table, target)?;
                conditions
                    .into_iter()
                    .zip(thens.into_iter().zip(otherwises))
                    .map(|(c, (t, o))| match c {
                        Value::Bool(true) => Ok(t),
                        Value::Bool(false) | Value::Absent => Ok(o),
                        other => Err(mismatch(target, "boolean", &other)),
                    })
                    .collect()
            }
            Self::Coalesce { items } => {
                let mut out = vec![Value::Absent; n];
                for item in items {
                    let values = item.evaluate(table, target)?;
                    for (slot, value) in out.iter_mut().zip(values) {
                        if slot.is_absent() {
                            *slot = value;
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    fn arith(
        op: Arith,
        left: &Self,
        right: &Self,
        table: &Table,
        target: &str,
    ) -> Result<Vec<Value>> {
        let lhs = left.evaluate(table, target)?;
        let rhs = right.evaluate(table, target)?;
        lhs.iter()
            .zip(&rhs)
            .map(|(a, b)| arith_value(op, a, b, target))
            .collect()
    }
}

fn arith_value(op: Arith, a: &Value, b: &Value, target: &str) -> Result<Value> {
    match (a, b) {
        (Value::Absent, _) | (_, Value::Absent) => Ok(Value::Absent),
        (Value::Int(x), Value::Int(y)) if !matches!(op, Arith::Div) => {
            let exact = match op {
                Arith::Add => x.checked_add(*y),
                Arith::Sub => x.checked_sub(*y),
                Arith::Mul => x.checked_mul(*y),
                Arith::Div => None,
            };
            Ok(exact.map_or_else(|| float_op(op, *x as f64, *y as f64), Value::Int))
        }
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(float_op(op, x, y)),
            (None, _) => Err(mismatch(target, "numeric", a)),
            (_, None) => Err(mismatch(target, "numeric", b)),
        },
    }
}

fn float_op(op: Arith, x: f64, y: f64) -> Value {
    Value::float(match op {
        Arith::Add => x + y,
        Arith::Sub => x - y,
        Arith::Mul => x * y,
        Arith::Div => x / y,
    })
}

/// Apply a text projection to present values, rendering non-text first.
fn map_text<F>(values: Vec<Value>, f: F) -> Vec<Value>
where
    F: Fn(&str) -> Option<&str>,
{
    values
        .into_iter()
        .map(|v| {
            let text = match v {
                Value::Absent => return Value::Absent,
                Value::Text(s) => s,
                other => other.to_string(),
            };
            f(&text).map_or(Value::Absent, Value::text)
        })
        .collect()
}

fn mismatch(target: &str, expected: &str, found: &Value) -> CleanError {
    CleanError::type_mismatch(target, expected, format!("{} '{found}'", found.type_name()))
}
