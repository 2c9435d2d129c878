//! Declared column types and their validation.

use super::value::Value;
use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};

/// Semantic type a column is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Any mix of present values
    #[default]
    Any,
    /// Integers or floats
    Numeric,
    Integer,
    Text,
    Boolean,
    Timestamp,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
        }
    }

    /// Whether a present value fits this type. Absent cells are a nullability
    /// question, not a type question, and always pass here.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _)
            | (_, Value::Absent)
            | (Self::Numeric, Value::Int(_) | Value::Float(_))
            | (Self::Integer, Value::Int(_))
            | (Self::Text, Value::Text(_))
            | (Self::Boolean, Value::Bool(_))
            | (Self::Timestamp, Value::Timestamp(_)) => true,
            _ => false,
        }
    }

    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Absent => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Int(_) => Some(Self::Integer),
            Value::Float(_) => Some(Self::Numeric),
            Value::Timestamp(_) => Some(Self::Timestamp),
            Value::Text(_) => Some(Self::Text),
        }
    }

    /// Narrowest type covering both.
    fn unify(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Integer | Self::Numeric, Self::Integer | Self::Numeric) => Self::Numeric,
            _ => Self::Any,
        }
    }
}

/// Name, declared type and nullability of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,

    #[serde(default)]
    pub kind: SemanticType,

    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: SemanticType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable,
        }
    }

    /// Infer the narrowest spec describing `values`.
    pub fn infer(name: impl Into<String>, values: &[Value]) -> Self {
        let kind = values
            .iter()
            .filter_map(SemanticType::of)
            .reduce(SemanticType::unify)
            .unwrap_or_default();

        Self {
            name: name.into(),
            kind,
            nullable: values.iter().any(Value::is_absent),
        }
    }

    /// Check that `values` satisfy this spec.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` for the first present value of the wrong type,
    /// `IncompleteData` if the column is non-nullable and holds absent cells.
    pub fn validate(&self, values: &[Value]) -> Result<()> {
        if let Some(bad) = values.iter().find(|v| !self.kind.accepts(v)) {
            return Err(CleanError::type_mismatch(
                &self.name,
                self.kind.as_str(),
                format!("{} '{bad}'", bad.type_name()),
            ));
        }

        if !self.nullable {
            let missing = values.iter().filter(|v| v.is_absent()).count();
            if missing > 0 {
                return Err(CleanError::IncompleteData {
                    column: self.name.clone(),
                    missing,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_widens_int_and_float_to_numeric() {
        let spec = ColumnSpec::infer("x", &[Value::Int(1), Value::Absent, Value::Float(2.5)]);
        assert_eq!(spec.kind, SemanticType::Numeric);
        assert!(spec.nullable);
    }

    #[test]
    fn test_infer_mixed_is_any() {
        let spec = ColumnSpec::infer("x", &[Value::Int(1), Value::text("a")]);
        assert_eq!(spec.kind, SemanticType::Any);
        assert!(!spec.nullable);
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let spec = ColumnSpec::new("x", SemanticType::Integer, true);
        let err = spec
            .validate(&[Value::Int(1), Value::Float(1.5)])
            .unwrap_err();
        assert!(matches!(err, CleanError::TypeMismatch { .. }));
    }

    #[test]
    fn test_validate_rejects_absent_when_not_nullable() {
        let spec = ColumnSpec::new("x", SemanticType::Numeric, false);
        let err = spec.validate(&[Value::Int(1), Value::Absent]).unwrap_err();
        assert_eq!(
            err,
            CleanError::IncompleteData {
                column: "x".to_owned(),
                missing: 1
            }
        );
    }
}
