//! Error types for table operations, primitives and pipeline stages.
//!
//! Errors come in two layers:
//!
//! - [`CleanError`] is raised by a [`Table`](crate::table::Table) operation or
//!   a primitive and describes *what* went wrong.
//! - [`StageError`] wraps a `CleanError` with the name of the stage and the
//!   columns it targeted, so a failed run can say *where* it went wrong.
//!
//! Value-level parse failures never surface here on their own. A primitive
//! resolves them through its [`ConversionPolicy`](crate::primitives::ConversionPolicy)
//! and only raises [`CleanError::ParseFailure`] when that policy is `fail`.
//!
//! ```
//! use tabwash::error::{CleanError, ErrorKind};
//!
//! let err = CleanError::EmptyColumn { column: "LoanAmount".to_owned() };
//! assert_eq!(err.kind(), ErrorKind::EmptyColumn);
//! assert_eq!(err.to_string(), "Column 'LoanAmount' has no values to compute a statistic from");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error raised by table operations and transform primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanError {
    /// Column shape or schema mismatch: unknown column, duplicate name, wrong length.
    Schema(String),

    /// A statistic was requested over a column with no present values.
    EmptyColumn { column: String },

    /// Integer coercion over a column that still contains absent values.
    IncompleteData { column: String, missing: usize },

    /// Values failed conversion and the stage policy asked to fail.
    ParseFailure {
        column: String,
        failures: usize,
        samples: Vec<String>,
    },

    /// A value of the wrong semantic type reached an operation that needs another.
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// The pipeline or stage configuration itself is unusable.
    InvalidConfig(String),
}

impl CleanError {
    pub(crate) fn missing_column(name: &str) -> Self {
        Self::Schema(format!("Column '{name}' not found"))
    }

    pub(crate) fn type_mismatch(
        column: &str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            column: column.to_owned(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Category of this error, for reports and matching without payloads.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(_) => ErrorKind::Schema,
            Self::EmptyColumn { .. } => ErrorKind::EmptyColumn,
            Self::IncompleteData { .. } => ErrorKind::IncompleteData,
            Self::ParseFailure { .. } => ErrorKind::ParseFailure,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(msg) => write!(f, "Schema error: {msg}"),
            Self::EmptyColumn { column } => write!(
                f,
                "Column '{column}' has no values to compute a statistic from"
            ),
            Self::IncompleteData { column, missing } => write!(
                f,
                "Column '{column}' still has {missing} missing value(s); fill them before integer coercion"
            ),
            Self::ParseFailure {
                column,
                failures,
                samples,
            } => write!(
                f,
                "Column '{column}': {failures} value(s) failed conversion (e.g. {})",
                samples.join(", ")
            ),
            Self::TypeMismatch {
                column,
                expected,
                found,
            } => write!(f, "Column '{column}': expected {expected}, found {found}"),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for CleanError {}

/// Payload-free category of a [`CleanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Schema,
    EmptyColumn,
    IncompleteData,
    ParseFailure,
    TypeMismatch,
    InvalidConfig,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "SchemaError",
            Self::EmptyColumn => "EmptyColumnError",
            Self::IncompleteData => "IncompleteDataError",
            Self::ParseFailure => "ParseFailure",
            Self::TypeMismatch => "TypeMismatch",
            Self::InvalidConfig => "InvalidConfig",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A primitive failure attributed to the stage that ran it.
#[derive(Debug, Clone, PartialEq)]
pub struct StageError {
    pub stage: String,
    pub columns: Vec<String>,
    pub source: CleanError,
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stage '{}' [{}] failed ({}): {}",
            self.stage,
            self.columns.join(", "),
            self.source.kind(),
            self.source
        )
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Result type alias for table and primitive operations.
pub type Result<T> = std::result::Result<T, CleanError>;

/// Extension trait to attribute primitive errors to a stage.
pub trait StageContext<T> {
    /// Wrap an error with the stage name and target columns.
    fn in_stage(self, stage: &str, columns: &[String]) -> std::result::Result<T, StageError>;
}

impl<T> StageContext<T> for Result<T> {
    fn in_stage(self, stage: &str, columns: &[String]) -> std::result::Result<T, StageError> {
        self.map_err(|source| StageError {
            stage: stage.to_owned(),
            columns: columns.to_vec(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CleanError::IncompleteData {
            column: "Credit_History".to_owned(),
            missing: 2,
        };
        assert_eq!(
            err.to_string(),
            "Column 'Credit_History' still has 2 missing value(s); fill them before integer coercion"
        );
    }

    #[test]
    fn test_stage_context_wraps_name_and_columns() {
        let result: Result<()> = Err(CleanError::missing_column("Price"));
        let err = result
            .in_stage("coerce_price", &["Price".to_owned()])
            .unwrap_err();

        assert_eq!(err.stage, "coerce_price");
        assert_eq!(err.columns, vec!["Price".to_owned()]);
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("coerce_price"));
        assert!(err.to_string().contains("SchemaError"));
    }

    #[test]
    fn test_stage_error_exposes_source() {
        use std::error::Error as _;

        let err = StageError {
            stage: "fill".to_owned(),
            columns: vec![],
            source: CleanError::EmptyColumn {
                column: "x".to_owned(),
            },
        };
        assert!(err.source().is_some());
    }
}
