//! A named, configured primitive.

use super::spec::ErrorPolicy;
use crate::error::{StageContext as _, StageError};
use crate::primitives::Primitive;
use crate::report::ChangeReport;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// One step of a pipeline.
///
/// In JSON the primitive's fields sit next to the stage name:
/// `{ "name": "...", "op": "...", ...params, "on_error": "skip" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,

    #[serde(flatten)]
    pub primitive: Primitive,

    /// Overrides the pipeline policy for this stage only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<ErrorPolicy>,
}

impl Stage {
    pub fn new(name: impl Into<String>, primitive: Primitive) -> Self {
        Self {
            name: name.into(),
            primitive,
            on_error: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = Some(policy);
        self
    }

    /// Apply the primitive to `table`, attributing any failure to this stage.
    ///
    /// The input is only borrowed; on error the caller still holds it intact.
    ///
    /// # Errors
    ///
    /// The primitive's error wrapped with the stage name and its columns.
    pub fn apply(&self, table: &Table) -> Result<(Table, ChangeReport), StageError> {
        self.primitive
            .apply(table)
            .in_stage(&self.name, &self.primitive.target_columns())
    }
}
