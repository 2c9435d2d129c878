//! Pipeline specification data structures.
//!
//! Defines the JSON form of a pipeline: its version, failure policy, ordered
//! stages and the schema the output is expected to satisfy.

use super::stage::Stage;
use crate::table::ColumnSpec;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current pipeline spec version
pub const SPEC_VERSION: &str = "0.1";

/// What a failing stage does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Halt the run and discard the partial table.
    #[default]
    Abort,
    /// Record the failure and pass the stage input through unchanged.
    Skip,
}

/// Root pipeline specification structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Specification version for future migrations
    pub version: String,

    /// Human-readable pipeline name
    pub name: String,

    /// Default failure policy; stages may override it
    #[serde(default)]
    pub policy: ErrorPolicy,

    /// Ordered sequence of stages
    pub stages: Vec<Stage>,

    /// Columns the output must contain, checked after the last stage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_schema: Vec<ColumnSpec>,
}

impl Pipeline {
    /// Create an empty pipeline with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SPEC_VERSION.to_owned(),
            name: name.into(),
            policy: ErrorPolicy::default(),
            stages: Vec::new(),
            expected_schema: Vec::new(),
        }
    }

    /// Policy in force for `stage`.
    pub fn policy_for(&self, stage: &Stage) -> ErrorPolicy {
        stage.on_error.unwrap_or(self.policy)
    }

    /// Load a pipeline spec from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline spec file: {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse a pipeline spec from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let pipeline: Self =
            serde_json::from_str(json).context("Failed to parse pipeline spec JSON")?;
        if pipeline.version != SPEC_VERSION {
            anyhow::bail!(
                "Unsupported spec version '{}', expected '{SPEC_VERSION}'",
                pipeline.version
            );
        }
        Ok(pipeline)
    }

    /// Save pipeline spec to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write pipeline spec file: {}", path.display()))
    }

    /// Serialize pipeline spec to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline spec")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{ConversionPolicy, Primitive};
    use crate::table::SemanticType;
    use pretty_assertions::assert_eq;

    fn sample() -> Pipeline {
        let mut pipeline = Pipeline::new("cafe");
        pipeline.stages.push(Stage::new(
            "drop_missing_ids",
            Primitive::DropColumns {
                columns: vec!["Transaction ID".to_owned()],
                ignore_missing: true,
            },
        ));
        pipeline.stages.push(
            Stage::new(
                "coerce_price",
                Primitive::CoerceNumeric {
                    columns: vec!["Price Per Unit".to_owned()],
                    on_failure: ConversionPolicy::Null,
                },
            )
            .with_policy(ErrorPolicy::Skip),
        );
        pipeline.expected_schema.push(ColumnSpec::new(
            "Price Per Unit",
            SemanticType::Numeric,
            true,
        ));
        pipeline
    }

    #[test]
    fn test_spec_serialization() {
        let pipeline = sample();

        let json = pipeline.to_json().expect("Failed to serialize");
        assert!(json.contains("\"version\": \"0.1\""));
        assert!(json.contains("\"op\": \"drop_columns\""));
        assert!(json.contains("\"on_error\": \"skip\""));

        let parsed = Pipeline::from_json(&json).expect("Failed to parse");
        assert_eq!(parsed, pipeline);
    }

    #[test]
    fn test_defaults_when_fields_omitted() {
        let json = r#"{
            "version": "0.1",
            "name": "minimal",
            "stages": [
                { "name": "trim", "op": "trim_whitespace", "columns": ["Item"] }
            ]
        }"#;
        let pipeline = Pipeline::from_json(json).unwrap();
        assert_eq!(pipeline.policy, ErrorPolicy::Abort);
        assert!(pipeline.expected_schema.is_empty());
        assert_eq!(pipeline.stages[0].on_error, None);
        assert_eq!(pipeline.policy_for(&pipeline.stages[0]), ErrorPolicy::Abort);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = r#"{ "version": "9.9", "name": "future", "stages": [] }"#;
        let err = Pipeline::from_json(json).unwrap_err();
        assert!(err.to_string().contains("Unsupported spec version"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cafe.json");

        let pipeline = sample();
        pipeline.to_file(&path).unwrap();
        assert_eq!(Pipeline::from_file(&path).unwrap(), pipeline);
    }

    #[test]
    fn test_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = Pipeline::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read pipeline spec file"));
    }
}
