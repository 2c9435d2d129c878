//! Fluent construction of pipelines in code.

use super::spec::{ErrorPolicy, Pipeline};
use super::stage::Stage;
use crate::error::{CleanError, Result};
use crate::primitives::Primitive;
use crate::table::ColumnSpec;
use std::collections::HashSet;

/// Builds a [`Pipeline`] stage by stage and checks it before handing it out.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline::new(name),
        }
    }

    /// Default failure policy for every stage without an override.
    #[must_use]
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.pipeline.policy = policy;
        self
    }

    #[must_use]
    pub fn stage(mut self, name: impl Into<String>, primitive: Primitive) -> Self {
        self.pipeline.stages.push(Stage::new(name, primitive));
        self
    }

    /// A stage whose failure is recorded and skipped whatever the pipeline policy.
    #[must_use]
    pub fn optional_stage(mut self, name: impl Into<String>, primitive: Primitive) -> Self {
        self.pipeline
            .stages
            .push(Stage::new(name, primitive).with_policy(ErrorPolicy::Skip));
        self
    }

    /// Require `spec` to hold on the final table.
    #[must_use]
    pub fn expect_column(mut self, spec: ColumnSpec) -> Self {
        self.pipeline.expected_schema.push(spec);
        self
    }

    /// Finish the pipeline.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for an empty or duplicate stage name, or a stage whose
    /// parameters can never work.
    pub fn build(self) -> Result<Pipeline> {
        let mut names = HashSet::new();
        for stage in &self.pipeline.stages {
            if stage.name.is_empty() {
                return Err(CleanError::InvalidConfig(format!(
                    "Pipeline '{}' has a stage without a name",
                    self.pipeline.name
                )));
            }
            if !names.insert(stage.name.as_str()) {
                return Err(CleanError::InvalidConfig(format!(
                    "Pipeline '{}' has more than one stage named '{}'",
                    self.pipeline.name, stage.name
                )));
            }
            stage.primitive.check().map_err(|err| match err {
                CleanError::InvalidConfig(msg) => {
                    CleanError::InvalidConfig(format!("Stage '{}': {msg}", stage.name))
                }
                other => other,
            })?;
        }

        log::debug!(
            "Built pipeline '{}' with {} stages",
            self.pipeline.name,
            self.pipeline.stages.len()
        );
        Ok(self.pipeline)
    }
}
