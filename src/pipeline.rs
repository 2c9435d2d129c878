//! Declarative cleaning pipelines.
//!
//! A [`Pipeline`] is an ordered list of named [`Stage`]s, each wrapping one
//! [`Primitive`](crate::primitives::Primitive). Pipelines are plain data: they
//! serialize to versioned JSON, can be built fluently with [`PipelineBuilder`],
//! and are checked against an input column set with [`validate_pipeline`]
//! before any data is touched.
//!
//! # Example
//!
//! ```
//! use tabwash::pipeline::{ErrorPolicy, PipelineBuilder};
//! use tabwash::primitives::{FillStrategy, Primitive};
//! use tabwash::table::{Table, Value};
//!
//! let pipeline = PipelineBuilder::new("fill_dependents")
//!     .policy(ErrorPolicy::Abort)
//!     .stage(
//!         "fill_mode",
//!         Primitive::FillMissing {
//!             columns: vec!["Dependents".to_owned()],
//!             strategy: FillStrategy::Mode,
//!         },
//!     )
//!     .build()?;
//!
//! let input = Table::new(vec![(
//!     "Dependents".to_owned(),
//!     vec![Value::text("0"), Value::Absent, Value::text("0")],
//! )])?;
//! let (output, report) = pipeline.run(&input).into_result()?;
//!
//! assert_eq!(output.get_column("Dependents")?[1], Value::text("0"));
//! assert!(report.is_completed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Failure policy
//!
//! - **abort** (default): the first failing stage halts the run and no output
//!   is produced.
//! - **skip**: the failing stage is recorded as skipped and its input flows on
//!   to the next stage unchanged.
//!
//! The policy is set per pipeline and may be overridden per stage.

pub mod builder;
pub mod executor;
pub mod spec;
pub mod stage;
pub mod validation;

pub use builder::PipelineBuilder;
pub use executor::{EXPECTED_SCHEMA_STAGE, PipelineFailure, PipelineRun};
pub use spec::{ErrorPolicy, Pipeline, SPEC_VERSION};
pub use stage::Stage;
pub use validation::{ValidationError, validate_pipeline};
