//! # Tabwash - Declarative Cleaning Pipelines for Tabular Data
//!
//! Tabwash turns raw, inconsistently formatted datasets into structurally
//! consistent, analysis-ready tables. A cleaning job is described as a
//! [`Pipeline`](pipeline::Pipeline) of named stages, each one a pure column
//! transform, and every stage reports exactly what it changed.
//!
//! ## Quick Start
//!
//! ```
//! use tabwash::io::{MemoryStore, run_job};
//! use tabwash::recipes;
//!
//! let store = MemoryStore::new();
//! store.insert_records(
//!     "sales",
//!     &["Transaction ID", "Item", "Quantity", "Price Per Unit", "Total Spent",
//!       "Payment Method", "Location", "Transaction Date"],
//!     &[
//!         vec!["TXN_1", "Coffee", "2", "2.0", "4.0", "Cash", "Takeaway", "2023-09-08"],
//!         vec!["TXN_2", "UNKNOWN", "ERROR", "3.0", "ERROR", "UNKNOWN", "In-store", "2023-05-16"],
//!     ],
//! )?;
//!
//! let report = run_job(&recipes::cafe_sales(), &store, "sales", &store, "clean")?;
//! println!("{}", report.summary());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`table`]: immutable column-oriented [`Table`](table::Table) of [`Value`](table::Value) cells
//! - [`primitives`]: the column transforms (imputation, coercion, derivation, encoding)
//! - [`pipeline`]: stages, failure policy, JSON specs, builder and pre-flight validation
//! - [`report`]: per-stage change reports and the per-run pipeline report
//! - [`recipes`]: pipelines for the loan, cafe sales, mission launch and media datasets
//! - [`io`]: loader/writer traits, an in-memory store and parallel job runs
//! - [`error`]: error kinds raised by primitives and stages
//! - [`logging`]: `env_logger` setup
//!
//! ## Key Concepts
//!
//! ### Immutable Tables
//!
//! A stage takes its input by shared reference and returns a new table.
//! Unchanged columns are shared between the two, so a failing stage never
//! leaves a half-transformed table behind.
//!
//! ### Failure Policy
//!
//! Pipelines abort on the first failing stage by default. Stages marked with
//! the `skip` policy record their failure and let their input flow on.

pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod primitives;
pub mod recipes;
pub mod report;
pub mod table;
