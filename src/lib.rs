//! Weighted grade computation from tabular assessment data.
//!
//! Raw rows are validated against a [`grading::ConfigModel`], scored,
//! graded, grouped by student and assembled into a [`report::ReportModel`]
//! by [`batch::run_batch`].

pub mod batch;
pub mod config;
pub mod error;
pub mod grading;
pub mod input;
pub mod output;
pub mod report;
